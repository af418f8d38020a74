use nicer_core::{ClientSettings, Delivery, PageEvent, PlotError, Session, SlotId};
use page::PageError;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use transport::{HttpRequest, Transport, TransportError};

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Plot(#[from] PlotError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("no CSRF token found on {0}")]
    MissingCsrfToken(String),
    #[error("unknown plot type '{0}'")]
    UnknownPlotType(String),
}

fn csrf_patterns() -> Option<&'static (Regex, Regex)> {
    static PATTERNS: OnceLock<Option<(Regex, Regex)>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            let input = Regex::new(r#"<input[^>]*name="csrfmiddlewaretoken"[^>]*>"#).ok()?;
            let value = Regex::new(r#"value="([^"]*)""#).ok()?;
            Some((input, value))
        })
        .as_ref()
}

/// Extracts the hidden CSRF field value from a rendered page.
pub fn scrape_csrf_token(html: &str) -> Option<String> {
    let (input, value) = csrf_patterns()?;
    let tag = input.find(html)?;
    let captures = value.captures(tag.as_str())?;
    let token = captures[1].to_string();
    (!token.is_empty()).then_some(token)
}

/// Drives a [`Session`] against a transport, one request at a time.
pub struct PlotClient<T: Transport> {
    transport: T,
    session: Session,
}

impl<T: Transport> PlotClient<T> {
    pub fn new(transport: T, settings: ClientSettings) -> Self {
        Self {
            transport,
            session: Session::new(settings),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetches the plot page and adopts its CSRF token.
    pub fn bootstrap_csrf(&mut self) -> Result<String, ClientError> {
        let path = self.session.settings().endpoints.page.clone();
        let response = self.transport.send(&HttpRequest::get(&path))?;
        if !response.is_success() {
            return Err(TransportError::Status {
                url: path,
                status: response.status,
            }
            .into());
        }
        let token = scrape_csrf_token(&response.body)
            .ok_or_else(|| ClientError::MissingCsrfToken(path.clone()))?;
        self.session.set_csrf_token(&token);
        log::debug!("adopted CSRF token from {path}");
        Ok(token)
    }

    /// Handles `event` and sends whatever it produces, delivering each
    /// completion back to the session.
    pub fn dispatch(&mut self, event: PageEvent) -> Result<Vec<Delivery>, ClientError> {
        let outgoing = self.session.handle(event)?;
        let mut deliveries = Vec::with_capacity(outgoing.len());
        for out in outgoing {
            log::debug!(
                "sending {:?} {} (#{})",
                out.request.method,
                out.request.path,
                out.ticket.seq
            );
            let result = self.transport.send(&out.request);
            deliveries.push(self.session.deliver(&out.ticket, result));
        }
        Ok(deliveries)
    }

    fn dispatch_checked(&mut self, event: PageEvent) -> Result<(), ClientError> {
        for delivery in self.dispatch(event)? {
            if let Delivery::Failed(err) = delivery {
                return Err(err.into());
            }
        }
        Ok(())
    }

    pub fn search(&mut self, prefix: &str) -> Result<Vec<String>, ClientError> {
        self.dispatch_checked(PageEvent::ObservationKeyup {
            value: prefix.to_string(),
        })?;
        Ok(self.session.autocomplete().suggestions().to_vec())
    }

    /// Submits the plot form for `obs_id`. An empty `plot_types` selects
    /// every configured type.
    pub fn plot(
        &mut self,
        obs_id: &str,
        quality: Option<&str>,
        plot_types: &[String],
    ) -> Result<Vec<SlotId>, ClientError> {
        let configured: Vec<String> = self
            .session
            .settings()
            .plot_types
            .iter()
            .map(|p| p.name.clone())
            .collect();
        if let Some(unknown) = plot_types.iter().find(|name| !configured.contains(name)) {
            return Err(ClientError::UnknownPlotType(unknown.clone()));
        }

        self.dispatch(PageEvent::FieldInput {
            name: nicer_core::protocol::FIELD_OBS_ID.to_string(),
            value: obs_id.to_string(),
        })?;
        if let Some(quality) = quality {
            self.dispatch(PageEvent::QualityActivated {
                label: quality.to_string(),
            })?;
        }
        for name in configured {
            let checked = plot_types.is_empty() || plot_types.contains(&name);
            self.dispatch(PageEvent::PlotTypeToggled { name, checked })?;
        }
        self.dispatch_checked(PageEvent::PlotFormSubmitted)?;
        Ok(self
            .session
            .slots()
            .slots()
            .iter()
            .map(|slot| slot.id.clone())
            .collect())
    }

    pub fn refine(
        &mut self,
        slot: &str,
        gti: &str,
        min_value: Option<i64>,
    ) -> Result<(), ClientError> {
        self.dispatch(PageEvent::GtiSearchInput {
            slot: slot.to_string(),
            text: gti.to_string(),
        })?;
        if let Some(value) = min_value {
            self.dispatch(PageEvent::MinValueInput {
                slot: slot.to_string(),
                value,
            })?;
        }
        self.dispatch_checked(PageEvent::GtiFormSubmitted {
            slot: slot.to_string(),
        })
    }

    pub fn save_page(&self, path: &Path) -> Result<(), ClientError> {
        self.session.page().save_to_file(path)?;
        Ok(())
    }
}

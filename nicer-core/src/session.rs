use crate::autocomplete::Autocomplete;
use crate::dropdown::{bind_dropdowns, DropdownBinding};
use crate::error::PlotError;
use crate::notices::NoticeBoard;
use crate::protocol::{ObservationSuggestions, FIELD_CSRF};
use crate::quality::QualitySelector;
use crate::settings::ClientSettings;
use crate::slot_id::SlotId;
use crate::slots::SlotRegistry;
use page::document::{
    NOTICES_ID, OBSERVATION_OPTIONS_ID, OBSERVATION_SEARCH_ID, QUALITY_SELECT_ID,
};
use page::form::{field_mut, field_value};
use page::{plot_page, set_checked, set_select_value, Document};
use std::time::Instant;
use transport::{CancelToken, HttpRequest, HttpResponse, TransportError};

/// Hook run after server-provided markup is inserted into the page, e.g. to
/// typeset math in the observation info table.
pub trait Typesetter {
    fn typeset(&mut self, page: &mut Document);
}

#[derive(Debug, Default)]
pub struct NoopTypesetter;

impl Typesetter for NoopTypesetter {
    fn typeset(&mut self, _page: &mut Document) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Suggestions,
    Plots,
    Refinement { slot: SlotId, generation: u64 },
}

/// Identifies an outgoing request when its completion is delivered back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub seq: u64,
    pub kind: RequestKind,
}

#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub ticket: RequestTicket,
    pub request: HttpRequest,
}

/// What happened to a delivered completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Applied,
    /// Superseded, cancelled or stale; the page was not touched.
    Discarded,
    Failed(PlotError),
}

/// User interactions with the plot page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Rebinds dropdowns after the page was (re)built.
    Loaded,
    ObservationKeyup { value: String },
    SuggestionActivated { index: usize },
    QualityActivated { label: String },
    FieldFocused { field_id: String },
    FieldBlurred { field_id: String },
    FieldInput { name: String, value: String },
    PlotTypeToggled { name: String, checked: bool },
    PlotFormSubmitted,
    GtiSearchInput { slot: String, text: String },
    MinValueInput { slot: String, value: i64 },
    GtiFormSubmitted { slot: String },
    CsrfTokenRotated { token: String },
}

pub(crate) struct PendingBulk {
    pub(crate) seq: u64,
    pub(crate) obs_id: String,
    pub(crate) cancel: CancelToken,
}

/// Client-side state of one plot page.
///
/// The session never performs I/O. Events return the requests to send, and
/// the caller hands each completion back through [`Session::deliver`] in
/// whatever order they arrive.
pub struct Session {
    pub(crate) settings: ClientSettings,
    pub(crate) page: Document,
    pub(crate) quality: QualitySelector,
    pub(crate) autocomplete: Autocomplete,
    pub(crate) dropdowns: Vec<DropdownBinding>,
    pub(crate) slots: SlotRegistry,
    pub(crate) notices: NoticeBoard,
    pub(crate) pending_bulk: Option<PendingBulk>,
    pub(crate) typesetter: Box<dyn Typesetter>,
    next_seq: u64,
}

pub(crate) fn check_response(
    path: &str,
    result: Result<HttpResponse, TransportError>,
) -> Result<HttpResponse, PlotError> {
    let response = result?;
    if !response.is_success() {
        return Err(TransportError::Status {
            url: path.to_string(),
            status: response.status,
        }
        .into());
    }
    Ok(response)
}

impl Session {
    pub fn new(settings: ClientSettings) -> Self {
        let page = plot_page(&settings.skeleton(""));
        let autocomplete = Autocomplete::new(
            settings.suggestion_mode,
            settings.suggestion_param(),
            settings.suggestion_limit,
        );
        let mut session = Self {
            settings,
            page,
            quality: QualitySelector::new(),
            autocomplete,
            dropdowns: Vec::new(),
            slots: SlotRegistry::new(),
            notices: NoticeBoard::new(),
            pending_bulk: None,
            typesetter: Box::new(NoopTypesetter),
            next_seq: 0,
        };
        session.bind_dropdowns();
        session
    }

    pub fn with_typesetter(mut self, typesetter: Box<dyn Typesetter>) -> Self {
        self.typesetter = typesetter;
        self
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn page(&self) -> &Document {
        &self.page
    }

    pub fn quality(&self) -> &QualitySelector {
        &self.quality
    }

    pub fn autocomplete(&self) -> &Autocomplete {
        &self.autocomplete
    }

    pub fn slots(&self) -> &SlotRegistry {
        &self.slots
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn dropdown(&self, field_id: &str) -> Option<&DropdownBinding> {
        self.dropdowns.iter().find(|b| b.field_id == field_id)
    }

    pub fn has_pending_plots(&self) -> bool {
        self.pending_bulk.is_some()
    }

    pub fn csrf_token(&self) -> &str {
        field_value(self.page.root(), FIELD_CSRF).unwrap_or("")
    }

    pub fn set_csrf_token(&mut self, token: &str) {
        match field_mut(self.page.root_mut(), FIELD_CSRF) {
            Some(input) => input.set_attr("value", token),
            None => log::warn!("page has no {FIELD_CSRF} field"),
        }
    }

    pub fn render_page(&self) -> String {
        self.page.to_html()
    }

    pub fn handle(&mut self, event: PageEvent) -> Result<Vec<OutgoingRequest>, PlotError> {
        self.handle_at(event, Instant::now())
    }

    pub fn handle_at(
        &mut self,
        event: PageEvent,
        now: Instant,
    ) -> Result<Vec<OutgoingRequest>, PlotError> {
        self.tick(now);
        match event {
            PageEvent::Loaded => {
                self.bind_dropdowns();
                Ok(Vec::new())
            }
            PageEvent::ObservationKeyup { value } => self.lookup_suggestions(&value),
            PageEvent::SuggestionActivated { index } => {
                self.activate_suggestion(index);
                Ok(Vec::new())
            }
            PageEvent::QualityActivated { label } => {
                self.change_quality(&label);
                Ok(Vec::new())
            }
            PageEvent::FieldFocused { field_id } => {
                self.with_dropdown(&field_id, |b| b.controller.focus());
                Ok(Vec::new())
            }
            PageEvent::FieldBlurred { field_id } => {
                self.with_dropdown(&field_id, |b| b.controller.blur(now));
                Ok(Vec::new())
            }
            PageEvent::FieldInput { name, value } => {
                self.set_field(&name, &value)?;
                Ok(Vec::new())
            }
            PageEvent::PlotTypeToggled { name, checked } => {
                let input = field_mut(self.page.root_mut(), &name)
                    .ok_or_else(|| PlotError::MissingElement(name.clone()))?;
                set_checked(input, checked);
                Ok(Vec::new())
            }
            PageEvent::PlotFormSubmitted => self.submit_plot_form(),
            PageEvent::GtiSearchInput { slot, text } => {
                self.set_gti_search(&slot, &text)?;
                Ok(Vec::new())
            }
            PageEvent::MinValueInput { slot, value } => {
                self.set_min_value(&slot, value)?;
                Ok(Vec::new())
            }
            PageEvent::GtiFormSubmitted { slot } => self.submit_gti_form(&slot),
            PageEvent::CsrfTokenRotated { token } => {
                self.set_csrf_token(&token);
                Ok(Vec::new())
            }
        }
    }

    /// Applies dropdown hides that came due by `now`.
    pub fn tick(&mut self, now: Instant) {
        let root = self.page.root_mut();
        for binding in self.dropdowns.iter_mut() {
            if binding.controller.poll(now) {
                binding.sync(root);
            }
        }
    }

    /// Hands a completion back to the session.
    pub fn deliver(
        &mut self,
        ticket: &RequestTicket,
        result: Result<HttpResponse, TransportError>,
    ) -> Delivery {
        if matches!(result, Err(TransportError::Cancelled)) {
            log::debug!("request #{} was cancelled", ticket.seq);
            self.forget(ticket);
            return Delivery::Discarded;
        }
        match &ticket.kind {
            RequestKind::Suggestions => self.apply_suggestions(ticket.seq, result),
            RequestKind::Plots => self.apply_plots(ticket.seq, result),
            RequestKind::Refinement { slot, generation } => {
                self.apply_refinement(ticket.seq, slot, *generation, result)
            }
        }
    }

    pub(crate) fn next_ticket(&mut self, kind: RequestKind) -> RequestTicket {
        self.next_seq += 1;
        RequestTicket {
            seq: self.next_seq,
            kind,
        }
    }

    pub(crate) fn render_notices(&mut self) {
        let rendered = self.notices.render();
        if let Some(panel) = self.page.get_mut(NOTICES_ID) {
            panel.clear_children();
            for notice in rendered {
                panel.append(notice);
            }
        }
    }

    pub(crate) fn notify_error(&mut self, title: &str, err: &PlotError) {
        self.notices
            .show_error(title, &err.to_string(), err.is_retryable());
        self.render_notices();
    }

    pub(crate) fn notify_warning(&mut self, title: &str, message: &str) {
        self.notices.show_warning(title, message);
        self.render_notices();
    }

    fn forget(&mut self, ticket: &RequestTicket) {
        match &ticket.kind {
            RequestKind::Plots => {
                if self.pending_bulk.as_ref().is_some_and(|p| p.seq == ticket.seq) {
                    self.pending_bulk = None;
                }
            }
            RequestKind::Refinement { slot, generation } => {
                self.slots.settle(slot, ticket.seq, *generation);
            }
            RequestKind::Suggestions => {}
        }
    }

    fn bind_dropdowns(&mut self) {
        self.dropdowns = bind_dropdowns(self.page.root(), self.settings.hide_delay());
        let root = self.page.root_mut();
        for binding in &self.dropdowns {
            binding.sync(root);
        }
    }

    fn with_dropdown(&mut self, field_id: &str, f: impl FnOnce(&mut DropdownBinding)) {
        let root = self.page.root_mut();
        match self.dropdowns.iter_mut().find(|b| b.field_id == field_id) {
            Some(binding) => {
                f(binding);
                binding.sync(root);
            }
            None => log::debug!("no dropdown bound to #{field_id}"),
        }
    }

    fn set_field(&mut self, name: &str, value: &str) -> Result<(), PlotError> {
        let field = field_mut(self.page.root_mut(), name)
            .ok_or_else(|| PlotError::MissingElement(name.to_string()))?;
        if field.tag() == "select" {
            if !set_select_value(field, value) {
                log::warn!("select '{name}' has no option '{value}'");
            }
        } else {
            field.set_attr("value", value);
        }
        Ok(())
    }

    fn search_value(&self) -> String {
        self.page
            .get(OBSERVATION_SEARCH_ID)
            .and_then(|el| el.attr("value"))
            .unwrap_or("")
            .to_string()
    }

    fn lookup_suggestions(&mut self, value: &str) -> Result<Vec<OutgoingRequest>, PlotError> {
        self.page
            .get_mut(OBSERVATION_SEARCH_ID)
            .ok_or_else(|| PlotError::MissingElement(OBSERVATION_SEARCH_ID.to_string()))?
            .set_attr("value", value);
        let ticket = self.next_ticket(RequestKind::Suggestions);
        self.autocomplete.record_query(ticket.seq);
        let request = HttpRequest::get(&self.settings.endpoints.fetch_observations)
            .with_query(self.autocomplete.param(), value);
        log::debug!("suggestion lookup #{} for '{value}'", ticket.seq);
        Ok(vec![OutgoingRequest { ticket, request }])
    }

    fn apply_suggestions(
        &mut self,
        seq: u64,
        result: Result<HttpResponse, TransportError>,
    ) -> Delivery {
        if seq <= self.autocomplete.last_applied() {
            log::debug!("suggestions #{seq} arrived after a newer answer");
            return Delivery::Discarded;
        }
        let parsed = check_response(&self.settings.endpoints.fetch_observations, result)
            .and_then(|response| ObservationSuggestions::parse(&response.body));
        let names = match parsed {
            Ok(suggestions) => suggestions.names(),
            Err(err) => {
                log::warn!("suggestion lookup #{seq} failed: {err}");
                return Delivery::Failed(err);
            }
        };
        if !self.autocomplete.apply(seq, names) {
            return Delivery::Discarded;
        }
        let options = self.autocomplete.render_options();
        if let Some(content) = self.page.get_mut(OBSERVATION_OPTIONS_ID) {
            content.clear_children();
            for option in options {
                content.append(option);
            }
        }
        Delivery::Applied
    }

    fn activate_suggestion(&mut self, index: usize) {
        let current = self.search_value();
        match self.autocomplete.completion(index, &current) {
            Some(completed) => {
                if let Some(field) = self.page.get_mut(OBSERVATION_SEARCH_ID) {
                    field.set_attr("value", &completed);
                }
            }
            None => log::debug!("no suggestion at index {index}"),
        }
    }

    fn change_quality(&mut self, label: &str) {
        let value = self.quality.change_quality(label);
        if let Some(select) = self.page.get_mut(QUALITY_SELECT_ID) {
            if !set_select_value(select, &value) {
                log::warn!("quality select has no option '{value}'");
            }
        }
        log::info!("quality set to '{}'", self.quality.form_value());
    }
}

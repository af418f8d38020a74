use crate::{HttpRequest, HttpResponse, Method, Transport, TransportError};
use std::time::Duration;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Blocking HTTP transport. The agent keeps a cookie store so a CSRF cookie
/// obtained from the page survives into later form posts.
pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Absolute URL of `request` with its query string appended.
    pub fn request_url(&self, request: &HttpRequest) -> Result<String, TransportError> {
        let url = self.url_for(&request.path);
        if request.query.is_empty() {
            return Ok(url);
        }
        let separator = if url.contains('?') { '&' } else { '?' };
        Ok(format!("{url}{separator}{}", request.encoded_query()?))
    }
}

fn map_error(url: &str, err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Status(status, _) => TransportError::Status {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(transport) => {
            let message = transport.to_string();
            if message.contains("timed out") {
                TransportError::Timeout {
                    url: url.to_string(),
                }
            } else {
                TransportError::Connect {
                    url: url.to_string(),
                    message,
                }
            }
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        if request.cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        let url = self.request_url(request)?;
        log::debug!("{:?} {url}", request.method);
        let result = match request.method {
            Method::Get => self.agent.get(&url).call(),
            // Django checks the referer on secure form posts.
            Method::Post => self
                .agent
                .post(&url)
                .set("Referer", &url)
                .set("Content-Type", FORM_CONTENT_TYPE)
                .send_string(&request.encoded_form()?),
        };
        let response = result.map_err(|err| map_error(&url, err))?;
        let status = response.status();
        let body = response
            .into_string()
            .map_err(|e| TransportError::Body(e.to_string()))?;
        if request.cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        Ok(HttpResponse { status, body })
    }
}

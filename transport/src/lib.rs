use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub mod http;
pub use http::HttpTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Shared flag checked by transports before a request goes out.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub cancel: CancelToken,
}

impl HttpRequest {
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::Get,
            path: path.to_string(),
            query: Vec::new(),
            form: Vec::new(),
            cancel: CancelToken::new(),
        }
    }

    pub fn post(path: &str, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            path: path.to_string(),
            query: Vec::new(),
            form,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// First form value submitted under `name`.
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn encoded_form(&self) -> Result<String, TransportError> {
        serde_urlencoded::to_string(&self.form).map_err(|e| TransportError::Encode(e.to_string()))
    }

    pub fn encoded_query(&self) -> Result<String, TransportError> {
        serde_urlencoded::to_string(&self.query).map_err(|e| TransportError::Encode(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request cancelled")]
    Cancelled,
    #[error("failed to reach {url}: {message}")]
    Connect { url: String, message: String },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("server returned status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("failed to encode request: {0}")]
    Encode(String),
    #[error("no response queued for {0}")]
    Unscripted(String),
}

impl TransportError {
    /// Whether retrying the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connect { .. } | Self::Timeout { .. } | Self::Body(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Cancelled | Self::Encode(_) | Self::Unscripted(_) => false,
        }
    }
}

pub trait Transport: Send {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

type Scripted = Result<HttpResponse, TransportError>;

/// Transport answering from queued responses, keyed by request path.
/// Every request that reaches it is recorded.
#[derive(Debug, Default)]
pub struct InProcessTransport {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    sent: Mutex<Vec<HttpRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InProcessTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, path: &str, response: Scripted) {
        lock(&self.responses)
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn push_body(&self, path: &str, body: &str) {
        self.push_response(path, Ok(HttpResponse::ok(body)));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.sent).clone()
    }

    pub fn pending(&self, path: &str) -> usize {
        lock(&self.responses).get(path).map(VecDeque::len).unwrap_or(0)
    }
}

impl Transport for InProcessTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        if request.cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        lock(&self.sent).push(request.clone());
        lock(&self.responses)
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(TransportError::Unscripted(request.path.clone())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Http,
    InProcess,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub kind: TransportKind,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Http,
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct TransportFactory;

impl TransportFactory {
    pub fn create(config: &TransportConfig) -> Box<dyn Transport> {
        match config.kind {
            TransportKind::Http => Box::new(HttpTransport::new(&config.base_url, config.timeout)),
            TransportKind::InProcess => Box::new(InProcessTransport::new()),
        }
    }
}

use crate::gti::GtiSpecError;
use transport::TransportError;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlotError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("invalid GTI selection: {0}")]
    Validation(#[from] GtiSpecError),
    #[error("no plot slot named '{0}'")]
    UnknownSlot(String),
    #[error("page has no element with id '{0}'")]
    MissingElement(String),
}

impl PlotError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_retryable())
    }
}

//! Failures a connection worker can report back to its client.
//!
//! Every variant maps onto a response status through
//! [`DispatchError::severity`] and onto a structured description through
//! [`DispatchError::detail`].

use thiserror::Error;

use crate::actions::{RepositoryError, Severity};
use crate::protocol::{CommandError, ErrorDetail, FrameError, ResponseError};

/// Trace marker added by the connection worker.
const DISPATCH_TRACE: &str = "dispatch";

/// Errors surfaced while serving one connection.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request frame was malformed.
    #[error("protocol framing error: {0}")]
    Framing(#[from] FrameError),

    /// The payload is not a usable command document.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Routing or the handler failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The handler panicked.
    #[error("action handler panicked: {message}")]
    HandlerPanicked { message: String },

    /// The response could not be produced or written.
    #[error(transparent)]
    Response(#[from] ResponseError),
}

impl DispatchError {
    /// Creates a handler panic error from a panic payload.
    pub fn handler_panicked(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|text| (*text).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        Self::HandlerPanicked { message }
    }

    /// Response status for this error. Only handler errors may be warnings.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Repository(error) => error.severity(),
            Self::Framing(_)
            | Self::Command(_)
            | Self::HandlerPanicked { .. }
            | Self::Response(_) => Severity::Failed,
        }
    }

    /// Failure class written into the error detail.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Framing(_) => "ProtocolFraming",
            Self::Command(error) => error.kind(),
            Self::Repository(RepositoryError::BadModule { .. }) => "BadModule",
            Self::Repository(RepositoryError::BadAction { .. }) => "BadAction",
            Self::Repository(RepositoryError::Handler(_)) | Self::HandlerPanicked { .. } => {
                "HandlerError"
            }
            Self::Response(_) => "SystemError",
        }
    }

    /// Supplementary text carried by handler warnings.
    #[must_use]
    pub fn supplement(&self) -> Option<&str> {
        match self {
            Self::Repository(RepositoryError::Handler(error)) => error.supplement(),
            _ => None,
        }
    }

    /// Structured description sent to the client.
    #[must_use]
    pub fn detail(&self) -> ErrorDetail {
        let mut trace: Vec<&str> = match self {
            Self::Repository(RepositoryError::Handler(error)) => error.trace().to_vec(),
            _ => Vec::new(),
        };
        trace.push(DISPATCH_TRACE);
        let message = match self {
            Self::Repository(RepositoryError::Handler(error)) => error.message().to_owned(),
            other => other.to_string(),
        };
        ErrorDetail::new(self.kind(), message).with_trace(&trace)
    }
}

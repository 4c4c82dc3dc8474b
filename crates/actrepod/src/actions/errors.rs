//! Error types for action lists and the action repository.
//!
//! Handlers report failures through [`ActionError`], which carries an explicit
//! [`Severity`]. The repository wraps it, together with its own bounds
//! violations, in [`RepositoryError`]. The connection worker maps the
//! severity straight onto the response status.

use std::fmt;

use thiserror::Error;

/// How serious a failed command is from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The command did not complete but the caller may act on the advice
    /// attached to the error.
    Warning,
    /// The command failed.
    Failed,
}

impl Severity {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Domain error raised by an action handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActionError {
    severity: Severity,
    message: String,
    supplement: Option<String>,
    trace: Vec<&'static str>,
}

impl ActionError {
    /// Creates an error with the given severity.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            supplement: None,
            trace: Vec::new(),
        }
    }

    /// Creates a `warning` error.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Creates a `failed` error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(Severity::Failed, message)
    }

    /// Attaches supplementary text. Only warnings carry it onto the wire.
    #[must_use]
    pub fn with_supplement(mut self, supplement: impl Into<String>) -> Self {
        self.supplement = Some(supplement.into());
        self
    }

    /// Appends a trace marker naming the layer the error passed through.
    #[must_use]
    pub fn traced(mut self, point: &'static str) -> Self {
        self.trace.push(point);
        self
    }

    /// Severity declared by the handler.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Supplementary text, if any.
    #[must_use]
    pub fn supplement(&self) -> Option<&str> {
        self.supplement.as_deref()
    }

    /// Trace markers in the order they were added.
    #[must_use]
    pub fn trace(&self) -> &[&'static str] {
        &self.trace
    }
}

/// Errors surfaced by [`ActionList`](super::ActionList) and
/// [`ActionRepository`](super::ActionRepository).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Subsystem id is outside the table or its slot is empty.
    #[error("bad module: subsystem {sid} is not registered (repository has {capacity} slots)")]
    BadModule { sid: i64, capacity: usize },

    /// Command id is outside the subsystem's action list.
    #[error("bad action: command {cid} is not defined by module '{module}' ({len} actions)")]
    BadAction {
        module: String,
        cid: i64,
        len: usize,
    },

    /// The handler itself failed.
    #[error(transparent)]
    Handler(ActionError),
}

impl RepositoryError {
    /// Creates a bad module error.
    pub const fn bad_module(sid: i64, capacity: usize) -> Self {
        Self::BadModule { sid, capacity }
    }

    /// Creates a bad action error.
    pub fn bad_action(module: impl Into<String>, cid: i64, len: usize) -> Self {
        Self::BadAction {
            module: module.into(),
            cid,
            len,
        }
    }

    /// Severity reported to the caller. Lookup failures are always `failed`.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::BadModule { .. } | Self::BadAction { .. } => Severity::Failed,
            Self::Handler(error) => error.severity(),
        }
    }
}

//! Failures raised by collaborators and the pipeline itself.

use thiserror::Error;

use crate::{Category, ExitStatus};

/// A failure that escapes a collaborator call.
///
/// Completion failures are recoverable: the phase operation that sees one
/// reports it as an error and drops the affected environment from its
/// batch. Everything else unwinds the pipeline to [`Pipeline::compile`].
///
/// [`Pipeline::compile`]: crate::Pipeline::compile
#[derive(Debug, Error)]
pub enum Fault {
    /// A symbol could not be completed, e.g. a missing or unreadable class.
    #[error("cannot access {symbol}: {message}")]
    Completion { symbol: String, message: String },

    /// A collaborator hit a state it cannot recover from.
    #[error("compilation aborted: {0}")]
    Abort(String),

    /// An annotation processor failed.
    #[error("annotation processor '{processor}' failed: {message}")]
    Processing { processor: String, message: String },

    /// The compiler ran out of some resource.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The pipeline was used after `close`.
    #[error("pipeline is closed")]
    Closed,
}

impl Fault {
    /// Create a completion failure.
    pub fn completion(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        Fault::Completion {
            symbol: symbol.into(),
            message: message.into(),
        }
    }

    /// Create an abort.
    pub fn abort(message: impl Into<String>) -> Self {
        Fault::Abort(message.into())
    }

    /// Returns true if the fault only affects the current environment.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Fault::Completion { .. })
    }

    /// The exit classification for a compilation that ended with this fault.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Fault::Completion { .. } => ExitStatus::Error,
            Fault::Abort(_) => ExitStatus::Abnormal,
            Fault::Processing { .. } | Fault::ResourceExhausted(_) | Fault::Closed => {
                ExitStatus::SysErr
            }
        }
    }

    /// The diagnostic category used when the fault is reported.
    pub fn category(&self) -> Category {
        match self {
            Fault::Completion { .. } => Category::Compile,
            Fault::Processing { .. } => Category::Processing,
            Fault::Abort(_) | Fault::ResourceExhausted(_) | Fault::Closed => Category::Internal,
        }
    }
}

/// A source file could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    /// More precise location than the file, e.g. `A.toml:3:7`.
    pub location: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Add a location to this error.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Returned by an annotation processor that cannot continue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProcessorError {
    pub message: String,
}

impl ProcessorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(
            Fault::completion("Base", "bad class file").exit_status(),
            ExitStatus::Error
        );
        assert_eq!(Fault::abort("corrupt").exit_status(), ExitStatus::Abnormal);
        assert_eq!(
            Fault::ResourceExhausted("heap".into()).exit_status(),
            ExitStatus::SysErr
        );
        assert_eq!(
            Fault::Processing {
                processor: "builder".into(),
                message: "boom".into()
            }
            .category(),
            Category::Processing
        );
    }

    #[test]
    fn test_only_completion_is_recoverable() {
        assert!(Fault::completion("Base", "missing").is_recoverable());
        assert!(!Fault::abort("corrupt").is_recoverable());
        assert!(!Fault::Closed.is_recoverable());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Fault::completion("Base", "class file has wrong version").to_string(),
            "cannot access Base: class file has wrong version"
        );
        assert_eq!(ParseError::new("expected '='").to_string(), "expected '='");
    }
}

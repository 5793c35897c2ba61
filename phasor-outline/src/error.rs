use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result type for outline parsing (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<OutlineError>>;

/// Source context for outline error reporting.
#[derive(Debug, Clone)]
pub struct SourceContext {
    src: String,
    filename: String,
}

impl SourceContext {
    pub fn new(src: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            filename: filename.into(),
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    /// Create a NamedSource for miette error reporting.
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.filename, self.src.clone())
    }

    /// Create a parse error from a toml error.
    pub fn parse_error(&self, source: toml::de::Error) -> Box<OutlineError> {
        let span = source.span().map(SourceSpan::from);
        Box::new(OutlineError::Parse {
            src: self.named_source(),
            span,
            source,
        })
    }

    /// Create an invalid-name error, labelled at the quoted name.
    pub fn invalid_name(&self, name: &str, reason: &str) -> Box<OutlineError> {
        let quoted = format!("\"{}\"", name);
        let span = self
            .src
            .find(&quoted)
            .map(|start| SourceSpan::from(start..start + quoted.len()));
        Box::new(OutlineError::InvalidName {
            src: self.named_source(),
            span,
            name: name.to_string(),
            reason: reason.to_string(),
        })
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum OutlineError {
    #[error("failed to read '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse outline")]
    #[diagnostic(code(phasor::outline::parse_error))]
    Parse {
        #[source_code]
        src: NamedSource<String>,
        #[label("parse error here")]
        span: Option<SourceSpan>,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid type name '{name}': {reason}")]
    #[diagnostic(
        code(phasor::outline::invalid_name),
        help("type names are plain identifiers; nest types with [[type.nested]]")
    )]
    InvalidName {
        #[source_code]
        src: NamedSource<String>,
        #[label("{reason}")]
        span: Option<SourceSpan>,
        name: String,
        reason: String,
    },
}

impl OutlineError {
    /// Byte offset of the primary label, if the error has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            OutlineError::Io { .. } => None,
            OutlineError::Parse { span, .. } | OutlineError::InvalidName { span, .. } => {
                span.map(|span| span.offset())
            }
        }
    }

    /// One-line message, including the underlying toml error for parse
    /// failures.
    pub fn summary(&self) -> String {
        match self {
            OutlineError::Parse { source, .. } => source.message().to_string(),
            OutlineError::Io { source, .. } => format!("{}: {}", self, source),
            other => other.to_string(),
        }
    }
}

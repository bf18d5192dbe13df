//! Error types
//!
//! Pointer resolution has exactly two failures a caller can observe: the
//! pointer text is malformed, or it selects nothing. Everything else that can
//! go wrong while *evaluating* a pointer (bad expressions, unknown schemes)
//! is recovered inside the evaluator and only affects which part wins.

use std::fmt;
use thiserror::Error;

/// Failure to parse or resolve a pointer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    /// Malformed pointer text. `position` is the character offset where the
    /// problem was detected.
    #[error("invalid pointer syntax at offset {position}: {message}")]
    Syntax { message: String, position: usize },

    /// The pointer parsed but no part selected any node. Carries the
    /// shorthand name or the full pointer text.
    #[error("pointer `{0}` did not identify any subresources")]
    NoSubresources(String),
}

impl PointerError {
    pub(crate) fn syntax(message: impl Into<String>, position: usize) -> Self {
        PointerError::Syntax {
            message: message.into(),
            position,
        }
    }

    /// True for [`PointerError::Syntax`]
    pub fn is_syntax(&self) -> bool {
        matches!(self, PointerError::Syntax { .. })
    }
}

/// Failure to materialize a document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { message: String, position: usize },

    #[error("document is not valid UTF-8 (invalid byte at {0})")]
    InvalidUtf8(usize),

    #[error("document has no root element")]
    NoRootElement,

    #[error("invalid document location `{location}`: {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    pub(crate) fn malformed(message: impl Into<String>, position: usize) -> Self {
        DocumentError::Malformed {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn invalid_location(location: &str, reason: impl fmt::Display) -> Self {
        DocumentError::InvalidLocation {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Failure to compile or evaluate an XPath expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XPathError {
    #[error("invalid expression at offset {position}: {message}")]
    Syntax { message: String, position: usize },

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("{name}(): {message}")]
    Argument { name: String, message: String },

    #[error("namespace prefix `{0}` is not bound")]
    UnboundPrefix(String),

    #[error("variable `${0}` is not bound")]
    UnboundVariable(String),

    /// A node-set was required; carries the type that was found
    #[error("expected a node-set, found {0}")]
    Type(&'static str),
}

impl XPathError {
    pub(crate) fn syntax(message: impl Into<String>, position: usize) -> Self {
        XPathError::Syntax {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn argument(name: &str, message: impl Into<String>) -> Self {
        XPathError::Argument {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Failure to construct or restart a streaming reader
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error(transparent)]
    Pointer(#[from] PointerError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = PointerError::syntax("unexpected `)`", 7);
        assert!(err.is_syntax());
        assert_eq!(
            err.to_string(),
            "invalid pointer syntax at offset 7: unexpected `)`"
        );
    }

    #[test]
    fn test_xpath_error_display() {
        let err = XPathError::argument("substring", "expects 2 or 3 arguments");
        assert_eq!(err.to_string(), "substring(): expects 2 or 3 arguments");
        assert_eq!(
            XPathError::UnboundPrefix("p".to_string()).to_string(),
            "namespace prefix `p` is not bound"
        );
    }

    #[test]
    fn test_reader_error_is_transparent() {
        let err = ReaderError::from(PointerError::NoSubresources("foo".to_string()));
        assert_eq!(
            err.to_string(),
            "pointer `foo` did not identify any subresources"
        );
    }
}

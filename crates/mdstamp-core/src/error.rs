//! Error types for mdstamp.

use thiserror::Error;

/// Top-level result type for mdstamp operations.
pub type Result<T> = std::result::Result<T, StampError>;

/// Top-level error type for mdstamp.
#[derive(Debug, Error)]
pub enum StampError {
    /// The header block exists but is not a valid YAML mapping.
    #[error("malformed frontmatter: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("watch error: {0}")]
    Watch(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StampError {
    /// Whether this is a structured-data parse failure of a header block.
    ///
    /// Parse failures are the only errors reported back to the user; every
    /// other kind belongs to the underlying store.
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_human_readable_messages() {
        let err = StampError::Parse("did not find expected key".to_string());
        let msg = err.to_string();
        assert!(msg.contains("malformed frontmatter"));
        assert!(msg.contains("expected key"));

        let err = StampError::Config("unknown field `extensions`".to_string());
        assert!(err.to_string().contains("extensions"));
    }

    #[test]
    fn only_parse_errors_are_parse_kind() {
        assert!(StampError::Parse("x".to_string()).is_parse());
        assert!(!StampError::Io(std::io::Error::other("disk")).is_parse());
        assert!(!StampError::Watch("x".to_string()).is_parse());
    }
}

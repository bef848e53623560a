//! Error types for the content model engine
//!
//! Only schema-level problems are errors here. A child sequence that does
//! not fit a content model is reported through
//! [`ValidationResult`](crate::validators::models::ValidationResult), never
//! through this type.

use std::fmt;
use thiserror::Error;

/// Result type alias using the crate [`enum@Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for content model compilation
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed particle input (bad occurrence range, misplaced `all`)
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A resource limit was exceeded while compiling a content model
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Two particles compete for the same child element
    #[error("ambiguous content model: {0}")]
    Ambiguous(#[from] Ambiguity),

    /// Invalid settings document
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

/// Schema component parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the schema file
    pub location: Option<String>,
    /// Schema source that caused the error
    pub source: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        if let Some(ref src) = self.source {
            write!(f, "\n\nSource:\n{}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// A Unique Particle Attribution violation between two particles.
///
/// `first` and `second` are display forms of the competing terms; the ids
/// are the particle numbers assigned by the tree builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    /// First competing term
    pub first: String,
    /// Second competing term
    pub second: String,
    /// Particle id of the first term
    pub first_particle: usize,
    /// Particle id of the second term
    pub second_particle: usize,
}

impl fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} and {} violate Unique Particle Attribution",
            self.first, self.second
        )
    }
}

impl std::error::Error for Ambiguity {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("minOccurs must not exceed maxOccurs")
            .with_location("schema.xsd:42:10")
            .with_source("<xs:element name='a' minOccurs='3' maxOccurs='2'/>");

        let msg = format!("{}", err);
        assert!(msg.contains("minOccurs must not exceed maxOccurs"));
        assert!(msg.contains("Location:"));
        assert!(msg.contains("Source:"));
    }

    #[test]
    fn test_ambiguity_display() {
        let amb = Ambiguity {
            first: "a".to_string(),
            second: "(##any)".to_string(),
            first_particle: 0,
            second_particle: 1,
        };
        let err: Error = amb.into();
        assert!(matches!(err, Error::Ambiguous(_)));
        assert_eq!(
            err.to_string(),
            "ambiguous content model: a and (##any) violate Unique Particle Attribution"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = ParseError::new("test").into();
        assert!(matches!(err, Error::Parse(_)));

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Config(_)));
    }
}

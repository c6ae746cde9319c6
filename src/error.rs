//! Error types for the docfill library.

use std::io;
use thiserror::Error;

/// Result type alias for docfill operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while resolving templates.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A placeholder or anchor is absent from the document.
    #[error("Placeholder not found: {0}")]
    NotFound(String),

    /// A network or fetch failure that may succeed on retry.
    #[error("Transient I/O failure: {0}")]
    TransientIo(String),

    /// The document service rejected a batch; the document is unchanged.
    #[error("Batch rejected by document service: {0}")]
    MutationRejected(String),

    /// A field in the value map is malformed.
    #[error("Invalid field '{field}': {reason}")]
    InvalidInput {
        /// Offending field name
        field: String,
        /// Why the field was rejected
        reason: String,
    },

    /// Image bytes could not be decoded or are not an image.
    #[error("Image decoding error: {0}")]
    ImageDecode(String),

    /// A document snapshot violates the offset invariants.
    #[error("Invalid document structure: {0}")]
    InvalidDocument(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an [`Error::InvalidInput`] for a field.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if retrying the same sub-step could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::TransientIo(_) | Error::Io(_))
    }

    /// Check if this error only means "nothing to do".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

// Images are decoded from bytes already in memory, so an I/O error here
// means truncated data, never a failure worth refetching for.
impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageDecode(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::TransientIo(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("{{gallery}}".to_string());
        assert_eq!(err.to_string(), "Placeholder not found: {{gallery}}");

        let err = Error::invalid_field("bad name", "contains whitespace");
        assert_eq!(
            err.to_string(),
            "Invalid field 'bad name': contains whitespace"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::TimedOut, "timed out");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_image_io_error_is_not_transient() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "truncated");
        let err: Error = image::ImageError::IoError(io_err).into();
        assert!(matches!(err, Error::ImageDecode(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_classification() {
        assert!(Error::TransientIo("reset".into()).is_transient());
        assert!(!Error::MutationRejected("bad".into()).is_transient());
        assert!(Error::NotFound("x".into()).is_not_found());
    }
}

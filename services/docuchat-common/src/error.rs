//! Error types for the DocuChat services.

use thiserror::Error;

/// Result type alias using the DocuChat error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for DocuChat services.
///
/// The four domain variants (`MeetingNotFound`, `CacheUnavailable`,
/// `EmptyResponse`, `InvalidResponse`) are terminal per call; none of them
/// is retried automatically.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No meeting record exists for the given id
    #[error("Meeting not found: {0}")]
    MeetingNotFound(u64),

    /// The remote context cache could not be fetched or (re)created
    #[error("Context cache unavailable: {0}")]
    CacheUnavailable(String),

    /// The model returned no text at all
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// The model returned text that does not parse as the response schema
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    /// Model provider call failed outside the cache-resolution path
    #[error("Provider error: {0}")]
    Provider(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this is the not-found variant.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::MeetingNotFound(_))
    }

    /// Get HTTP status code for this error.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MeetingNotFound(_) => 404,
            Self::CacheUnavailable(_)
            | Self::EmptyResponse
            | Self::InvalidResponse(_)
            | Self::Provider(_) => 502,
            Self::WithContext { source, .. } => source.status_code(),
            _ => 500,
        }
    }
}

/// Extension trait for adding context to any error type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(Error::MeetingNotFound(7).status_code(), 404);
        assert_eq!(Error::CacheUnavailable("gone".into()).status_code(), 502);
        assert_eq!(Error::EmptyResponse.status_code(), 502);
        assert_eq!(Error::InvalidResponse("bad json".into()).status_code(), 502);
        assert_eq!(Error::Provider("timeout".into()).status_code(), 502);
        assert_eq!(Error::Config("missing key".into()).status_code(), 500);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::MeetingNotFound(3).to_string(),
            "Meeting not found: 3"
        );
        assert_eq!(
            Error::EmptyResponse.to_string(),
            "Model returned an empty response"
        );
    }

    #[test]
    fn test_error_with_context() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        let with_ctx = err.with_context("loading meetings");
        assert!(matches!(with_ctx, Error::WithContext { .. }));
        assert_eq!(with_ctx.status_code(), 500);
        assert!(with_ctx.to_string().starts_with("loading meetings: "));
    }

    #[test]
    fn test_context_preserves_status() {
        let err = Error::MeetingNotFound(1).with_context("send_message");
        assert_eq!(err.status_code(), 404);
    }
}

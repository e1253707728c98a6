//! Error type shared by every fallible operation in the crate.
//!
//! Failures never take the application down. Callers either surface the
//! [`Display`](std::fmt::Display) text as a banner (network and HTTP errors)
//! or log it and keep the previous state (imports, transcription).

use thiserror::Error;

/// All failures produced by `ain-rs`.
#[derive(Debug, Error)]
pub enum AinError {
    /// The proposal API answered with a non-2xx status.
    #[error("HTTP error! status: {status} - {reason}")]
    Http {
        endpoint: String,
        status: u16,
        reason: String,
    },

    /// The request failed at the transport level and the health probe
    /// confirmed the backend is down.
    #[error(
        "Backend server is not accessible at {base_url}. Please ensure the backend is running. \
         For local development, run: uvicorn app.main:app --host 0.0.0.0 --port 8000"
    )]
    Unreachable { base_url: String },

    /// Any other transport failure.
    #[error("request failed: {0}")]
    Request(String),

    /// The response body was not the JSON we expected.
    #[error("failed to parse response: {0}")]
    Decode(String),

    /// A value could not be serialized to JSON.
    #[error("failed to serialize: {0}")]
    Encode(String),

    /// A block collection could not be parsed from JSON.
    #[error("failed to import blocks: {0}")]
    Import(#[source] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted document could not be serialized or deserialized.
    #[error("settings error: {0}")]
    Settings(String),

    /// A reorder suggestion was computed against an older block collection.
    #[error("suggestion is stale: computed at revision {expected}, blocks are at revision {actual}")]
    StaleSuggestion { expected: u64, actual: u64 },

    #[error("no pending suggestion with id '{0}'")]
    UnknownSuggestion(String),

    #[error("no block with id '{0}'")]
    UnknownBlock(String),

    #[error("no template with id '{0}'")]
    UnknownTemplate(String),

    #[error("transcription failed: {0}")]
    Transcription(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AinError>;

impl AinError {
    /// Whether this failure came from talking to the proposal API.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Unreachable { .. } | Self::Request(_) | Self::Decode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_matches_banner_text() {
        let err = AinError::Http {
            endpoint: "/analyze_purpose/".into(),
            status: 500,
            reason: "Internal Server Error".into(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP error! status: 500 - Internal Server Error"
        );
        assert!(err.is_network());
    }

    #[test]
    fn stale_suggestion_is_not_network() {
        let err = AinError::StaleSuggestion {
            expected: 3,
            actual: 5,
        };
        assert!(!err.is_network());
        assert!(err.to_string().contains("revision 3"));
    }
}

//! Error types for replyfetch.
//!
//! Errors fall into three groups that decide how far they travel:
//! - **Configuration**: unreadable or malformed credential file, missing keys. Fatal.
//! - **Per-line, recoverable**: an interrupt during retrieval or a malformed API
//!   response. The retriever suppresses these and the driver moves on.
//! - **Everything else**: network, authentication and unexpected API status codes.
//!   These propagate and end the run.

use thiserror::Error;

/// Errors produced while loading credentials, reading input or talking to the API.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A non-blank credential line that is not exactly `KEY VALUE`.
    #[error("malformed credential line {line}: expected `KEY VALUE`, found {tokens} token(s)")]
    CredentialParse { line: usize, tokens: usize },

    #[error("missing required credential `{0}`")]
    MissingCredential(&'static str),

    /// An input line that is not a usable original-post record.
    #[error("invalid input record: {0}")]
    InvalidRecord(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status returned by the Twitter API (other than rate limiting).
    #[error("Twitter API error for operation '{operation}' ({status})")]
    Api { operation: String, status: u16 },

    /// A response body that does not have the shape of a search page.
    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("interrupted")]
    Interrupted,
}

impl Error {
    /// Whether the retriever swallows this error and lets the driver continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Interrupted | Self::MalformedResponse(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_kinds() {
        assert!(Error::Interrupted.is_recoverable());
        assert!(Error::MalformedResponse("data is not an array".into()).is_recoverable());
        assert!(!Error::MissingCredential("bearer_token").is_recoverable());
        assert!(!Error::Api {
            operation: "search_replies_page_1".into(),
            status: 401
        }
        .is_recoverable());
        assert!(!Error::InvalidRecord("not JSON".into()).is_recoverable());
    }

    #[test]
    fn credential_parse_message_names_line() {
        let err = Error::CredentialParse { line: 3, tokens: 1 };
        assert_eq!(
            err.to_string(),
            "malformed credential line 3: expected `KEY VALUE`, found 1 token(s)"
        );
    }
}

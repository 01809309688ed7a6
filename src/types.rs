//! Crate-wide error type and result alias

use thiserror::Error;

/// Result alias used throughout atrium
pub type Result<T> = std::result::Result<T, AtriumError>;

/// Errors surfaced by atrium services
#[derive(Debug, Error)]
pub enum AtriumError {
    /// Configuration problem detected at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bearer token missing, malformed, or rejected by the verifier
    #[error("Unauthorized: {0}")]
    Auth(String),

    /// Request failed input validation (never reaches the core services)
    #[error("{0}")]
    Validation(String),

    /// Document store failure
    #[error("Database error: {0}")]
    Database(String),

    /// Requested document does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote API answered with a non-success HTTP status
    #[error("Remote API returned status {0}")]
    RemoteStatus(u16),

    /// Remote call did not complete within the request timeout
    #[error("Remote request timed out")]
    Timeout,

    /// Connection dropped mid-request
    #[error("Connection reset by remote")]
    ConnectionReset,

    /// Remote call succeeded transport-wise but carried no usable text
    #[error("Remote API returned an empty response")]
    EmptyResponse,

    /// Transport-level HTTP client failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Listener / socket failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AtriumError {
    /// Whether the retrier should attempt this failure again.
    ///
    /// Only rate limiting (429), service unavailability (503), connection
    /// resets, and timeouts are transient. Everything else propagates
    /// immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            AtriumError::RemoteStatus(429) | AtriumError::RemoteStatus(503) => true,
            AtriumError::Timeout | AtriumError::ConnectionReset => true,
            AtriumError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Map a terminal remote failure to the fixed user-facing message set.
    pub fn user_message(&self) -> String {
        match self {
            AtriumError::RemoteStatus(429) => {
                "Too many requests. Please try again in a few minutes.".to_string()
            }
            AtriumError::RemoteStatus(400) => {
                "Invalid request format. Please try again.".to_string()
            }
            AtriumError::RemoteStatus(401) | AtriumError::RemoteStatus(403) => {
                "The API credential is invalid. Please contact the administrator.".to_string()
            }
            AtriumError::RemoteStatus(status) if *status >= 500 => {
                "Server error. Please try again later.".to_string()
            }
            AtriumError::RemoteStatus(status) => {
                format!("API error ({}). Please try again.", status)
            }
            AtriumError::Timeout => "The request timed out. Please try again.".to_string(),
            AtriumError::Http(e) if e.is_timeout() => {
                "The request timed out. Please try again.".to_string()
            }
            AtriumError::EmptyResponse => {
                "The analysis service returned an empty response. Please try again.".to_string()
            }
            _ => "A technical error occurred.".to_string(),
        }
    }
}

//! Client error types.

use thiserror::Error;

/// Errors surfaced by the quiz client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request did not finish within the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Username/password did not match.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Local registration with a name that is already taken.
    #[error("user already exists")]
    UserExists,

    /// The operation needs a logged-in user.
    #[error("no user is logged in")]
    NotLoggedIn,

    /// Reading or writing the local store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// Whether the failure came from the transport rather than the backend's answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Timeout(_) | ClientError::Network(_))
    }
}

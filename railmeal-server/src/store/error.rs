//! Data store error types.

/// Errors that can occur when talking to the relational store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// HTTP request failed (network error, connect failure, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid API key or unauthorized
    #[error("unauthorized: check RAILMEAL_STORE_KEY")]
    Unauthorized,

    /// Rate limited by the gateway
    #[error("rate limited by data store")]
    RateLimited,

    /// Store returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// The call did not complete within its deadline
    #[error("request timed out")]
    Timeout,

    /// The store refused the operation (used by the in-memory store to
    /// simulate outages)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Fixture files could not be loaded
    #[error("fixture error: {message}")]
    Fixture { message: String },
}

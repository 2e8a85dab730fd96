//! Error types for transport implementations.

use thiserror::Error;

/// Transport-level error.
///
/// Variants carry plain strings rather than the underlying library errors so
/// values stay `Clone` — the entity layer shares failed results between
/// coalesced in-flight requests.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request never completed (DNS, connect, timeout, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not valid JSON.
    #[error("Invalid response body: {0}")]
    Decode(String),
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

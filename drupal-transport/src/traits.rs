//! The transport contract consumed by the entity layer.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::types::{CallConfig, Method, TransportResponse};

/// Abstraction over the HTTP round-trip.
///
/// Implementations must reject with [`TransportError`] on network failure or
/// non-2xx status; the entity layer never inspects error bodies, it only
/// propagates them. Cancellation, retries and credentials all live behind
/// this boundary.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request against the backend.
    async fn call(
        &self,
        method: Method,
        path: &str,
        config: CallConfig,
    ) -> Result<TransportResponse, TransportError>;
}

//! Error types for the entity core.

use thiserror::Error;

use drupal_transport::TransportError;

/// Entity-layer error.
///
/// Configuration and capability failures are distinct variants so callers
/// can tell "adapter not implemented" from "zero results" or a backend
/// fault. Transport errors pass through unchanged. `Clone` is required so
/// failed results can be shared between coalesced relation loads.
#[derive(Debug, Clone, Error)]
pub enum EntityError {
    /// No adapter factory is registered under the resolved key.
    #[error("No entity adapter registered under key '{0}'")]
    UnknownAdapter(String),

    /// The adapter exists but does not implement the requested operation.
    #[error("Adapter '{adapter}' does not support {operation}()")]
    Unsupported {
        adapter: String,
        operation: &'static str,
    },

    /// `get()` was called on a fluent query without a target id.
    #[error("Missing entity id: call id() before get()")]
    MissingId,

    /// Transport or backend failure, propagated as-is.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl EntityError {
    pub(crate) fn unsupported(adapter: &str, operation: &'static str) -> Self {
        EntityError::Unsupported {
            adapter: adapter.to_string(),
            operation,
        }
    }
}

/// Result type for entity operations.
pub type Result<T> = std::result::Result<T, EntityError>;

//! HTTP transport port for the Drupal entity SDK.
//!
//! The entity layer never talks to the network directly. It consumes the
//! [`Transport`] trait — `call(method, path, config)` — and leaves the
//! round-trip to whichever implementation the application wires in:
//!
//! - [`HttpTransport`]: a `reqwest`-based client with base URL, default
//!   headers and an optional bearer token.
//! - [`MockTransport`]: a configurable test double with a route table and
//!   call recording.
//!
//! Retry policies, CSRF tokens and session handling are deliberately out of
//! scope here; a transport that needs them wraps this contract.

pub mod error;
pub mod http;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::TransportError;
pub use http::{HttpConfig, HttpTransport};
pub use mock::{MockTransport, RecordedCall};
pub use traits::Transport;
pub use types::{CallConfig, Method, TransportResponse};

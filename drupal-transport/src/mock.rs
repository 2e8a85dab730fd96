//! Mock transport for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;
use crate::traits::Transport;
use crate::types::{CallConfig, Method, TransportResponse};

/// One request observed by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub data: Option<Value>,
}

/// Mock transport for testing.
///
/// Responds from an exact `(method, path)` route table, falling back to a
/// configurable default body. Records every call so tests can assert on
/// request shape and count, and supports an artificial latency so tests can
/// hold requests in flight deterministically.
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), Value>>,
    default_response: Mutex<Value>,
    failure: Mutex<Option<TransportError>>,
    calls: Mutex<Vec<RecordedCall>>,
    call_count: AtomicU32,
    delay: Mutex<Option<Duration>>,
}

impl MockTransport {
    /// Create a mock that answers every call with `{"data": null}`.
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            default_response: Mutex::new(serde_json::json!({ "data": null })),
            failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            call_count: AtomicU32::new(0),
            delay: Mutex::new(None),
        }
    }

    /// Register a response body for an exact method and path.
    pub fn with_response(self, method: Method, path: impl Into<String>, body: Value) -> Self {
        self.routes
            .lock()
            .expect("routes lock")
            .insert((method, path.into()), body);
        self
    }

    /// Set the body returned for unrouted calls.
    pub fn with_default_response(self, body: Value) -> Self {
        *self.default_response.lock().expect("default lock") = body;
        self
    }

    /// Make every call fail with the given error.
    pub fn with_failure(self, error: TransportError) -> Self {
        *self.failure.lock().expect("failure lock") = Some(error);
        self
    }

    /// Delay every response, keeping requests observably in flight.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().expect("delay lock") = Some(delay);
        self
    }

    /// Number of calls served so far.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// All recorded calls, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// The most recent recorded call, if any.
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().expect("calls lock").last().cloned()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(
        &self,
        method: Method,
        path: &str,
        config: CallConfig,
    ) -> Result<TransportResponse, TransportError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().expect("calls lock").push(RecordedCall {
            method,
            path: path.to_string(),
            params: config.params.clone(),
            data: config.data.clone(),
        });

        let delay = *self.delay.lock().expect("delay lock");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failure.lock().expect("failure lock").clone() {
            return Err(error);
        }

        let body = self
            .routes
            .lock()
            .expect("routes lock")
            .get(&(method, path.to_string()))
            .cloned();

        let body = match body {
            Some(body) => body,
            None => self.default_response.lock().expect("default lock").clone(),
        };

        Ok(TransportResponse::ok(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_and_default() {
        let mock = MockTransport::new()
            .with_response(
                Method::Get,
                "/jsonapi/node/article/1",
                serde_json::json!({ "data": { "id": "1" } }),
            )
            .with_default_response(serde_json::json!({ "data": [] }));

        let hit = mock
            .call(Method::Get, "/jsonapi/node/article/1", CallConfig::new())
            .await
            .unwrap();
        assert_eq!(hit.data["data"]["id"], "1");

        let miss = mock
            .call(Method::Get, "/jsonapi/node/page", CallConfig::new())
            .await
            .unwrap();
        assert_eq!(miss.data["data"], serde_json::json!([]));

        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let mock = MockTransport::new().with_failure(TransportError::Status {
            status: 500,
            body: "boom".into(),
        });

        let result = mock.call(Method::Get, "/x", CallConfig::new()).await;
        assert!(matches!(
            result,
            Err(TransportError::Status { status: 500, .. })
        ));
        assert_eq!(mock.call_count(), 1);
    }
}

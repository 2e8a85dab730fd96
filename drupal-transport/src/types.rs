//! Wire types for the transport contract.

use std::collections::HashMap;

use serde_json::Value;

/// HTTP method for a transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    /// Canonical uppercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call request configuration.
///
/// Query parameters are already flattened to string pairs by the caller;
/// repeated keys are allowed (array-valued parameters arrive as one pair per
/// element).
#[derive(Debug, Clone, Default)]
pub struct CallConfig {
    /// Query string parameters, in emission order.
    pub params: Vec<(String, String)>,
    /// JSON request body, if any.
    pub data: Option<Value>,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
}

impl CallConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query parameters.
    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    /// Set the JSON body.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A completed transport round-trip.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code (always 2xx — failures reject instead).
    pub status: u16,
    /// Decoded JSON body; `Value::Null` for empty bodies.
    pub data: Value,
    /// Response headers, lowercased names.
    pub headers: HashMap<String, String>,
}

impl TransportResponse {
    /// Build a 200 response around a JSON body.
    pub fn ok(data: Value) -> Self {
        Self {
            status: 200,
            data,
            headers: HashMap::new(),
        }
    }
}

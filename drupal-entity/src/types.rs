//! Common types for the entity core.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::params::ParamMap;

/// A content type/bundle pair, e.g. `node` / `article`.
///
/// Immutable value constructed by callers; everything else in the entity
/// layer is keyed off it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityIdentifier {
    /// Entity type, e.g. `node`, `taxonomy_term`, `user`.
    pub entity: String,
    /// Bundle within the entity type, e.g. `article`, `tags`.
    pub bundle: String,
}

impl EntityIdentifier {
    /// Create a new identifier.
    pub fn new(entity: impl Into<String>, bundle: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            bundle: bundle.into(),
        }
    }

    /// The JSON:API resource type name, `{entity}--{bundle}`.
    pub fn type_name(&self) -> String {
        format!("{}--{}", self.entity, self.bundle)
    }

    /// Derive an identifier from a resource type string.
    ///
    /// Splits on the literal `--` separator. Empty or single-word strings
    /// resolve to the fallback identifier, never to a partial parse.
    pub fn from_type_name(type_name: &str, fallback: &EntityIdentifier) -> Self {
        match type_name.split_once("--") {
            Some((entity, bundle)) => Self::new(entity, bundle),
            None => fallback.clone(),
        }
    }
}

impl std::fmt::Display for EntityIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}--{}", self.entity, self.bundle)
    }
}

/// A normalized entity record.
///
/// `relationships` is an opaque pass-through bag whose structure belongs to
/// the backend protocol (for JSON:API: `{ "data": linkage | [linkage] }`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Backend-assigned identifier; empty string when a malformed payload
    /// was normalized.
    pub id: String,
    /// Resource type name; defaults to `{entity}--{bundle}` when the
    /// backend omits it.
    #[serde(rename = "type")]
    pub kind: String,
    /// Entity field values.
    #[serde(default)]
    pub attributes: serde_json::Map<String, Value>,
    /// Raw relationship linkage, untouched by normalization.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub relationships: serde_json::Map<String, Value>,
}

/// Pagination metadata reported by a backend.
///
/// Backends report subsets, so every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityPageInfo {
    /// Page size.
    pub size: Option<u64>,
    /// Page number.
    pub number: Option<u64>,
    /// Total result count.
    pub total: Option<u64>,
    /// Link to the next page.
    pub next: Option<String>,
    /// Link to the previous page.
    pub prev: Option<String>,
}

/// One page of entity results.
#[derive(Debug)]
pub struct EntityPage {
    /// Records on this page, relation-capable.
    pub items: Vec<crate::relation::EntityHandle>,
    /// Page metadata; `None` when the adapter could only `list()`.
    pub page: Option<EntityPageInfo>,
}

/// JSON:API-specific per-call options.
#[derive(Debug, Clone, Default)]
pub struct JsonApiOptions {
    /// Query parameters, taking precedence over [`EntityOptions::params`].
    pub query: ParamMap,
}

/// Per-call options for entity operations.
#[derive(Debug, Clone, Default)]
pub struct EntityOptions {
    /// Backend-agnostic query parameters.
    pub params: ParamMap,
    /// JSON:API options; when present, its `query` replaces `params`.
    pub jsonapi: Option<JsonApiOptions>,
}

impl EntityOptions {
    /// Options carrying only backend-agnostic params.
    pub fn with_params(params: ParamMap) -> Self {
        Self {
            params,
            jsonapi: None,
        }
    }

    /// Options carrying a JSON:API query.
    pub fn with_jsonapi_query(query: ParamMap) -> Self {
        Self {
            params: ParamMap::new(),
            jsonapi: Some(JsonApiOptions { query }),
        }
    }

    /// The query map an adapter should send: `jsonapi.query` when the
    /// JSON:API block is present, otherwise `params`.
    pub fn effective_query(&self) -> &ParamMap {
        match &self.jsonapi {
            Some(jsonapi) => &jsonapi.query,
            None => &self.params,
        }
    }
}

/// Coerce a linkage field to a string the way loosely typed payloads are
/// read: strings pass through, numbers and bools stringify, anything else
/// (including absence) becomes the empty string.
pub(crate) fn coerce_str(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

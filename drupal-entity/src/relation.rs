//! Relationship accessors and in-flight request coalescing.
//!
//! Loaded records come back wrapped in an [`EntityHandle`]: it dereferences
//! and serializes as the plain record, and exposes `rel(name)` for lazily
//! resolving linked entities. Concurrent loads of the same relation on the
//! same record share one in-flight future; the cache entry is removed as
//! soon as that future settles, so sequential calls always re-fetch. The
//! cache de-duplicates overlapping requests — it is not a TTL cache.

use std::ops::Deref;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{try_join_all, BoxFuture, Shared};
use futures::FutureExt;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::service::EntityService;
use crate::types::{coerce_str, EntityIdentifier, EntityOptions, EntityRecord, JsonApiOptions};

type RelationFuture = Shared<BoxFuture<'static, Result<Vec<EntityHandle>>>>;

/// In-flight relation loads, keyed by
/// `{entity}--{bundle}:{record_id}:{relation}`.
///
/// Owned by one [`EntityService`]; entries exist only while a load is in
/// flight.
pub(crate) struct RelationCache {
    inflight: DashMap<String, RelationFuture>,
}

impl RelationCache {
    pub(crate) fn new() -> Self {
        Self {
            inflight: DashMap::new(),
        }
    }
}

/// A loaded entity record with lazy relationship access.
///
/// Derefs to [`EntityRecord`] and serializes as the record alone, so the
/// accessor machinery never leaks into persisted or transmitted shapes.
#[derive(Clone)]
pub struct EntityHandle {
    record: EntityRecord,
    service: EntityService,
    identifier: EntityIdentifier,
    adapter_key: Option<String>,
}

impl EntityHandle {
    /// The wrapped record.
    pub fn record(&self) -> &EntityRecord {
        &self.record
    }

    /// Unwrap into the plain record.
    pub fn into_record(self) -> EntityRecord {
        self.record
    }

    /// Accessor for a named relationship.
    pub fn rel(&self, name: impl Into<String>) -> RelationProxy {
        RelationProxy {
            service: self.service.clone(),
            identifier: self.identifier.clone(),
            adapter_key: self.adapter_key.clone(),
            record_id: self.record.id.clone(),
            relationships: self.record.relationships.clone(),
            name: name.into(),
        }
    }
}

impl Deref for EntityHandle {
    type Target = EntityRecord;

    fn deref(&self) -> &EntityRecord {
        &self.record
    }
}

impl Serialize for EntityHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.record.serialize(serializer)
    }
}

impl std::fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityHandle")
            .field("record", &self.record)
            .field("identifier", &self.identifier)
            .finish()
    }
}

/// Wrap a record with relation accessors bound to a service.
pub fn attach_relations(
    record: EntityRecord,
    service: &EntityService,
    identifier: EntityIdentifier,
    adapter_key: Option<&str>,
) -> EntityHandle {
    EntityHandle {
        record,
        service: service.clone(),
        identifier,
        adapter_key: adapter_key.map(str::to_string),
    }
}

/// Lazy loader for one relationship of one record.
pub struct RelationProxy {
    service: EntityService,
    identifier: EntityIdentifier,
    adapter_key: Option<String>,
    record_id: String,
    relationships: serde_json::Map<String, Value>,
    name: String,
}

impl RelationProxy {
    /// Resolve the related records.
    ///
    /// Concurrent calls with the same cache key share one underlying fetch;
    /// both success and failure are delivered to every waiter. The entry
    /// removes itself the moment the shared future settles — not when the
    /// creating caller returns — so a creator dropped mid-flight (timeout,
    /// `select!`) cannot leak a settled entry that later callers would be
    /// served from.
    pub async fn load(&self, options: &EntityOptions) -> Result<Vec<EntityHandle>> {
        let key = format!(
            "{}:{}:{}",
            self.identifier, self.record_id, self.name
        );

        let future = match self.service.relations().inflight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                debug!(target: "drupal_entity", %key, "coalescing relation load");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let inner = self.resolve(options);
                let service = self.service.clone();
                let cache_key = key.clone();
                let future = async move {
                    let result = inner.await;
                    service.relations().inflight.remove(&cache_key);
                    result
                }
                .boxed()
                .shared();
                entry.insert(future.clone());
                future
            }
        };

        future.await
    }

    /// Build the actual resolution future.
    ///
    /// Array linkage loads each target in parallel, preserving input order
    /// through an all-or-nothing join. Single-object linkage with an id
    /// loads once. Anything else falls back to an include-based list fetch
    /// whose result is intentionally discarded — the fetch exists to warm
    /// server-side caches, and callers get an empty list.
    fn resolve(&self, options: &EntityOptions) -> BoxFuture<'static, Result<Vec<EntityHandle>>> {
        let service = self.service.clone();
        let identifier = self.identifier.clone();
        let adapter_key = self.adapter_key.clone();
        let name = self.name.clone();
        let options = options.clone();
        let linkage = self
            .relationships
            .get(&self.name)
            .and_then(|rel| rel.get("data"))
            .cloned();

        async move {
            match linkage {
                Some(Value::Array(items)) if !items.is_empty() => {
                    let loads = items.iter().map(|item| {
                        let (target, id) = linkage_target(item, &identifier);
                        let service = service.clone();
                        let options = options.clone();
                        let adapter_key = adapter_key.clone();
                        async move { service.load(&target, &id, &options, adapter_key.as_deref()).await }
                    });
                    try_join_all(loads).await
                }
                Some(Value::Object(object)) if !coerce_str(object.get("id")).is_empty() => {
                    let item = Value::Object(object);
                    let (target, id) = linkage_target(&item, &identifier);
                    let handle = service
                        .load(&target, &id, &options, adapter_key.as_deref())
                        .await?;
                    Ok(vec![handle])
                }
                _ => {
                    debug!(
                        target: "drupal_entity",
                        %identifier, relation = %name,
                        "no usable linkage, issuing include fallback"
                    );
                    let mut query = options
                        .jsonapi
                        .as_ref()
                        .map(|jsonapi| jsonapi.query.clone())
                        .unwrap_or_default();
                    query.insert("include".to_string(), Value::String(name));

                    let fallback = EntityOptions {
                        params: options.params.clone(),
                        jsonapi: Some(JsonApiOptions { query }),
                    };
                    let _ = service
                        .list(&identifier, &fallback, adapter_key.as_deref())
                        .await?;
                    Ok(Vec::new())
                }
            }
        }
        .boxed()
    }
}

/// Derive the load target from one linkage object.
///
/// The type string splits on `--` when the separator is present; otherwise
/// the enclosing identifier applies. Both fields go through loose string
/// coercion so null linkage degrades to empty strings instead of failing.
fn linkage_target(item: &Value, fallback: &EntityIdentifier) -> (EntityIdentifier, String) {
    let object = item.as_object();
    let type_name = coerce_str(object.and_then(|o| o.get("type")));
    let id = coerce_str(object.and_then(|o| o.get("id")));
    (
        EntityIdentifier::from_type_name(&type_name, fallback),
        id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_linkage_target_parses_separator() {
        let fallback = EntityIdentifier::new("node", "article");
        let (target, id) =
            linkage_target(&json!({ "type": "taxonomy_term--tags", "id": "5" }), &fallback);
        assert_eq!(target, EntityIdentifier::new("taxonomy_term", "tags"));
        assert_eq!(id, "5");
    }

    #[test]
    fn test_linkage_target_falls_back_without_separator() {
        let fallback = EntityIdentifier::new("node", "article");
        let (target, id) = linkage_target(&json!({ "type": "user", "id": "5" }), &fallback);
        assert_eq!(target, fallback);
        assert_eq!(id, "5");

        let (target, _) = linkage_target(&json!({ "type": "", "id": "5" }), &fallback);
        assert_eq!(target, fallback);
    }

    #[test]
    fn test_linkage_target_tolerates_nulls() {
        let fallback = EntityIdentifier::new("node", "article");
        let (target, id) = linkage_target(&json!({ "type": null, "id": null }), &fallback);
        assert_eq!(target, fallback);
        assert_eq!(id, "");

        let (target, id) = linkage_target(&json!(null), &fallback);
        assert_eq!(target, fallback);
        assert_eq!(id, "");
    }

    #[test]
    fn test_numeric_linkage_id_coerces() {
        let fallback = EntityIdentifier::new("node", "article");
        let (_, id) = linkage_target(&json!({ "type": "user--user", "id": 5 }), &fallback);
        assert_eq!(id, "5");
    }
}

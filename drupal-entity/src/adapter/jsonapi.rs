//! Reference adapter for JSON:API-shaped backends.
//!
//! Reachable-but-malformed payloads normalize to empty/default records
//! instead of failing: a missing `data` member yields a record with an
//! empty id, a non-array collection yields an empty list. Transport and
//! status failures still reject. This asymmetry is deliberate — backend
//! quirks should not take down a page render, but a dead backend must be
//! visible.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use drupal_transport::{CallConfig, Method};

use super::{AdapterCapabilities, AdapterContext, AdapterFactory, EntityAdapter};
use crate::error::Result;
use crate::params::to_wire_params;
use crate::types::{coerce_str, EntityOptions, EntityPageInfo, EntityRecord};

/// Registry key the JSON:API adapter is installed under by default.
pub const JSONAPI_ADAPTER_KEY: &str = "jsonapi";

/// Entity adapter for JSON:API backends.
pub struct JsonApiAdapter {
    context: AdapterContext,
}

impl JsonApiAdapter {
    /// Create an adapter from a fresh context.
    pub fn new(context: AdapterContext) -> Self {
        Self { context }
    }

    /// Factory suitable for [`crate::EntityService::register_adapter`].
    pub fn factory() -> AdapterFactory {
        Arc::new(|context| Arc::new(JsonApiAdapter::new(context)) as Arc<dyn EntityAdapter>)
    }

    fn wire_query(&self, options: &EntityOptions) -> Vec<(String, String)> {
        to_wire_params(options.effective_query())
    }

    fn record_path(&self, id: &str) -> String {
        format!("{}/{}", self.context.base_path, urlencoding::encode(id))
    }

    /// Normalize one raw resource object into an [`EntityRecord`].
    ///
    /// Non-object payloads yield the empty-id sentinel record with the
    /// context's `{entity}--{bundle}` as fallback type.
    fn normalize(&self, raw: &Value) -> EntityRecord {
        let fallback_type = self.context.id.type_name();
        let Some(object) = raw.as_object() else {
            return EntityRecord {
                id: String::new(),
                kind: fallback_type,
                attributes: serde_json::Map::new(),
                relationships: serde_json::Map::new(),
            };
        };

        let kind = match object.get("type").and_then(Value::as_str) {
            Some(kind) if !kind.is_empty() => kind.to_string(),
            _ => fallback_type,
        };

        EntityRecord {
            id: coerce_str(object.get("id")),
            kind,
            attributes: object
                .get("attributes")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            relationships: object
                .get("relationships")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        }
    }

    fn normalize_collection(&self, body: &Value) -> Vec<EntityRecord> {
        match body.get("data").and_then(Value::as_array) {
            Some(rows) => rows.iter().map(|row| self.normalize(row)).collect(),
            None => Vec::new(),
        }
    }

    /// Read a numeric value the loose way backends emit them: plain
    /// integers pass through, and integral floats (`25.0`) truncate
    /// cleanly. Fractional or negative numbers are treated as absent.
    fn loose_u64(value: &Value) -> Option<u64> {
        let number = value.as_number()?;
        number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })
    }

    fn page_info(body: &Value) -> EntityPageInfo {
        let meta_number = |name: &str| {
            body.get("meta")
                .and_then(|meta| meta.get(name))
                .and_then(Self::loose_u64)
        };
        // Links must be objects carrying a string href; anything else is
        // treated as absent.
        let link_href = |name: &str| {
            body.get("links")
                .and_then(|links| links.get(name))
                .and_then(Value::as_object)
                .and_then(|link| link.get("href"))
                .and_then(Value::as_str)
                .map(String::from)
        };

        EntityPageInfo {
            size: meta_number("pageSize"),
            number: meta_number("pageNumber"),
            total: meta_number("count"),
            next: link_href("next"),
            prev: link_href("prev"),
        }
    }
}

#[async_trait]
impl EntityAdapter for JsonApiAdapter {
    fn key(&self) -> &str {
        JSONAPI_ADAPTER_KEY
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::full()
    }

    async fn load(&self, id: &str, options: &EntityOptions) -> Result<EntityRecord> {
        let path = self.record_path(id);
        debug!(target: "drupal_entity", %path, "jsonapi load");
        let response = self
            .context
            .client
            .call(
                Method::Get,
                &path,
                CallConfig::new().with_params(self.wire_query(options)),
            )
            .await?;

        let raw = response.data.get("data").cloned().unwrap_or(Value::Null);
        Ok(self.normalize(&raw))
    }

    async fn list(&self, options: &EntityOptions) -> Result<Vec<EntityRecord>> {
        debug!(target: "drupal_entity", path = %self.context.base_path, "jsonapi list");
        let response = self
            .context
            .client
            .call(
                Method::Get,
                &self.context.base_path,
                CallConfig::new().with_params(self.wire_query(options)),
            )
            .await?;

        Ok(self.normalize_collection(&response.data))
    }

    async fn count(&self, options: &EntityOptions) -> Result<u64> {
        let response = self
            .context
            .client
            .call(
                Method::Get,
                &self.context.base_path,
                CallConfig::new().with_params(self.wire_query(options)),
            )
            .await?;

        let meta_count = response
            .data
            .get("meta")
            .and_then(|meta| meta.get("count"))
            .and_then(Self::loose_u64);

        Ok(match meta_count {
            Some(count) => count,
            None => response
                .data
                .get("data")
                .and_then(Value::as_array)
                .map(|rows| rows.len() as u64)
                .unwrap_or(0),
        })
    }

    async fn list_page(
        &self,
        options: &EntityOptions,
    ) -> Result<(Vec<EntityRecord>, Option<EntityPageInfo>)> {
        let response = self
            .context
            .client
            .call(
                Method::Get,
                &self.context.base_path,
                CallConfig::new().with_params(self.wire_query(options)),
            )
            .await?;

        let items = self.normalize_collection(&response.data);
        let page = Self::page_info(&response.data);
        Ok((items, Some(page)))
    }

    async fn create(
        &self,
        attributes: serde_json::Map<String, Value>,
        options: &EntityOptions,
    ) -> Result<EntityRecord> {
        let document = serde_json::json!({
            "data": {
                "type": self.context.id.type_name(),
                "attributes": attributes,
            }
        });
        debug!(target: "drupal_entity", path = %self.context.base_path, "jsonapi create");

        let response = self
            .context
            .client
            .call(
                Method::Post,
                &self.context.base_path,
                CallConfig::new()
                    .with_params(self.wire_query(options))
                    .with_data(document),
            )
            .await?;

        let raw = response.data.get("data").cloned().unwrap_or(Value::Null);
        Ok(self.normalize(&raw))
    }

    async fn update(
        &self,
        id: &str,
        attributes: serde_json::Map<String, Value>,
        options: &EntityOptions,
    ) -> Result<EntityRecord> {
        let document = serde_json::json!({
            "data": {
                "type": self.context.id.type_name(),
                "id": id,
                "attributes": attributes,
            }
        });
        let path = self.record_path(id);
        debug!(target: "drupal_entity", %path, "jsonapi update");

        let response = self
            .context
            .client
            .call(
                Method::Patch,
                &path,
                CallConfig::new()
                    .with_params(self.wire_query(options))
                    .with_data(document),
            )
            .await?;

        let raw = response.data.get("data").cloned().unwrap_or(Value::Null);
        Ok(self.normalize(&raw))
    }

    async fn delete(&self, id: &str, options: &EntityOptions) -> Result<()> {
        let path = self.record_path(id);
        debug!(target: "drupal_entity", %path, "jsonapi delete");
        self.context
            .client
            .call(
                Method::Delete,
                &path,
                CallConfig::new().with_params(self.wire_query(options)),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityIdentifier;
    use drupal_transport::MockTransport;
    use serde_json::json;

    fn adapter_with(mock: Arc<MockTransport>) -> JsonApiAdapter {
        JsonApiAdapter::new(AdapterContext {
            id: EntityIdentifier::new("node", "article"),
            base_path: "/jsonapi/node/article".to_string(),
            client: mock,
            config: None,
        })
    }

    #[tokio::test]
    async fn test_load_normalizes_record() {
        let mock = Arc::new(MockTransport::new().with_response(
            Method::Get,
            "/jsonapi/node/article/42",
            json!({ "data": { "id": "42", "type": "node--article", "attributes": { "title": "Hi" } } }),
        ));
        let adapter = adapter_with(mock);

        let record = adapter.load("42", &EntityOptions::default()).await.unwrap();
        assert_eq!(record.id, "42");
        assert_eq!(record.kind, "node--article");
        assert_eq!(record.attributes["title"], "Hi");
    }

    #[tokio::test]
    async fn test_load_missing_payload_normalizes_to_sentinel() {
        let mock = Arc::new(MockTransport::new().with_response(
            Method::Get,
            "/jsonapi/node/article/42",
            json!({ "unexpected": true }),
        ));
        let adapter = adapter_with(mock);

        let record = adapter.load("42", &EntityOptions::default()).await.unwrap();
        assert_eq!(record.id, "");
        assert_eq!(record.kind, "node--article");
        assert!(record.attributes.is_empty());
    }

    #[tokio::test]
    async fn test_load_encodes_id_in_path() {
        let mock = Arc::new(MockTransport::new());
        let adapter = adapter_with(Arc::clone(&mock));

        adapter
            .load("some id/slash", &EntityOptions::default())
            .await
            .unwrap();

        let call = mock.last_call().unwrap();
        assert_eq!(call.path, "/jsonapi/node/article/some%20id%2Fslash");
    }

    #[tokio::test]
    async fn test_list_tolerates_malformed_rows() {
        let mock = Arc::new(MockTransport::new().with_response(
            Method::Get,
            "/jsonapi/node/article",
            json!({ "data": [null, "junk", { "id": "1", "type": "node--article" }] }),
        ));
        let adapter = adapter_with(mock);

        let records = adapter.list(&EntityOptions::default()).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, "");
        assert_eq!(records[0].kind, "node--article");
        assert_eq!(records[1].id, "");
        assert_eq!(records[2].id, "1");
    }

    #[tokio::test]
    async fn test_list_non_array_data_is_empty() {
        let mock = Arc::new(MockTransport::new().with_response(
            Method::Get,
            "/jsonapi/node/article",
            json!({ "data": "oops" }),
        ));
        let adapter = adapter_with(mock);

        let records = adapter.list(&EntityOptions::default()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_count_prefers_meta_then_falls_back() {
        let with_meta = Arc::new(MockTransport::new().with_response(
            Method::Get,
            "/jsonapi/node/article",
            json!({ "data": [{}, {}], "meta": { "count": 7 } }),
        ));
        assert_eq!(
            adapter_with(with_meta)
                .count(&EntityOptions::default())
                .await
                .unwrap(),
            7
        );

        let without_meta = Arc::new(MockTransport::new().with_response(
            Method::Get,
            "/jsonapi/node/article",
            json!({ "data": [{}, {}] }),
        ));
        assert_eq!(
            adapter_with(without_meta)
                .count(&EntityOptions::default())
                .await
                .unwrap(),
            2
        );

        let no_data = Arc::new(MockTransport::new().with_response(
            Method::Get,
            "/jsonapi/node/article",
            json!({ "data": null }),
        ));
        assert_eq!(
            adapter_with(no_data)
                .count(&EntityOptions::default())
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_list_page_reads_meta_and_links() {
        let mock = Arc::new(MockTransport::new().with_response(
            Method::Get,
            "/jsonapi/node/article",
            json!({
                "data": [{ "id": "1", "type": "node--article" }],
                "meta": { "count": 30, "pageSize": 10, "pageNumber": "not-a-number" },
                "links": {
                    "next": { "href": "https://cms.test/jsonapi/node/article?page=2" },
                    "prev": "bare-string-is-ignored"
                }
            }),
        ));
        let adapter = adapter_with(mock);

        let (items, page) = adapter
            .list_page(&EntityOptions::default())
            .await
            .unwrap();
        let page = page.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(page.total, Some(30));
        assert_eq!(page.size, Some(10));
        assert_eq!(page.number, None);
        assert_eq!(
            page.next.as_deref(),
            Some("https://cms.test/jsonapi/node/article?page=2")
        );
        assert_eq!(page.prev, None);
    }

    #[tokio::test]
    async fn test_float_typed_meta_numbers_are_accepted() {
        let mock = Arc::new(MockTransport::new().with_response(
            Method::Get,
            "/jsonapi/node/article",
            json!({
                "data": [],
                "meta": { "count": 25.0, "pageSize": 10.0, "pageNumber": 2.5 }
            }),
        ));
        let adapter = adapter_with(Arc::clone(&mock));

        assert_eq!(adapter.count(&EntityOptions::default()).await.unwrap(), 25);

        let (_, page) = adapter.list_page(&EntityOptions::default()).await.unwrap();
        let page = page.unwrap();
        assert_eq!(page.total, Some(25));
        assert_eq!(page.size, Some(10));
        // Fractional values stay absent.
        assert_eq!(page.number, None);
    }

    #[tokio::test]
    async fn test_delete_forwards_query_params() {
        let mock = Arc::new(MockTransport::new());
        let adapter = adapter_with(Arc::clone(&mock));

        let query = json!({ "notify": "false" }).as_object().cloned().unwrap();
        adapter
            .delete("9", &EntityOptions::with_jsonapi_query(query))
            .await
            .unwrap();

        let call = mock.last_call().unwrap();
        assert_eq!(call.method, Method::Delete);
        assert_eq!(call.path, "/jsonapi/node/article/9");
        assert!(call.params.contains(&("notify".into(), "false".into())));
    }

    #[tokio::test]
    async fn test_create_posts_document() {
        let mock = Arc::new(MockTransport::new().with_response(
            Method::Post,
            "/jsonapi/node/article",
            json!({ "data": { "id": "9", "type": "node--article", "attributes": { "title": "New" } } }),
        ));
        let adapter = adapter_with(Arc::clone(&mock));

        let attributes = json!({ "title": "New" }).as_object().cloned().unwrap();
        let record = adapter
            .create(attributes, &EntityOptions::default())
            .await
            .unwrap();
        assert_eq!(record.id, "9");

        let call = mock.last_call().unwrap();
        assert_eq!(call.method, Method::Post);
        assert_eq!(call.data.unwrap()["data"]["type"], "node--article");
    }

    #[tokio::test]
    async fn test_update_patches_record_path() {
        let mock = Arc::new(MockTransport::new().with_response(
            Method::Patch,
            "/jsonapi/node/article/9",
            json!({ "data": { "id": "9", "type": "node--article", "attributes": { "title": "Edited" } } }),
        ));
        let adapter = adapter_with(Arc::clone(&mock));

        let attributes = json!({ "title": "Edited" }).as_object().cloned().unwrap();
        let record = adapter
            .update("9", attributes, &EntityOptions::default())
            .await
            .unwrap();
        assert_eq!(record.attributes["title"], "Edited");

        let call = mock.last_call().unwrap();
        assert_eq!(call.data.unwrap()["data"]["id"], "9");
    }

    #[tokio::test]
    async fn test_query_params_reach_the_wire() {
        let mock = Arc::new(MockTransport::new());
        let adapter = adapter_with(Arc::clone(&mock));

        let query = json!({ "sort": "-created", "page[limit]": 5, "skipped": null })
            .as_object()
            .cloned()
            .unwrap();
        adapter
            .list(&EntityOptions::with_jsonapi_query(query))
            .await
            .unwrap();

        let call = mock.last_call().unwrap();
        assert!(call.params.contains(&("sort".into(), "-created".into())));
        assert!(call.params.contains(&("page[limit]".into(), "5".into())));
        assert!(!call.params.iter().any(|(k, _)| k == "skipped"));
    }
}

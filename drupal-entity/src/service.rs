//! Central registry and dispatcher for entity operations.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use drupal_transport::Transport;

use crate::adapter::jsonapi::{JsonApiAdapter, JSONAPI_ADAPTER_KEY};
use crate::adapter::{AdapterContext, AdapterFactory, EntityLoader};
use crate::config::ConfigBag;
use crate::error::{EntityError, Result};
use crate::relation::{attach_relations, EntityHandle, RelationCache};
use crate::types::{EntityIdentifier, EntityOptions, EntityPage, EntityRecord};

struct ServiceInner {
    client: Arc<dyn Transport>,
    config: Option<Arc<ConfigBag>>,
    adapters: DashMap<String, AdapterFactory>,
    default_adapter: RwLock<String>,
    relations: RelationCache,
}

/// Registry of named adapter factories plus the operations dispatched
/// through them.
///
/// Cheap to clone — clones share the registry, transport and relation
/// cache. Each service instance owns its own in-flight relation cache, so
/// independent instances never cross-talk. The JSON:API adapter is
/// registered under `"jsonapi"` at construction and starts as the default.
#[derive(Clone)]
pub struct EntityService {
    inner: Arc<ServiceInner>,
}

impl EntityService {
    /// Create a service around a transport.
    pub fn new(client: Arc<dyn Transport>) -> Self {
        Self::build(client, None)
    }

    /// Create a service with a configuration bag passed through to
    /// adapters.
    pub fn with_config(client: Arc<dyn Transport>, config: Arc<ConfigBag>) -> Self {
        Self::build(client, Some(config))
    }

    fn build(client: Arc<dyn Transport>, config: Option<Arc<ConfigBag>>) -> Self {
        let service = Self {
            inner: Arc::new(ServiceInner {
                client,
                config,
                adapters: DashMap::new(),
                default_adapter: RwLock::new(JSONAPI_ADAPTER_KEY.to_string()),
                relations: RelationCache::new(),
            }),
        };
        service.register_adapter(JSONAPI_ADAPTER_KEY, JsonApiAdapter::factory());
        service
    }

    pub(crate) fn relations(&self) -> &RelationCache {
        &self.inner.relations
    }

    /// Register an adapter factory under a key.
    ///
    /// Re-registering a key silently replaces the previous factory.
    pub fn register_adapter(&self, key: impl Into<String>, factory: AdapterFactory) -> &Self {
        let key = key.into();
        debug!(target: "drupal_entity", %key, "registering entity adapter");
        self.inner.adapters.insert(key, factory);
        self
    }

    /// Set the default adapter key.
    ///
    /// The key is not validated here; resolution failure surfaces on first
    /// use.
    pub fn set_default_adapter(&self, key: impl Into<String>) -> &Self {
        *self
            .inner
            .default_adapter
            .write()
            .expect("default adapter lock poisoned") = key.into();
        self
    }

    /// The current default adapter key.
    pub fn default_adapter(&self) -> String {
        self.inner
            .default_adapter
            .read()
            .expect("default adapter lock poisoned")
            .clone()
    }

    /// Build a loader for an identifier, resolving the adapter key against
    /// the registry.
    pub fn entity(
        &self,
        identifier: &EntityIdentifier,
        adapter_key: Option<&str>,
    ) -> Result<EntityLoader> {
        let key = adapter_key
            .map(str::to_string)
            .unwrap_or_else(|| self.default_adapter());

        let factory = self
            .inner
            .adapters
            .get(&key)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EntityError::UnknownAdapter(key.clone()))?;

        // The base path follows the JSON:API convention regardless of
        // adapter; non-JSON:API adapters may reinterpret or ignore it.
        let context = AdapterContext {
            id: identifier.clone(),
            base_path: format!("/jsonapi/{}/{}", identifier.entity, identifier.bundle),
            client: Arc::clone(&self.inner.client),
            config: self.inner.config.clone(),
        };

        debug!(target: "drupal_entity", %identifier, %key, "building entity loader");
        Ok(EntityLoader::new(identifier.clone(), factory(context)))
    }

    /// Load one entity and attach relation accessors.
    pub async fn load(
        &self,
        identifier: &EntityIdentifier,
        id: &str,
        options: &EntityOptions,
        adapter_key: Option<&str>,
    ) -> Result<EntityHandle> {
        let loader = self.entity(identifier, adapter_key)?;
        let record = loader.load(id, options).await?;
        Ok(attach_relations(record, self, identifier.clone(), adapter_key))
    }

    /// List entities and attach relation accessors.
    pub async fn list(
        &self,
        identifier: &EntityIdentifier,
        options: &EntityOptions,
        adapter_key: Option<&str>,
    ) -> Result<Vec<EntityHandle>> {
        let loader = self.entity(identifier, adapter_key)?;
        let records = loader.list(options).await?;
        Ok(self.wrap_all(records, identifier, adapter_key))
    }

    /// Count entities. No fallback: adapters without count support fail.
    pub async fn count(
        &self,
        identifier: &EntityIdentifier,
        options: &EntityOptions,
        adapter_key: Option<&str>,
    ) -> Result<u64> {
        let loader = self.entity(identifier, adapter_key)?;
        loader.count(options).await
    }

    /// List one page of entities.
    ///
    /// Degrades gracefully: when the adapter lacks `list_page`, falls back
    /// to `list()` with no page metadata.
    pub async fn list_page(
        &self,
        identifier: &EntityIdentifier,
        options: &EntityOptions,
        adapter_key: Option<&str>,
    ) -> Result<EntityPage> {
        let loader = self.entity(identifier, adapter_key)?;

        let (records, page) = if loader.capabilities().list_page {
            loader.list_page(options).await?
        } else {
            debug!(target: "drupal_entity", %identifier, "list_page unavailable, degrading to list");
            (loader.list(options).await?, None)
        };

        Ok(EntityPage {
            items: self.wrap_all(records, identifier, adapter_key),
            page,
        })
    }

    /// Create an entity and attach relation accessors to the result.
    pub async fn create(
        &self,
        identifier: &EntityIdentifier,
        attributes: serde_json::Map<String, Value>,
        options: &EntityOptions,
        adapter_key: Option<&str>,
    ) -> Result<EntityHandle> {
        let loader = self.entity(identifier, adapter_key)?;
        let record = loader.create(attributes, options).await?;
        Ok(attach_relations(record, self, identifier.clone(), adapter_key))
    }

    /// Update an entity and attach relation accessors to the result.
    pub async fn update(
        &self,
        identifier: &EntityIdentifier,
        id: &str,
        attributes: serde_json::Map<String, Value>,
        options: &EntityOptions,
        adapter_key: Option<&str>,
    ) -> Result<EntityHandle> {
        let loader = self.entity(identifier, adapter_key)?;
        let record = loader.update(id, attributes, options).await?;
        Ok(attach_relations(record, self, identifier.clone(), adapter_key))
    }

    /// Delete an entity.
    pub async fn delete(
        &self,
        identifier: &EntityIdentifier,
        id: &str,
        options: &EntityOptions,
        adapter_key: Option<&str>,
    ) -> Result<()> {
        let loader = self.entity(identifier, adapter_key)?;
        loader.delete(id, options).await
    }

    fn wrap_all(
        &self,
        records: Vec<EntityRecord>,
        identifier: &EntityIdentifier,
        adapter_key: Option<&str>,
    ) -> Vec<EntityHandle> {
        records
            .into_iter()
            .map(|record| attach_relations(record, self, identifier.clone(), adapter_key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{AdapterCapabilities, EntityAdapter};
    use async_trait::async_trait;
    use drupal_transport::{Method, MockTransport};
    use serde_json::json;

    fn service_with(mock: Arc<MockTransport>) -> EntityService {
        EntityService::new(mock)
    }

    fn article() -> EntityIdentifier {
        EntityIdentifier::new("node", "article")
    }

    /// Adapter that only implements `load` and `list`.
    struct ListOnlyAdapter {
        context: AdapterContext,
    }

    #[async_trait]
    impl EntityAdapter for ListOnlyAdapter {
        fn key(&self) -> &str {
            "list-only"
        }

        fn capabilities(&self) -> AdapterCapabilities {
            AdapterCapabilities {
                list: true,
                ..Default::default()
            }
        }

        async fn load(&self, id: &str, _options: &EntityOptions) -> Result<EntityRecord> {
            Ok(EntityRecord {
                id: id.to_string(),
                kind: self.context.id.type_name(),
                ..Default::default()
            })
        }

        async fn list(&self, _options: &EntityOptions) -> Result<Vec<EntityRecord>> {
            Ok(vec![
                EntityRecord {
                    id: "1".into(),
                    kind: self.context.id.type_name(),
                    ..Default::default()
                },
                EntityRecord {
                    id: "2".into(),
                    kind: self.context.id.type_name(),
                    ..Default::default()
                },
            ])
        }
    }

    fn list_only_factory() -> AdapterFactory {
        Arc::new(|context| Arc::new(ListOnlyAdapter { context }) as Arc<dyn EntityAdapter>)
    }

    #[tokio::test]
    async fn test_load_end_to_end() {
        let mock = Arc::new(MockTransport::new().with_response(
            Method::Get,
            "/jsonapi/node/article/42",
            json!({ "data": { "id": "42", "type": "node--article", "attributes": { "title": "Hi" } } }),
        ));
        let service = service_with(mock);
        service.register_adapter("jsonapi", JsonApiAdapter::factory());

        let handle = service
            .load(&article(), "42", &EntityOptions::default(), None)
            .await
            .unwrap();
        assert_eq!(handle.id, "42");
        assert_eq!(handle.kind, "node--article");
        assert_eq!(handle.attributes["title"], "Hi");
    }

    #[tokio::test]
    async fn test_unknown_adapter_key_fails() {
        let service = service_with(Arc::new(MockTransport::new()));

        let error = service.entity(&article(), Some("bogus")).unwrap_err();
        match error {
            EntityError::UnknownAdapter(key) => assert_eq!(key, "bogus"),
            other => panic!("expected UnknownAdapter, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_default_adapter_key_is_used() {
        let service = service_with(Arc::new(MockTransport::new()));
        service.set_default_adapter("missing");

        let error = service.entity(&article(), None).unwrap_err();
        assert!(matches!(error, EntityError::UnknownAdapter(key) if key == "missing"));
    }

    #[tokio::test]
    async fn test_register_replaces_silently() {
        let service = service_with(Arc::new(MockTransport::new()));
        service
            .register_adapter("x", list_only_factory())
            .register_adapter("x", JsonApiAdapter::factory());

        let loader = service.entity(&article(), Some("x")).unwrap();
        assert!(loader.capabilities().count);
    }

    #[tokio::test]
    async fn test_list_page_degrades_to_list() {
        let service = service_with(Arc::new(MockTransport::new()));
        service.register_adapter("list-only", list_only_factory());

        let page = service
            .list_page(&article(), &EntityOptions::default(), Some("list-only"))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.page.is_none());
    }

    #[tokio::test]
    async fn test_count_has_no_fallback() {
        let service = service_with(Arc::new(MockTransport::new()));
        service.register_adapter("list-only", list_only_factory());

        let error = service
            .count(&article(), &EntityOptions::default(), Some("list-only"))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            EntityError::Unsupported { operation: "count", .. }
        ));
    }

    #[tokio::test]
    async fn test_loader_debug_names_adapter() {
        let service = service_with(Arc::new(MockTransport::new()));
        let loader = service.entity(&article(), None).unwrap();
        let rendered = format!("{:?}", loader);
        assert!(rendered.contains("EntityLoader"));
        assert!(rendered.contains("jsonapi"));
    }

    #[tokio::test]
    async fn test_base_path_convention() {
        let mock = Arc::new(MockTransport::new());
        let service = service_with(Arc::clone(&mock));

        let _ = service
            .load(
                &EntityIdentifier::new("taxonomy_term", "tags"),
                "5",
                &EntityOptions::default(),
                None,
            )
            .await
            .unwrap();

        assert_eq!(mock.last_call().unwrap().path, "/jsonapi/taxonomy_term/tags/5");
    }

    #[tokio::test]
    async fn test_config_bag_reaches_adapter_context() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let seen = Arc::new(AtomicBool::new(false));
        let seen_probe = Arc::clone(&seen);
        let probe: AdapterFactory = Arc::new(move |context| {
            if let Some(config) = &context.config {
                if config.get_str("flavor").as_deref() == Some("headless") {
                    seen_probe.store(true, Ordering::SeqCst);
                }
            }
            Arc::new(ListOnlyAdapter { context }) as Arc<dyn EntityAdapter>
        });

        let config = Arc::new(ConfigBag::new());
        config.set("flavor", json!("headless"));
        let service = EntityService::with_config(Arc::new(MockTransport::new()), config);
        service.register_adapter("probe", probe);

        let _ = service.entity(&article(), Some("probe")).unwrap();
        assert!(seen.load(Ordering::SeqCst));
    }
}

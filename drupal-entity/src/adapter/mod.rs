//! The entity adapter contract.
//!
//! An adapter converts a load/list/count/page request for one entity
//! identifier into transport calls and normalizes the raw payload into
//! [`EntityRecord`]s. The JSON:API adapter in [`jsonapi`] is the reference
//! implementation; the trait leaves room for GraphQL or custom REST
//! backends.
//!
//! Only `load` is required. Every other operation is an explicit capability:
//! adapters advertise what they implement through
//! [`AdapterCapabilities`], and the [`EntityLoader`] checks the flag before
//! delegating so a missing capability fails with a distinguishing error
//! instead of looking like an empty result.

pub mod jsonapi;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use drupal_transport::Transport;

use crate::config::ConfigBag;
use crate::error::{EntityError, Result};
use crate::types::{EntityIdentifier, EntityOptions, EntityPageInfo, EntityRecord};

/// Context handed to an adapter factory, fresh per `entity()` call.
///
/// Owned exclusively by the adapter built from it; never shared or mutated
/// after construction.
pub struct AdapterContext {
    /// The entity/bundle this adapter instance targets.
    pub id: EntityIdentifier,
    /// Resource base path, `/jsonapi/{entity}/{bundle}`.
    pub base_path: String,
    /// Transport used for all calls.
    pub client: Arc<dyn Transport>,
    /// Optional configuration bag for adapter-specific settings.
    pub config: Option<Arc<ConfigBag>>,
}

/// What an adapter implements beyond the required `load`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterCapabilities {
    /// `list()` is implemented.
    pub list: bool,
    /// `count()` is implemented.
    pub count: bool,
    /// `list_page()` is implemented.
    pub list_page: bool,
    /// `create()`/`update()`/`delete()` are implemented.
    pub write: bool,
}

impl AdapterCapabilities {
    /// All capabilities present.
    pub fn full() -> Self {
        Self {
            list: true,
            count: true,
            list_page: true,
            write: true,
        }
    }
}

/// Backend protocol adapter for one entity identifier.
///
/// Default method bodies return the same unsupported error the loader gate
/// produces, so a direct trait call and a gated call fail identically.
#[async_trait]
pub trait EntityAdapter: Send + Sync {
    /// The registry key this adapter answers to, e.g. `"jsonapi"`.
    fn key(&self) -> &str;

    /// Capabilities beyond `load`.
    fn capabilities(&self) -> AdapterCapabilities;

    /// Load one entity by id. Fails on transport errors or when the entity
    /// does not exist (adapter-defined).
    async fn load(&self, id: &str, options: &EntityOptions) -> Result<EntityRecord>;

    /// List entities.
    async fn list(&self, _options: &EntityOptions) -> Result<Vec<EntityRecord>> {
        Err(EntityError::unsupported(self.key(), "list"))
    }

    /// Count entities.
    async fn count(&self, _options: &EntityOptions) -> Result<u64> {
        Err(EntityError::unsupported(self.key(), "count"))
    }

    /// List one page of entities with pagination metadata.
    async fn list_page(
        &self,
        _options: &EntityOptions,
    ) -> Result<(Vec<EntityRecord>, Option<EntityPageInfo>)> {
        Err(EntityError::unsupported(self.key(), "list_page"))
    }

    /// Create an entity from attributes.
    async fn create(
        &self,
        _attributes: serde_json::Map<String, Value>,
        _options: &EntityOptions,
    ) -> Result<EntityRecord> {
        Err(EntityError::unsupported(self.key(), "create"))
    }

    /// Update an entity's attributes.
    async fn update(
        &self,
        _id: &str,
        _attributes: serde_json::Map<String, Value>,
        _options: &EntityOptions,
    ) -> Result<EntityRecord> {
        Err(EntityError::unsupported(self.key(), "update"))
    }

    /// Delete an entity by id.
    async fn delete(&self, _id: &str, _options: &EntityOptions) -> Result<()> {
        Err(EntityError::unsupported(self.key(), "delete"))
    }
}

/// Factory building an adapter instance from a fresh context.
pub type AdapterFactory = Arc<dyn Fn(AdapterContext) -> Arc<dyn EntityAdapter> + Send + Sync>;

/// An adapter bound to one entity identifier, with capability gating.
///
/// The loader is where "the adapter does not implement this" becomes a
/// typed failure; adapters themselves never get asked for operations they
/// did not advertise.
pub struct EntityLoader {
    identifier: EntityIdentifier,
    adapter: Arc<dyn EntityAdapter>,
}

impl std::fmt::Debug for EntityLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityLoader")
            .field("identifier", &self.identifier)
            .field("adapter", &self.adapter.key())
            .finish()
    }
}

impl EntityLoader {
    pub(crate) fn new(identifier: EntityIdentifier, adapter: Arc<dyn EntityAdapter>) -> Self {
        Self {
            identifier,
            adapter,
        }
    }

    /// The identifier this loader targets.
    pub fn identifier(&self) -> &EntityIdentifier {
        &self.identifier
    }

    /// The underlying adapter's capabilities.
    pub fn capabilities(&self) -> AdapterCapabilities {
        self.adapter.capabilities()
    }

    fn require(&self, present: bool, operation: &'static str) -> Result<()> {
        if present {
            Ok(())
        } else {
            Err(EntityError::unsupported(self.adapter.key(), operation))
        }
    }

    /// Load one entity by id.
    pub async fn load(&self, id: &str, options: &EntityOptions) -> Result<EntityRecord> {
        self.adapter.load(id, options).await
    }

    /// List entities; fails if the adapter lacks the capability.
    pub async fn list(&self, options: &EntityOptions) -> Result<Vec<EntityRecord>> {
        self.require(self.capabilities().list, "list")?;
        self.adapter.list(options).await
    }

    /// Count entities; fails if the adapter lacks the capability.
    pub async fn count(&self, options: &EntityOptions) -> Result<u64> {
        self.require(self.capabilities().count, "count")?;
        self.adapter.count(options).await
    }

    /// List one page; fails if the adapter lacks the capability.
    pub async fn list_page(
        &self,
        options: &EntityOptions,
    ) -> Result<(Vec<EntityRecord>, Option<EntityPageInfo>)> {
        self.require(self.capabilities().list_page, "list_page")?;
        self.adapter.list_page(options).await
    }

    /// Create an entity; fails if the adapter lacks write support.
    pub async fn create(
        &self,
        attributes: serde_json::Map<String, Value>,
        options: &EntityOptions,
    ) -> Result<EntityRecord> {
        self.require(self.capabilities().write, "create")?;
        self.adapter.create(attributes, options).await
    }

    /// Update an entity; fails if the adapter lacks write support.
    pub async fn update(
        &self,
        id: &str,
        attributes: serde_json::Map<String, Value>,
        options: &EntityOptions,
    ) -> Result<EntityRecord> {
        self.require(self.capabilities().write, "update")?;
        self.adapter.update(id, attributes, options).await
    }

    /// Delete an entity; fails if the adapter lacks write support.
    pub async fn delete(&self, id: &str, options: &EntityOptions) -> Result<()> {
        self.require(self.capabilities().write, "delete")?;
        self.adapter.delete(id, options).await
    }
}

//! Entity query and relationship resolution for Drupal-style JSON:API
//! backends.
//!
//! Provides the entity side of the CMS client SDK:
//! - Pluggable backend adapters behind a registry ([`EntityService`])
//! - A fluent query builder rendering JSON:API parameters ([`FluentEntity`],
//!   [`EntityQuery`])
//! - Lazy relationship resolution with in-flight request coalescing
//!   ([`EntityHandle::rel`])
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              FluentEntity                │
//! │   (chainable query construction)         │
//! └────────────────┬─────────────────────────┘
//!                  │ flat param map
//! ┌────────────────▼─────────────────────────┐
//! │             EntityService                │
//! │  (adapter registry + dispatch + cache)   │
//! └───────┬─────────────────────────┬────────┘
//!         ▼                         ▼
//! ┌──────────────┐          ┌──────────────┐
//! │ EntityAdapter│          │ EntityHandle │
//! │  (JSON:API)  │          │  .rel(name)  │
//! └──────┬───────┘          └──────────────┘
//!        ▼
//! ┌──────────────┐
//! │  Transport   │  (drupal-transport)
//! └──────────────┘
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod fluent;
pub mod params;
pub mod query;
pub mod relation;
pub mod service;
pub mod types;

// Re-export main types for convenience
pub use adapter::jsonapi::{JsonApiAdapter, JSONAPI_ADAPTER_KEY};
pub use adapter::{
    AdapterCapabilities, AdapterContext, AdapterFactory, EntityAdapter, EntityLoader,
};
pub use config::ConfigBag;
pub use error::EntityError;
pub use fluent::FluentEntity;
pub use params::{to_wire_params, ParamMap};
pub use query::{EntityQuery, FilterCondition, PageOptions, QueryFragment, SortDirection};
pub use relation::{attach_relations, EntityHandle, RelationProxy};
pub use service::EntityService;
pub use types::{
    EntityIdentifier, EntityOptions, EntityPage, EntityPageInfo, EntityRecord, JsonApiOptions,
};

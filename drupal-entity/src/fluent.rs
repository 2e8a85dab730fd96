//! Chainable query façade over [`EntityService`] and [`EntityQuery`].

use serde_json::Value;
use tracing::debug;

use crate::error::{EntityError, Result};
use crate::params::{merge_into, ParamMap};
use crate::query::{EntityQuery, PageOptions, QueryFragment, SortDirection};
use crate::relation::EntityHandle;
use crate::service::EntityService;
use crate::types::{EntityIdentifier, EntityOptions, EntityPage, JsonApiOptions};

/// Builder-pattern façade for querying one entity/bundle.
///
/// Mutators chain by value; terminal operations borrow, so one configured
/// builder can serve several calls. Query state merges into per-call
/// options with a fixed precedence, highest last: the caller's effective
/// query, then the `params()`/`from_params()` bag, then this builder's own
/// rendered state.
///
/// ```rust,no_run
/// # use drupal_entity::{EntityIdentifier, EntityService, FluentEntity, SortDirection};
/// # async fn example(service: EntityService) -> Result<(), drupal_entity::EntityError> {
/// let articles = FluentEntity::new(service, EntityIdentifier::new("node", "article"))
///     .where_eq("status", 1)
///     .sort("created", SortDirection::Desc)
///     .include(["field_tags"])
///     .list()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct FluentEntity {
    service: EntityService,
    identifier: EntityIdentifier,
    adapter_key: Option<String>,
    query: EntityQuery,
    extra: ParamMap,
    target_id: Option<String>,
}

impl FluentEntity {
    /// Start a query against one entity/bundle.
    pub fn new(service: EntityService, identifier: EntityIdentifier) -> Self {
        Self {
            service,
            identifier,
            adapter_key: None,
            query: EntityQuery::new(),
            extra: ParamMap::new(),
            target_id: None,
        }
    }

    /// Route terminal operations through a specific adapter key.
    pub fn adapter(mut self, key: impl Into<String>) -> Self {
        self.adapter_key = Some(key.into());
        self
    }

    /// Select fields for this builder's own resource type.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let type_name = self.identifier.type_name();
        self.query.select_fields(type_name, fields);
        self
    }

    /// Select fields for an arbitrary resource type.
    pub fn select_for<I, S>(mut self, type_name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.select_fields(type_name, fields);
        self
    }

    /// Append include paths.
    pub fn include<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.include(paths);
        self
    }

    /// Append a sort key.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort(field, direction);
        self
    }

    /// Shallow-merge pagination options.
    pub fn page(mut self, page: PageOptions) -> Self {
        self.query.page(page);
        self
    }

    /// Shallow-merge arbitrary extra parameters.
    pub fn params(mut self, params: ParamMap) -> Self {
        merge_into(&mut self.extra, &params);
        self
    }

    /// Merge another builder's rendered query parameters.
    pub fn from_params(mut self, fragment: &dyn QueryFragment) -> Self {
        merge_into(&mut self.extra, &fragment.query_object());
        self
    }

    /// Filter on equality.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.where_eq(field, value);
        self
    }

    /// Filter on substring containment.
    pub fn where_contains(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.where_contains(field, value);
        self
    }

    /// Filter on membership in a value set.
    pub fn where_in<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.query.where_in(field, values);
        self
    }

    /// Filter on an inclusive range.
    pub fn where_range(
        mut self,
        field: impl Into<String>,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Self {
        self.query.where_range(field, min, max);
        self
    }

    /// Set the single-entity target for [`FluentEntity::get`].
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.target_id = Some(id.into());
        self
    }

    /// Merge caller options, the extra-params bag and a rendered query into
    /// the options handed to the service, in ascending precedence.
    fn merged_options(&self, options: &EntityOptions, rendered: ParamMap) -> EntityOptions {
        let mut query = options.effective_query().clone();
        merge_into(&mut query, &self.extra);
        merge_into(&mut query, &rendered);
        EntityOptions {
            params: options.params.clone(),
            jsonapi: Some(JsonApiOptions { query }),
        }
    }

    /// List matching entities.
    pub async fn list(&self) -> Result<Vec<EntityHandle>> {
        self.list_with(&EntityOptions::default()).await
    }

    /// List matching entities with explicit per-call options.
    pub async fn list_with(&self, options: &EntityOptions) -> Result<Vec<EntityHandle>> {
        let merged = self.merged_options(options, self.query.to_object());
        self.service
            .list(&self.identifier, &merged, self.adapter_key.as_deref())
            .await
    }

    /// Load the entity targeted by [`FluentEntity::id`].
    pub async fn get(&self) -> Result<EntityHandle> {
        self.get_with(&EntityOptions::default()).await
    }

    /// Load the targeted entity with explicit per-call options.
    pub async fn get_with(&self, options: &EntityOptions) -> Result<EntityHandle> {
        let id = self.target_id.as_deref().ok_or(EntityError::MissingId)?;
        let merged = self.merged_options(options, self.query.to_object());
        self.service
            .load(&self.identifier, id, &merged, self.adapter_key.as_deref())
            .await
    }

    /// Return the first match, or `None` for an empty result set.
    ///
    /// Forces `page[limit]=1` for this call only; the builder's own page
    /// state is untouched.
    pub async fn find_one(&self) -> Result<Option<EntityHandle>> {
        self.find_one_with(&EntityOptions::default()).await
    }

    /// [`FluentEntity::find_one`] with explicit per-call options.
    pub async fn find_one_with(&self, options: &EntityOptions) -> Result<Option<EntityHandle>> {
        let mut query = self.query.clone();
        query.page(PageOptions::limit(1));
        let merged = self.merged_options(options, query.to_object());
        let mut items = self
            .service
            .list(&self.identifier, &merged, self.adapter_key.as_deref())
            .await?;
        Ok(if items.is_empty() {
            None
        } else {
            Some(items.remove(0))
        })
    }

    /// Count matching entities.
    ///
    /// Prefers the service's dedicated count; on any failure — including a
    /// missing capability — falls back to listing and taking the length.
    pub async fn count(&self) -> Result<u64> {
        self.count_with(&EntityOptions::default()).await
    }

    /// [`FluentEntity::count`] with explicit per-call options.
    pub async fn count_with(&self, options: &EntityOptions) -> Result<u64> {
        let merged = self.merged_options(options, self.query.to_object());
        match self
            .service
            .count(&self.identifier, &merged, self.adapter_key.as_deref())
            .await
        {
            Ok(count) => Ok(count),
            Err(error) => {
                debug!(
                    target: "drupal_entity",
                    identifier = %self.identifier, %error,
                    "count unavailable, falling back to list().len()"
                );
                let items = self
                    .service
                    .list(&self.identifier, &merged, self.adapter_key.as_deref())
                    .await?;
                Ok(items.len() as u64)
            }
        }
    }

    /// List one page of matching entities.
    pub async fn list_page(&self) -> Result<EntityPage> {
        self.list_page_with(&EntityOptions::default()).await
    }

    /// [`FluentEntity::list_page`] with explicit per-call options.
    pub async fn list_page_with(&self, options: &EntityOptions) -> Result<EntityPage> {
        let merged = self.merged_options(options, self.query.to_object());
        self.service
            .list_page(&self.identifier, &merged, self.adapter_key.as_deref())
            .await
    }
}

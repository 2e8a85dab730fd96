//! Accumulating query state and its flat JSON:API rendering.

use serde_json::Value;

use crate::params::{element_string, ParamMap};

/// Sort direction for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One accumulated sort key.
#[derive(Debug, Clone)]
struct SortKey {
    field: String,
    direction: SortDirection,
}

/// One accumulated filter predicate.
#[derive(Debug, Clone)]
pub struct FilterCondition {
    /// Field path the condition applies to.
    pub path: String,
    /// Backend operator; omitted means the backend default (equality).
    pub operator: Option<String>,
    /// Condition value; arrays comma-join on rendering.
    pub value: Value,
}

/// Pagination options, shallow-merged on each `page()` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageOptions {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub number: Option<u64>,
}

impl PageOptions {
    /// Page options setting only the limit.
    pub fn limit(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    /// Page options setting only the offset.
    pub fn offset(offset: u64) -> Self {
        Self {
            offset: Some(offset),
            ..Default::default()
        }
    }

    /// Page options setting only the page number.
    pub fn number(number: u64) -> Self {
        Self {
            number: Some(number),
            ..Default::default()
        }
    }

    fn merge(&mut self, other: PageOptions) {
        if other.limit.is_some() {
            self.limit = other.limit;
        }
        if other.offset.is_some() {
            self.offset = other.offset;
        }
        if other.number.is_some() {
            self.number = other.number;
        }
    }
}

/// Anything that can contribute a flat query parameter map.
///
/// External builders plug into [`crate::FluentEntity::from_params`] through
/// this trait.
pub trait QueryFragment {
    /// Render the fragment's accumulated state as a flat parameter map.
    fn query_object(&self) -> ParamMap;
}

/// Accumulates selection, inclusion, sorting, pagination and filtering
/// state and renders it into a flat JSON:API parameter map.
///
/// Rendering is a pure function of the accumulated state: calling
/// [`EntityQuery::to_object`] twice without intervening mutation yields
/// equal maps.
#[derive(Debug, Clone, Default)]
pub struct EntityQuery {
    includes: Vec<String>,
    fields: Vec<(String, Vec<String>)>,
    sorts: Vec<SortKey>,
    page: PageOptions,
    filters: Vec<FilterCondition>,
}

impl EntityQuery {
    /// Create an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append include paths.
    pub fn include<I, S>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Set the selected fields for a resource type. Repeated calls for the
    /// same type replace the field list but keep the type's original
    /// position.
    pub fn select_fields<I, S>(&mut self, type_name: impl Into<String>, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let type_name = type_name.into();
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        match self.fields.iter_mut().find(|(t, _)| *t == type_name) {
            Some(entry) => entry.1 = fields,
            None => self.fields.push((type_name, fields)),
        }
        self
    }

    /// Append a sort key. Duplicates are allowed and preserved in order.
    pub fn sort(&mut self, field: impl Into<String>, direction: SortDirection) -> &mut Self {
        self.sorts.push(SortKey {
            field: field.into(),
            direction,
        });
        self
    }

    /// Shallow-merge pagination options; the last value per key wins.
    pub fn page(&mut self, page: PageOptions) -> &mut Self {
        self.page.merge(page);
        self
    }

    /// Append a raw filter condition.
    pub fn filter(&mut self, condition: FilterCondition) -> &mut Self {
        self.filters.push(condition);
        self
    }

    /// Filter on equality (backend default operator).
    pub fn where_eq(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.filter(FilterCondition {
            path: field.into(),
            operator: None,
            value: value.into(),
        })
    }

    /// Filter on substring containment.
    pub fn where_contains(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.filter(FilterCondition {
            path: field.into(),
            operator: Some("CONTAINS".to_string()),
            value: value.into(),
        })
    }

    /// Filter on membership in a value set.
    pub fn where_in<I, V>(&mut self, field: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filter(FilterCondition {
            path: field.into(),
            operator: Some("IN".to_string()),
            value: Value::Array(values.into_iter().map(Into::into).collect()),
        })
    }

    /// Filter on an inclusive range.
    pub fn where_range(
        &mut self,
        field: impl Into<String>,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> &mut Self {
        self.filter(FilterCondition {
            path: field.into(),
            operator: Some("BETWEEN".to_string()),
            value: Value::Array(vec![min.into(), max.into()]),
        })
    }

    /// Render the accumulated state as a flat JSON:API parameter map.
    pub fn to_object(&self) -> ParamMap {
        let mut out = ParamMap::new();

        if !self.includes.is_empty() {
            out.insert(
                "include".to_string(),
                Value::String(self.includes.join(",")),
            );
        }

        for (type_name, fields) in &self.fields {
            out.insert(
                format!("fields[{}]", type_name),
                Value::String(fields.join(",")),
            );
        }

        if !self.sorts.is_empty() {
            let rendered: Vec<String> = self
                .sorts
                .iter()
                .map(|key| match key.direction {
                    SortDirection::Asc => key.field.clone(),
                    SortDirection::Desc => format!("-{}", key.field),
                })
                .collect();
            out.insert("sort".to_string(), Value::String(rendered.join(",")));
        }

        if let Some(limit) = self.page.limit {
            out.insert("page[limit]".to_string(), limit.into());
        }
        if let Some(offset) = self.page.offset {
            out.insert("page[offset]".to_string(), offset.into());
        }
        if let Some(number) = self.page.number {
            out.insert("page[number]".to_string(), number.into());
        }

        // Filters are indexed by insertion order, not field name, so the
        // same field can appear in several conditions.
        for (index, filter) in self.filters.iter().enumerate() {
            out.insert(
                format!("filter[{}][condition][path]", index),
                Value::String(filter.path.clone()),
            );
            if let Some(operator) = &filter.operator {
                out.insert(
                    format!("filter[{}][condition][operator]", index),
                    Value::String(operator.clone()),
                );
            }
            let value = match &filter.value {
                Value::Array(items) => Value::String(
                    items
                        .iter()
                        .map(element_string)
                        .collect::<Vec<_>>()
                        .join(","),
                ),
                other => other.clone(),
            };
            out.insert(format!("filter[{}][condition][value]", index), value);
        }

        out
    }
}

impl QueryFragment for EntityQuery {
    fn query_object(&self) -> ParamMap {
        self.to_object()
    }
}

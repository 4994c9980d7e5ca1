//! Filter stage predicates
//!
//! A record passes the filter stage when it matches the free-text search and
//! every active field filter. Both halves are plain `Predicate<Record>`s so
//! stores and hosts can combine them with their own predicates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::traits::Predicate;
use tabula_api::{Record, Value};

/// Value of one active field filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Field must equal one of the values
    AnyOf(Vec<Value>),
    /// Field must equal the value
    Eq(Value),
}

impl FilterValue {
    /// Interpret a raw value as a filter.
    ///
    /// Null and the empty string mean "no filter" and yield `None`. Arrays
    /// become membership filters.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::Array(values) => Some(FilterValue::AnyOf(values)),
            other => Some(FilterValue::Eq(other)),
        }
    }

    /// A missing field never matches
    pub fn matches(&self, field: Option<&Value>) -> bool {
        let Some(field) = field else {
            return false;
        };
        match self {
            FilterValue::Eq(expected) => field.loose_eq(expected),
            FilterValue::AnyOf(values) => values.iter().any(|v| field.loose_eq(v)),
        }
    }
}

impl From<FilterValue> for Value {
    fn from(filter: FilterValue) -> Self {
        match filter {
            FilterValue::Eq(v) => v,
            FilterValue::AnyOf(values) => Value::Array(values),
        }
    }
}

/// Active filters keyed by field name. Ordered so views and logs are stable.
pub type FilterMap = BTreeMap<String, FilterValue>;

/// Case-insensitive substring match over a fixed set of fields.
///
/// An empty needle or an empty field list matches everything.
pub struct SearchPredicate<'a> {
    needle: String,
    fields: &'a [String],
}

impl<'a> SearchPredicate<'a> {
    pub fn new(query: &str, fields: &'a [String]) -> Self {
        Self {
            needle: query.to_lowercase(),
            fields,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.needle.is_empty() && !self.fields.is_empty()
    }
}

impl Predicate<Record> for SearchPredicate<'_> {
    fn test(&self, record: &Record) -> bool {
        if !self.is_active() {
            return true;
        }
        self.fields.iter().any(|field| {
            record
                .get(field)
                .map(|v| v.search_text().to_lowercase().contains(&self.needle))
                .unwrap_or(false)
        })
    }
}

/// Conjunction of every entry in a `FilterMap`
pub struct FieldFilter<'a> {
    filters: &'a FilterMap,
}

impl<'a> FieldFilter<'a> {
    pub fn new(filters: &'a FilterMap) -> Self {
        Self { filters }
    }
}

impl Predicate<Record> for FieldFilter<'_> {
    fn test(&self, record: &Record) -> bool {
        self.filters
            .iter()
            .all(|(field, filter)| filter.matches(record.get(field)))
    }
}

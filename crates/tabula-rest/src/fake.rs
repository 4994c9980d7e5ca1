//! In-memory backend for tests and offline mode
//!
//! `FakeResource<T>` behaves like a json-server collection: ids are assigned
//! on create, query parameters are matched against the entity's wire fields
//! and `q` does a case-insensitive substring search. Drafts and patches are
//! validated the same way `RestResource` validates them.

use async_trait::async_trait;
use serde_json::Value as Json;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use tabula::core::{to_record, FilterValue};
use tabula_api::{ApiError, FetchParams, Record, Value};
use tabula_core::{CrudOperations, DataSource, Resource, Result, Validate};

/// Query parameter handled as full-text search
pub const SEARCH_PARAM: &str = "q";

pub struct FakeResource<T: Resource> {
    items: RwLock<Vec<T>>,
    next_id: AtomicI64,
    fail_next: Mutex<Option<ApiError>>,
    calls: AtomicUsize,
}

impl<T: Resource> Default for FakeResource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> FakeResource<T> {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Seeded collection; new ids continue after the largest seeded id
    pub fn with_items(items: Vec<T>) -> Self {
        let max_id = items.iter().map(|item| item.id()).max().unwrap_or(0);
        Self {
            items: RwLock::new(items),
            next_id: AtomicI64::new(max_id + 1),
            fail_next: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make the next backend call fail with `error`
    pub async fn fail_next(&self, error: ApiError) {
        *self.fail_next.lock().await = Some(error);
    }

    /// Number of backend calls made so far, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Vec<T> {
        self.items.read().await.clone()
    }

    async fn enter(&self, operation: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!("[FakeResource] {} {}", operation, T::entity_name());
        match self.fail_next.lock().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn not_found(id: i64) -> ApiError {
        ApiError::NotFound {
            entity: T::short_name().to_string(),
            id: id.to_string(),
        }
    }
}

/// Entity `T` from a serializable payload plus an explicit id
fn with_id<T: Resource, P: serde::Serialize>(payload: &P, id: i64) -> Result<T> {
    let mut json = to_json(payload)?;
    if let Json::Object(obj) = &mut json {
        obj.insert("id".to_string(), Json::from(id));
    }
    from_json(json)
}

fn to_json<P: serde::Serialize + ?Sized>(payload: &P) -> Result<Json> {
    serde_json::to_value(payload)
        .map_err(|e| ApiError::internal(format!("Failed to serialize payload: {}", e)))
}

fn from_json<T: Resource>(json: Json) -> Result<T> {
    serde_json::from_value(json)
        .map_err(|e| ApiError::internal(format!("Failed to build {}: {}", T::short_name(), e)))
}

/// Overlay the non-null fields of `patch` onto `base`
fn merge(base: &mut Json, patch: Json) {
    if let (Json::Object(base), Json::Object(patch)) = (base, patch) {
        for (key, value) in patch {
            if !value.is_null() {
                base.insert(key, value);
            }
        }
    }
}

fn matches_params(record: &Record, params: &FetchParams) -> bool {
    params.iter().all(|(key, value)| {
        if key == SEARCH_PARAM {
            let needle = value.search_text().to_lowercase();
            return needle.is_empty()
                || record.values().any(|field| {
                    !matches!(field, Value::Object(_))
                        && field.search_text().to_lowercase().contains(&needle)
                });
        }
        match FilterValue::from_value(value.clone()) {
            Some(filter) => filter.matches(record.get(key)),
            None => true,
        }
    })
}

#[async_trait]
impl<T: Resource> DataSource<T> for FakeResource<T> {
    async fn query(&self, params: &FetchParams) -> Result<Vec<T>> {
        self.enter("query").await?;
        let items = self.items.read().await;

        let mut found = Vec::new();
        for item in items.iter() {
            if matches_params(&to_record(item)?, params) {
                found.push(item.clone());
            }
        }
        Ok(found)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<T>> {
        self.enter("get_by_id").await?;
        let items = self.items.read().await;
        Ok(items.iter().find(|item| item.id() == id).cloned())
    }
}

#[async_trait]
impl<T: Resource> CrudOperations<T> for FakeResource<T> {
    async fn create(&self, draft: T::Draft) -> Result<T> {
        self.enter("create").await?;
        draft.validate()?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let created: T = with_id(&draft, id)?;
        self.items.write().await.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, draft: T::Draft) -> Result<T> {
        self.enter("update").await?;
        draft.validate()?;

        let mut items = self.items.write().await;
        let slot = items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        *slot = with_id(&draft, id)?;
        Ok(slot.clone())
    }

    async fn patch(&self, id: i64, patch: T::Patch) -> Result<T> {
        self.enter("patch").await?;
        patch.validate()?;

        let mut items = self.items.write().await;
        let slot = items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| Self::not_found(id))?;

        let mut json = to_json(&*slot)?;
        merge(&mut json, to_json(&patch)?);
        *slot = from_json(json)?;
        Ok(slot.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.enter("delete").await?;

        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.id() != id);
        if items.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

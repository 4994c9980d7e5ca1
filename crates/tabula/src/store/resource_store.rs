use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::core::traits::Predicate;
use tabula_api::{ApiError, FetchParams, Value};
use tabula_core::{Resource, ResourceBackend, Result};

/// Default time a fetched list stays fresh
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Cached working set of one resource.
///
/// Every remote operation sets the loading flag, clears the previous error,
/// records a new error on failure and hands it back to the caller. Successful
/// writes are applied to the cache using the server's copy of the entity.
pub struct ResourceStore<T: Resource> {
    backend: Arc<dyn ResourceBackend<T>>,
    items: Vec<T>,
    current: Option<T>,
    loading: bool,
    error: Option<ApiError>,
    last_fetch: Option<DateTime<Utc>>,
    ttl: Duration,
}

impl<T: Resource> ResourceStore<T> {
    pub fn new(backend: Arc<dyn ResourceBackend<T>>) -> Self {
        Self {
            backend,
            items: Vec::new(),
            current: None,
            loading: false,
            error: None,
            last_fetch: None,
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Entity most recently fetched, created or updated on its own
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }

    /// True when the list was never fetched or is older than the TTL
    pub fn is_stale(&self) -> bool {
        match self.last_fetch {
            None => true,
            Some(at) => (Utc::now() - at)
                .to_std()
                .map(|age| age > self.ttl)
                .unwrap_or(false),
        }
    }

    /// Replace the cached list with a fresh copy from the backend
    pub async fn fetch_all(&mut self) -> Result<usize> {
        self.begin();
        let result = self.backend.get_all().await;
        let items = self.finish(result, "fetch_all")?;

        self.items = items;
        self.last_fetch = Some(Utc::now());
        info!("Fetched {} {}", self.items.len(), T::entity_name());
        Ok(self.items.len())
    }

    /// `fetch_all` unless the cache is still fresh. Returns whether it fetched.
    pub async fn fetch_if_stale(&mut self) -> Result<bool> {
        if !self.is_stale() {
            debug!("{} cache is fresh, skipping fetch", T::entity_name());
            return Ok(false);
        }
        self.fetch_all().await?;
        Ok(true)
    }

    /// Fetch one entity and upsert it into the cache
    pub async fn fetch_one(&mut self, id: i64) -> Result<Option<T>> {
        self.begin();
        let result = self.backend.get_by_id(id).await;
        let found = self.finish(result, "fetch_one")?;

        if let Some(item) = &found {
            self.upsert(item.clone());
            self.current = Some(item.clone());
        }
        Ok(found)
    }

    /// Query the backend and merge the results into the cache without
    /// dropping entities that were not returned
    pub async fn fetch_where(&mut self, params: FetchParams) -> Result<Vec<T>> {
        self.begin();
        let result = self.backend.query(&params).await;
        let found = self.finish(result, "fetch_where")?;

        for item in &found {
            self.upsert(item.clone());
        }
        Ok(found)
    }

    pub async fn create(&mut self, draft: T::Draft) -> Result<T> {
        self.begin();
        let result = self.backend.create(draft).await;
        let created = self.finish(result, "create")?;

        info!("Created {} {}", T::short_name(), created.id());
        self.items.push(created.clone());
        self.current = Some(created.clone());
        Ok(created)
    }

    pub async fn update(&mut self, id: i64, draft: T::Draft) -> Result<T> {
        self.begin();
        let result = self.backend.update(id, draft).await;
        let updated = self.finish(result, "update")?;
        self.replace(id, &updated);
        Ok(updated)
    }

    pub async fn patch(&mut self, id: i64, patch: T::Patch) -> Result<T> {
        self.begin();
        let result = self.backend.patch(id, patch).await;
        let patched = self.finish(result, "patch")?;
        self.replace(id, &patched);
        Ok(patched)
    }

    pub async fn delete(&mut self, id: i64) -> Result<()> {
        self.begin();
        let result = self.backend.delete(id).await;
        self.finish(result, "delete")?;

        self.items.retain(|item| item.id() != id);
        if self.current.as_ref().map(|c| c.id() == id).unwrap_or(false) {
            self.current = None;
        }
        Ok(())
    }

    /// Delete all `ids` concurrently. The cache is only touched when every
    /// delete succeeded.
    pub async fn batch_delete(&mut self, ids: &[i64]) -> Result<()> {
        self.begin();
        let backend = Arc::clone(&self.backend);
        let result = try_join_all(ids.iter().map(|&id| backend.delete(id))).await;
        self.finish(result, "batch_delete")?;

        self.items.retain(|item| !ids.contains(&item.id()));
        info!("Deleted {} {}", ids.len(), T::entity_name());
        Ok(())
    }

    /// Server-side search; the cache is left as is
    pub async fn search(&mut self, query: &str) -> Result<Vec<T>> {
        let mut params = FetchParams::new();
        params.insert("q".to_string(), Value::from(query));

        self.begin();
        let result = self.backend.query(&params).await;
        self.finish(result, "search")
    }

    /// Cached entities matching `predicate`
    pub fn filtered<P>(&self, predicate: &P) -> Vec<&T>
    where
        P: Predicate<T>,
    {
        self.items.iter().filter(|item| predicate.test(item)).collect()
    }

    /// Cached entities grouped by `key`, groups keep cache order
    pub fn group_by<K, F>(&self, key: F) -> BTreeMap<K, Vec<&T>>
    where
        K: Ord,
        F: Fn(&T) -> K,
    {
        let mut groups: BTreeMap<K, Vec<&T>> = BTreeMap::new();
        for item in &self.items {
            groups.entry(key(item)).or_default().push(item);
        }
        groups
    }

    /// Replace the cache without touching the backend
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.last_fetch = Some(Utc::now());
    }

    /// Select an entity as current, e.g. the one a detail view shows
    pub fn set_current(&mut self, item: T) {
        self.current = Some(item);
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Drop cached data and errors, the next `fetch_if_stale` will fetch
    pub fn reset_state(&mut self) {
        self.items.clear();
        self.current = None;
        self.loading = false;
        self.error = None;
        self.last_fetch = None;
    }

    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn finish<R>(&mut self, result: Result<R>, op: &str) -> Result<R> {
        self.loading = false;
        if let Err(e) = &result {
            error!("{} {} failed: {}", T::entity_name(), op, e);
            self.error = Some(e.clone());
        }
        result
    }

    fn upsert(&mut self, item: T) {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    fn replace(&mut self, id: i64, item: &T) {
        if let Some(existing) = self.items.iter_mut().find(|existing| existing.id() == id) {
            *existing = item.clone();
        }
        if self.current.as_ref().map(|c| c.id() == id).unwrap_or(false) {
            self.current = Some(item.clone());
        }
    }
}

//! Edit state for creating and updating a resource
//!
//! `FormState` holds a draft, the per-field errors shown next to inputs and
//! a submitting flag. Submission goes through a `ResourceStore` so the cache
//! stays in sync with what the form wrote.
//!
//! `AutoSave` periodically writes a form that has valid, unsaved changes.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::store::{ResourceStore, SharedStore};
use tabula_api::ApiError;
use tabula_core::{Resource, Result, Validate};

/// Error key used for failures reported by the backend on submit
pub const SUBMIT_ERROR_KEY: &str = "submit";

pub struct FormState<T: Resource> {
    data: T::Draft,
    initial: T::Draft,
    errors: BTreeMap<String, String>,
    is_submitting: bool,
    last_saved: Option<DateTime<Utc>>,
}

impl<T: Resource> Default for FormState<T> {
    fn default() -> Self {
        Self::new(T::Draft::default())
    }
}

impl<T: Resource> FormState<T> {
    pub fn new(initial: T::Draft) -> Self {
        Self {
            data: initial.clone(),
            initial,
            errors: BTreeMap::new(),
            is_submitting: false,
            last_saved: None,
        }
    }

    /// Form prefilled with an existing entity
    pub fn for_entity(entity: &T) -> Self {
        Self::new(entity.to_draft())
    }

    pub fn data(&self) -> &T::Draft {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut T::Draft {
        &mut self.data
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    /// When the form was last written to the backend
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Validate the whole draft, replacing the current errors
    pub fn validate(&mut self) -> bool {
        self.errors = match self.data.validate() {
            Ok(()) => BTreeMap::new(),
            Err(errors) => errors.field_map().into_iter().collect(),
        };
        self.errors.is_empty()
    }

    /// Validate the draft but only update the error of `field`
    pub fn validate_field(&mut self, field: &str) -> bool {
        let message = self
            .data
            .validate()
            .err()
            .and_then(|errors| errors.field_map().remove(field));
        match message {
            Some(message) => {
                self.errors.insert(field.to_string(), message);
                false
            }
            None => {
                self.errors.remove(field);
                true
            }
        }
    }

    /// No errors are currently recorded
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The draft differs from the values the form was created or filled with
    pub fn has_changes(&self) -> bool {
        self.data != self.initial
    }

    pub fn set_field_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.insert(field.to_string(), message.into());
    }

    pub fn clear_field_error(&mut self, field: &str) {
        self.errors.remove(field);
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Back to the initial values, without errors
    pub fn reset(&mut self) {
        self.data = self.initial.clone();
        self.errors.clear();
        self.is_submitting = false;
    }

    /// Load an entity's values; they become the new baseline for `has_changes`
    pub fn fill(&mut self, entity: &T) {
        self.initial = entity.to_draft();
        self.data = self.initial.clone();
        self.errors.clear();
    }

    /// Validate and create through `store`. The form is reset on success.
    pub async fn submit_create(&mut self, store: &mut ResourceStore<T>) -> Result<T> {
        let created = self.save(store, None).await?;
        debug!("Form created {} {}", T::short_name(), created.id());
        self.reset();
        Ok(created)
    }

    /// Validate and update entity `id` through `store`
    pub async fn submit_update(&mut self, store: &mut ResourceStore<T>, id: i64) -> Result<T> {
        let updated = self.save(store, Some(id)).await?;
        debug!("Form updated {} {}", T::short_name(), id);
        Ok(updated)
    }

    /// One autosave step: write the draft if it has valid, unsaved changes.
    ///
    /// `target` is the entity being edited. When it is `None` the draft is
    /// created and `target` takes the new id, so later steps update it.
    /// The draft is kept and becomes the new baseline for `has_changes`.
    /// Returns whether anything was written.
    pub async fn autosave_once(
        &mut self,
        store: &mut ResourceStore<T>,
        target: &mut Option<i64>,
    ) -> Result<bool> {
        if !self.has_changes() || !self.is_valid() {
            return Ok(false);
        }
        let saved = self.save(store, *target).await?;
        *target = Some(saved.id());
        self.initial = self.data.clone();
        Ok(true)
    }

    async fn save(&mut self, store: &mut ResourceStore<T>, id: Option<i64>) -> Result<T> {
        self.ensure_valid()?;
        self.is_submitting = true;
        self.errors.clear();

        let draft = self.data.clone();
        let result = match id {
            Some(id) => store.update(id, draft).await,
            None => store.create(draft).await,
        };
        self.is_submitting = false;

        match result {
            Ok(saved) => {
                self.last_saved = Some(Utc::now());
                Ok(saved)
            }
            Err(e) => Err(self.record_submit_error(e)),
        }
    }

    fn ensure_valid(&mut self) -> Result<()> {
        match self.data.validate() {
            Ok(()) => {
                self.errors.clear();
                Ok(())
            }
            Err(errors) => {
                self.errors = errors.field_map().into_iter().collect();
                Err(errors.into())
            }
        }
    }

    fn record_submit_error(&mut self, e: ApiError) -> ApiError {
        warn!("Submitting {} form failed: {}", T::short_name(), e);
        self.set_field_error(SUBMIT_ERROR_KEY, e.message());
        e
    }
}

/// Background task saving a shared form every `period`.
///
/// Each tick locks the form, then the store, and runs
/// [`FormState::autosave_once`]. Callers editing the form must take the
/// locks in the same order. Failures are logged and the task keeps running.
/// Dropping the handle stops the task.
pub struct AutoSave {
    task: JoinHandle<()>,
}

impl AutoSave {
    /// Start autosaving. Must be called from within a tokio runtime.
    pub fn enable<T: Resource>(
        form: Arc<Mutex<FormState<T>>>,
        store: SharedStore<T>,
        target: Option<i64>,
        period: Duration,
    ) -> Self {
        info!("Autosave enabled for {} every {:?}", T::short_name(), period);
        let task = tokio::spawn(async move {
            let mut target = target;
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let mut form = form.lock().await;
                let mut store = store.write().await;
                match form.autosave_once(&mut store, &mut target).await {
                    Ok(true) => debug!("Autosaved {} {:?}", T::short_name(), target),
                    Ok(false) => {}
                    Err(e) => warn!("Autosave of {} failed: {}", T::short_name(), e),
                }
            }
        });
        Self { task }
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn disable(self) {
        self.task.abort();
    }
}

impl Drop for AutoSave {
    fn drop(&mut self) {
        self.task.abort();
    }
}

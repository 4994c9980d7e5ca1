//! Cached, observable working sets of typed resources
pub mod resource_store;

pub use resource_store::{ResourceStore, DEFAULT_TTL};

use std::sync::Arc;
use tokio::sync::RwLock;

/// Store shared between the UI layer and background tasks such as autosave
pub type SharedStore<T> = Arc<RwLock<ResourceStore<T>>>;

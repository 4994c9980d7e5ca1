pub mod config;
pub mod core;
pub mod forms;
pub mod store;

pub use crate::config::{ConfigError, ListConfig};
pub use crate::core::{
    derive_view, FilterValue, FnPredicate, ListEngine, LoadTicket, Predicate, ResourceFetcher,
    SelectionSet, SortDirection, SortSpec, ViewQuery, ViewState,
};
pub use crate::forms::{AutoSave, FormState};
pub use crate::store::{ResourceStore, SharedStore};

pub use tabula_api::{ApiError, FetchParams, FetchResponse, Record, RecordId, Value};

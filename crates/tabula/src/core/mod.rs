pub mod fetcher;
pub mod filter;
pub mod list_engine;
#[cfg(test)]
mod list_engine_pbt;
pub mod selection;
pub mod sort;
pub mod traits;
pub mod view;

pub use fetcher::{to_record, ResourceFetcher};
pub use filter::{FieldFilter, FilterMap, FilterValue, SearchPredicate};
pub use list_engine::{ListEngine, LoadTicket};
pub use selection::SelectionSet;
pub use sort::{SortDirection, SortSpec};
pub use traits::{And, FnPredicate, Predicate};
pub use view::{derive_view, total_pages, ViewQuery, ViewState};

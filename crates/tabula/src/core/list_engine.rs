//! List engine: search, filters, sort, pagination and selection over a
//! collection obtained from an injected `Fetcher`.
//!
//! The engine is owned by exactly one host. Every synchronous operation
//! mutates the view inputs and immediately recomputes the derived view, so
//! accessors always observe a consistent filtered/sorted/paged chain.
//!
//! `load` is the only async operation. Concurrent loads are not coordinated:
//! hosts that drive several loads at once use `begin_load` / `finish_load`
//! and the last `finish_load` to run wins the collection. `is_latest` is
//! available for hosts that want to drop stale results themselves.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::filter::{FilterMap, FilterValue};
use super::selection::SelectionSet;
use super::sort::{SortDirection, SortSpec};
use super::view::{derive_view, ViewQuery, ViewState};
use crate::config::ListConfig;
use tabula_api::{ApiError, FetchParams, FetchResponse, Record, RecordId, Value};
use tabula_core::{Fetcher, Result};

/// Handle for one in-flight load started with `ListEngine::begin_load`
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    seq: u64,
    params: FetchParams,
}

impl LoadTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn params(&self) -> &FetchParams {
        &self.params
    }
}

pub struct ListEngine {
    fetcher: Arc<dyn Fetcher>,
    config: ListConfig,
    collection: Vec<Record>,
    query: ViewQuery,
    view: ViewState,
    selection: SelectionSet,
    loading: bool,
    error: Option<ApiError>,
    issued_loads: u64,
    loaded_at: Option<DateTime<Utc>>,
}

impl ListEngine {
    /// Build an idle engine with an empty collection. Does not load, even
    /// when `config.auto_load` is set; use `start` for that.
    pub fn new(fetcher: Arc<dyn Fetcher>, config: ListConfig) -> Self {
        let mut config = config;
        if let Err(e) = config.validate() {
            warn!("{}, falling back to {}", e, ListConfig::default().page_size);
            config.page_size = ListConfig::default().page_size;
        }

        let query = ViewQuery {
            search_fields: config.search_fields.clone(),
            sort: config.default_sort(),
            page_size: config.page_size,
            ..ViewQuery::default()
        };
        let view = derive_view(&[], &query);

        Self {
            fetcher,
            config,
            collection: Vec::new(),
            query,
            view,
            selection: SelectionSet::new(),
            loading: false,
            error: None,
            issued_loads: 0,
            loaded_at: None,
        }
    }

    /// Build an engine and, when `auto_load` is set, run the initial load.
    ///
    /// A failed initial load does not fail construction; it is reported
    /// through `error()` like any other load.
    pub async fn start(fetcher: Arc<dyn Fetcher>, config: ListConfig) -> Self {
        let auto_load = config.auto_load;
        let mut engine = Self::new(fetcher, config);
        if auto_load {
            if let Err(e) = engine.load(FetchParams::new()).await {
                debug!("Initial load failed: {}", e);
            }
        }
        engine
    }

    // ---------------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------------

    /// Fetch with `params` and replace the collection on success.
    ///
    /// On failure the collection and all view inputs are left untouched and
    /// the error is kept for `error()`. Returns the number of records loaded.
    pub async fn load(&mut self, params: FetchParams) -> Result<usize> {
        let ticket = self.begin_load(params);
        let fetcher = Arc::clone(&self.fetcher);
        let result = fetcher.fetch(ticket.params.clone()).await;
        self.finish_load(ticket, result)
    }

    pub async fn reload(&mut self) -> Result<usize> {
        self.load(FetchParams::new()).await
    }

    /// Mark the engine busy and hand out a ticket for a fetch the host runs
    pub fn begin_load(&mut self, params: FetchParams) -> LoadTicket {
        self.issued_loads += 1;
        self.loading = true;
        self.error = None;
        debug!("Load #{} started with {} params", self.issued_loads, params.len());
        LoadTicket {
            seq: self.issued_loads,
            params,
        }
    }

    /// Apply the outcome of a fetch. Always clears the busy flag.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<FetchResponse>,
    ) -> Result<usize> {
        self.loading = false;

        match result {
            Ok(response) => {
                let count = response.records.len();
                self.collection = response.records;
                self.loaded_at = Some(Utc::now());
                self.error = None;
                self.recompute();
                self.clamp_page();
                info!(
                    "Load #{} replaced collection with {} records ({} after filters)",
                    ticket.seq,
                    count,
                    self.view.total_items()
                );
                Ok(count)
            }
            Err(e) => {
                error!("Load #{} failed: {}", ticket.seq, e);
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Whether `ticket` belongs to the most recently started load
    pub fn is_latest(&self, ticket: &LoadTicket) -> bool {
        ticket.seq == self.issued_loads
    }

    /// Shared handle to the fetch collaborator, for hosts driving
    /// `begin_load` / `finish_load` themselves
    pub fn fetcher(&self) -> Arc<dyn Fetcher> {
        Arc::clone(&self.fetcher)
    }

    // ---------------------------------------------------------------------
    // Search and filters
    // ---------------------------------------------------------------------

    pub fn search(&mut self, query: &str) {
        self.query.search = query.to_string();
        self.query.page = 1;
        self.recompute();
    }

    pub fn clear_search(&mut self) {
        self.search("");
    }

    /// Set one filter. Null or empty-string values remove the key.
    pub fn set_filter(&mut self, key: &str, value: impl Into<Value>) {
        match FilterValue::from_value(value.into()) {
            Some(filter) => {
                self.query.filters.insert(key.to_string(), filter);
            }
            None => {
                self.query.filters.remove(key);
            }
        }
        self.query.page = 1;
        self.recompute();
    }

    pub fn remove_filter(&mut self, key: &str) {
        self.query.filters.remove(key);
        self.query.page = 1;
        self.recompute();
    }

    pub fn clear_filters(&mut self) {
        self.query.filters.clear();
        self.query.page = 1;
        self.recompute();
    }

    // ---------------------------------------------------------------------
    // Sorting
    // ---------------------------------------------------------------------

    /// Same field toggles the direction, a new field sorts ascending
    pub fn sort_by_field(&mut self, field: &str) {
        self.query.sort.toggle_field(field);
        self.recompute();
    }

    pub fn set_sorting(&mut self, field: &str, direction: SortDirection) {
        self.query.sort = SortSpec::new(field, direction);
        self.recompute();
    }

    // ---------------------------------------------------------------------
    // Pagination
    // ---------------------------------------------------------------------

    /// Returns false and leaves the page alone when `page` is out of range
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page < 1 || page > self.view.total_pages() {
            debug!("Ignoring go_to_page({}), {} pages", page, self.view.total_pages());
            return false;
        }
        self.query.page = page;
        self.recompute();
        true
    }

    pub fn next_page(&mut self) -> bool {
        if !self.view.has_next_page() {
            return false;
        }
        self.go_to_page(self.query.page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.view.has_prev_page() {
            return false;
        }
        self.go_to_page(self.query.page - 1)
    }

    /// Zero is ignored
    pub fn set_page_size(&mut self, page_size: usize) {
        if page_size == 0 {
            warn!("Ignoring page size 0");
            return;
        }
        self.query.page_size = page_size;
        self.query.page = 1;
        self.recompute();
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    /// Select exactly the visible rows, or clear the selection when every
    /// visible row is already selected.
    ///
    /// Only the current page is considered: selecting all on a new page
    /// replaces any selection made on other pages.
    pub fn toggle_select_all(&mut self) {
        let visible = self.visible_ids();
        if self.selection.covers(&visible) {
            self.selection.clear();
        } else {
            self.selection.select_exactly(visible);
        }
    }

    pub fn toggle_select_item(&mut self, id: impl Into<RecordId>) {
        self.selection.toggle(id.into());
    }

    pub fn is_selected(&self, id: impl Into<RecordId>) -> bool {
        self.selection.contains(&id.into())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selection size equals the page size and every visible id is selected
    pub fn all_selected(&self) -> bool {
        self.selection.covers_exactly(&self.visible_ids())
    }

    // ---------------------------------------------------------------------
    // Reset
    // ---------------------------------------------------------------------

    /// Restore page, search, filters, selection and sort to the configured
    /// defaults. Keeps the collection and does not reload.
    pub fn reset(&mut self) {
        self.query.page = 1;
        self.query.search.clear();
        self.query.filters.clear();
        self.query.sort = self.config.default_sort();
        self.selection.clear();
        self.recompute();
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// Rows on the current page
    pub fn page_rows(&self) -> Vec<&Record> {
        self.view.page_rows(&self.collection)
    }

    pub fn filtered_rows(&self) -> Vec<&Record> {
        self.view.filtered_rows(&self.collection)
    }

    pub fn sorted_rows(&self) -> Vec<&Record> {
        self.view.sorted_rows(&self.collection)
    }

    /// The raw collection as last loaded
    pub fn collection(&self) -> &[Record] {
        &self.collection
    }

    pub fn visible_ids(&self) -> Vec<RecordId> {
        self.view.visible_ids(&self.collection)
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    pub fn total_items(&self) -> usize {
        self.view.total_items()
    }

    pub fn total_pages(&self) -> usize {
        self.view.total_pages()
    }

    pub fn current_page(&self) -> usize {
        self.query.page
    }

    pub fn page_size(&self) -> usize {
        self.query.page_size
    }

    pub fn has_next_page(&self) -> bool {
        self.view.has_next_page()
    }

    pub fn has_prev_page(&self) -> bool {
        self.view.has_prev_page()
    }

    pub fn start_index(&self) -> usize {
        self.view.start_index()
    }

    pub fn end_index(&self) -> usize {
        self.view.end_index()
    }

    pub fn sort_field(&self) -> &str {
        &self.query.sort.field
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.query.sort.direction
    }

    pub fn search_query(&self) -> &str {
        &self.query.search
    }

    pub fn filters(&self) -> &FilterMap {
        &self.query.filters
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selected_ids(&self) -> Vec<RecordId> {
        self.selection.iter().cloned().collect()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ApiError::message)
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    fn recompute(&mut self) {
        self.view = derive_view(&self.collection, &self.query);
        debug!(
            "View recomputed: {} of {} records, page {}/{}",
            self.view.total_items(),
            self.collection.len(),
            self.query.page,
            self.view.total_pages()
        );
    }

    fn clamp_page(&mut self) {
        let last = self.view.total_pages();
        if self.query.page > last {
            debug!("Page {} past the end after load, clamping to {}", self.query.page, last);
            self.query.page = last;
            self.recompute();
        }
    }
}

impl std::fmt::Debug for ListEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListEngine")
            .field("records", &self.collection.len())
            .field("query", &self.query)
            .field("selected", &self.selection.len())
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish()
    }
}

//! Derived view pipeline
//!
//! `derive_view` is a pure function of the collection and the view inputs.
//! It runs three stages in a fixed order, each from scratch:
//!
//! 1. filter: free-text search AND every field filter
//! 2. sort: stable sort on the current field, `desc` reverses the comparison
//! 3. page: slice `[(page - 1) * size, page * size)` of the sorted rows
//!
//! Stages hold indices into the collection rather than cloned records, so a
//! view can be rebuilt after every mutation without copying data.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::filter::{FieldFilter, FilterMap, SearchPredicate};
use super::sort::SortSpec;
use super::traits::Predicate;
use tabula_api::{Record, RecordId};

/// Inputs of the view pipeline besides the collection itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewQuery {
    pub search: String,
    pub search_fields: Vec<String>,
    pub filters: FilterMap,
    pub sort: SortSpec,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            search_fields: Vec::new(),
            filters: FilterMap::new(),
            sort: SortSpec::default(),
            page: 1,
            page_size: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Collection indices that passed the filter stage, in collection order
    pub filtered: Vec<usize>,
    /// `filtered` after the sort stage
    pub sorted: Vec<usize>,
    /// Slice of `sorted` shown on the current page
    pub page_range: Range<usize>,
    pub page: usize,
    pub page_size: usize,
}

impl ViewState {
    pub fn total_items(&self) -> usize {
        self.filtered.len()
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.total_items(), self.page_size)
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev_page(&self) -> bool {
        self.page > 1
    }

    /// 1-based index of the first visible row, 0 when nothing is visible
    pub fn start_index(&self) -> usize {
        if self.page_range.is_empty() {
            0
        } else {
            self.page_range.start + 1
        }
    }

    /// 1-based index of the last visible row, 0 when nothing is visible
    pub fn end_index(&self) -> usize {
        if self.page_range.is_empty() {
            0
        } else {
            self.page_range.end
        }
    }

    pub fn page_indices(&self) -> &[usize] {
        &self.sorted[self.page_range.clone()]
    }

    pub fn page_rows<'a>(&self, collection: &'a [Record]) -> Vec<&'a Record> {
        pick(collection, self.page_indices())
    }

    pub fn filtered_rows<'a>(&self, collection: &'a [Record]) -> Vec<&'a Record> {
        pick(collection, &self.filtered)
    }

    pub fn sorted_rows<'a>(&self, collection: &'a [Record]) -> Vec<&'a Record> {
        pick(collection, &self.sorted)
    }

    /// Ids of the visible rows; rows without a usable id are skipped
    pub fn visible_ids(&self, collection: &[Record]) -> Vec<RecordId> {
        self.page_indices()
            .iter()
            .filter_map(|&i| collection.get(i).and_then(RecordId::of))
            .collect()
    }
}

fn pick<'a>(collection: &'a [Record], indices: &[usize]) -> Vec<&'a Record> {
    indices.iter().filter_map(|&i| collection.get(i)).collect()
}

/// `max(1, ceil(total / size))`; a zero size is treated as 1
pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

pub fn derive_view(collection: &[Record], query: &ViewQuery) -> ViewState {
    let search = SearchPredicate::new(&query.search, &query.search_fields);
    let predicate = search.and(FieldFilter::new(&query.filters));

    let filtered: Vec<usize> = collection
        .iter()
        .enumerate()
        .filter(|(_, record)| predicate.test(record))
        .map(|(i, _)| i)
        .collect();

    let mut sorted = filtered.clone();
    if query.sort.is_active() {
        // slice::sort_by is stable, equal keys keep collection order
        sorted.sort_by(|&a, &b| query.sort.compare(&collection[a], &collection[b]));
    }

    let page_size = query.page_size.max(1);
    let page = query.page.max(1);
    let start = (page - 1).saturating_mul(page_size).min(sorted.len());
    let end = start.saturating_add(page_size).min(sorted.len());

    ViewState {
        filtered,
        sorted,
        page_range: start..end,
        page,
        page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::FilterValue;
    use crate::core::sort::SortDirection;
    use tabula_api::Value;

    fn person(id: i64, name: &str, age: i64) -> Record {
        let mut r = Record::new();
        r.insert("id".into(), Value::Integer(id));
        r.insert("name".into(), Value::from(name));
        r.insert("age".into(), Value::Integer(age));
        r
    }

    fn people() -> Vec<Record> {
        vec![person(1, "A", 30), person(2, "B", 20), person(3, "C", 25)]
    }

    fn ids(rows: &[&Record]) -> Vec<i64> {
        rows.iter()
            .map(|r| r.get("id").and_then(Value::as_i64).unwrap())
            .collect()
    }

    fn query(page_size: usize) -> ViewQuery {
        ViewQuery {
            search_fields: vec!["name".into()],
            sort: SortSpec::new("id", SortDirection::Asc),
            page_size,
            ..ViewQuery::default()
        }
    }

    #[test]
    fn test_sort_by_age_pages() {
        let data = people();
        let mut q = query(2);
        q.sort = SortSpec::new("age", SortDirection::Asc);

        let view = derive_view(&data, &q);
        assert_eq!(ids(&view.sorted_rows(&data)), vec![2, 3, 1]);
        assert_eq!(ids(&view.page_rows(&data)), vec![2, 3]);
        assert_eq!(view.total_pages(), 2);

        q.page = 2;
        let view = derive_view(&data, &q);
        assert_eq!(ids(&view.page_rows(&data)), vec![1]);
        assert_eq!((view.start_index(), view.end_index()), (3, 3));
        assert!(!view.has_next_page());
        assert!(view.has_prev_page());
    }

    #[test]
    fn test_search_narrows_totals() {
        let data = people();
        let mut q = query(2);
        q.search = "b".into();

        let view = derive_view(&data, &q);
        assert_eq!(ids(&view.filtered_rows(&data)), vec![2]);
        assert_eq!(view.total_items(), 1);
        assert_eq!(view.total_pages(), 1);
    }

    #[test]
    fn test_stable_sort_keeps_collection_order_for_ties() {
        let data = vec![
            person(1, "A", 20),
            person(2, "B", 10),
            person(3, "C", 20),
            person(4, "D", 10),
        ];
        let mut q = query(10);
        q.sort = SortSpec::new("age", SortDirection::Asc);
        assert_eq!(ids(&derive_view(&data, &q).sorted_rows(&data)), vec![2, 4, 1, 3]);

        q.sort.direction = SortDirection::Desc;
        assert_eq!(ids(&derive_view(&data, &q).sorted_rows(&data)), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_empty_sort_field_keeps_collection_order() {
        let data = people();
        let mut q = query(10);
        q.sort = SortSpec::new("", SortDirection::Desc);
        assert_eq!(ids(&derive_view(&data, &q).sorted_rows(&data)), vec![1, 2, 3]);
    }

    #[test]
    fn test_filters_apply_before_paging() {
        let data = people();
        let mut q = query(1);
        q.filters
            .insert("age".into(), FilterValue::AnyOf(vec![20.into(), 30.into()]));

        let view = derive_view(&data, &q);
        assert_eq!(view.total_items(), 2);
        assert_eq!(view.total_pages(), 2);
        assert_eq!(ids(&view.page_rows(&data)), vec![1]);
    }

    #[test]
    fn test_empty_collection_view() {
        let view = derive_view(&[], &query(10));
        assert_eq!(view.total_items(), 0);
        assert_eq!(view.total_pages(), 1);
        assert_eq!((view.start_index(), view.end_index()), (0, 0));
        assert!(!view.has_next_page());
        assert!(!view.has_prev_page());
        assert!(view.page_indices().is_empty());
    }

    #[test]
    fn test_total_pages_formula() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let data = people();
        let mut q = query(2);
        q.page = 5;
        let view = derive_view(&data, &q);
        assert!(view.page_rows(&data).is_empty());
        assert_eq!(view.start_index(), 0);
    }
}

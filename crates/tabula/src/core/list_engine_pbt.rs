//! Stateful property-based tests for ListEngine
//!
//! A deliberately naive reference model (typed rows, clone-and-sort) runs the
//! same operation sequence as the engine, and the observable view state of
//! both is compared after every step.

#[cfg(test)]
mod stateful_tests {
    use super::super::list_engine::ListEngine;
    use super::super::sort::SortDirection;
    use crate::config::ListConfig;
    use proptest::prelude::*;
    use proptest_state_machine::{ReferenceStateMachine, StateMachineTest};
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use tabula_api::{ApiError, FetchParams, FetchResponse, Record, RecordId, Value};
    use tabula_core::FetchFn;

    const PAGE_SIZE: usize = 3;
    const SEARCH_FIELDS: &[&str] = &["name"];
    const CITIES: &[&str] = &["Taipei", "Tainan", "Hsinchu"];

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        id: i64,
        name: String,
        age: i64,
        city: String,
    }

    impl Person {
        fn to_record(&self) -> Record {
            let mut r = Record::new();
            r.insert("id".into(), Value::Integer(self.id));
            r.insert("name".into(), Value::from(self.name.as_str()));
            r.insert("age".into(), Value::Integer(self.age));
            r.insert("city".into(), Value::from(self.city.as_str()));
            r
        }
    }

    #[derive(Debug, Clone)]
    enum EngineTransition {
        Load(Vec<Person>),
        FailLoad,
        Search(String),
        ClearSearch,
        /// `None` sets the filter to an empty string, which removes it
        FilterCity(Option<String>),
        FilterAges(Vec<i64>),
        RemoveFilter(&'static str),
        ClearFilters,
        SortByField(&'static str),
        SetSorting(&'static str, SortDirection),
        GoToPage(usize),
        NextPage,
        PrevPage,
        SetPageSize(usize),
        ToggleSelectAll,
        ToggleSelectItem(i64),
        ClearSelection,
        Reset,
    }

    #[derive(Debug, Clone)]
    struct ReferenceState {
        people: Vec<Person>,
        search: String,
        city: Option<String>,
        ages: Option<Vec<i64>>,
        sort_field: &'static str,
        sort_desc: bool,
        page: usize,
        page_size: usize,
        selection: BTreeSet<i64>,
        has_error: bool,
    }

    impl Default for ReferenceState {
        fn default() -> Self {
            Self {
                people: Vec::new(),
                search: String::new(),
                city: None,
                ages: None,
                sort_field: "id",
                sort_desc: false,
                page: 1,
                page_size: PAGE_SIZE,
                selection: BTreeSet::new(),
                has_error: false,
            }
        }
    }

    impl ReferenceState {
        fn filtered(&self) -> Vec<Person> {
            let needle = self.search.to_lowercase();
            self.people
                .iter()
                .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
                .filter(|p| self.city.as_ref().map(|c| &p.city == c).unwrap_or(true))
                .filter(|p| self.ages.as_ref().map(|a| a.contains(&p.age)).unwrap_or(true))
                .cloned()
                .collect()
        }

        fn sorted(&self) -> Vec<Person> {
            let mut rows = self.filtered();
            rows.sort_by(|a, b| {
                let ord = match self.sort_field {
                    "id" => a.id.cmp(&b.id),
                    "age" => a.age.cmp(&b.age),
                    "name" => a.name.cmp(&b.name),
                    "city" => a.city.cmp(&b.city),
                    _ => std::cmp::Ordering::Equal,
                };
                if self.sort_desc {
                    ord.reverse()
                } else {
                    ord
                }
            });
            rows
        }

        fn total_pages(&self) -> usize {
            let total = self.filtered().len();
            std::cmp::max(1, (total + self.page_size - 1) / self.page_size)
        }

        fn visible(&self) -> Vec<i64> {
            self.sorted()
                .into_iter()
                .skip((self.page - 1) * self.page_size)
                .take(self.page_size)
                .map(|p| p.id)
                .collect()
        }

        fn all_selected(&self) -> bool {
            let visible = self.visible();
            !visible.is_empty()
                && self.selection.len() == visible.len()
                && visible.iter().all(|id| self.selection.contains(id))
        }
    }

    fn people_strategy() -> impl Strategy<Value = Vec<Person>> {
        prop::collection::vec(
            ("[ab]{1,2}", 0..4i64, prop::sample::select(CITIES)),
            0..10,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (name, age, city))| Person {
                    id: i as i64 + 1,
                    name,
                    age,
                    city: city.to_string(),
                })
                .collect()
        })
    }

    fn field_strategy() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec!["id", "age", "name", "city"])
    }

    impl ReferenceStateMachine for ReferenceState {
        type State = Self;
        type Transition = EngineTransition;

        fn init_state() -> BoxedStrategy<Self::State> {
            Just(ReferenceState::default()).boxed()
        }

        fn transitions(_state: &Self::State) -> BoxedStrategy<Self::Transition> {
            prop_oneof![
                3 => people_strategy().prop_map(EngineTransition::Load),
                1 => Just(EngineTransition::FailLoad),
                2 => "[aAbB]{0,2}".prop_map(EngineTransition::Search),
                1 => Just(EngineTransition::ClearSearch),
                2 => prop::option::of(prop::sample::select(CITIES))
                    .prop_map(|c| EngineTransition::FilterCity(c.map(str::to_string))),
                1 => prop::collection::vec(0..4i64, 0..3).prop_map(EngineTransition::FilterAges),
                1 => prop::sample::select(vec!["city", "age"]).prop_map(EngineTransition::RemoveFilter),
                1 => Just(EngineTransition::ClearFilters),
                2 => field_strategy().prop_map(EngineTransition::SortByField),
                1 => (field_strategy(), prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)])
                    .prop_map(|(f, d)| EngineTransition::SetSorting(f, d)),
                2 => (0..6usize).prop_map(EngineTransition::GoToPage),
                2 => Just(EngineTransition::NextPage),
                1 => Just(EngineTransition::PrevPage),
                1 => (0..5usize).prop_map(EngineTransition::SetPageSize),
                2 => Just(EngineTransition::ToggleSelectAll),
                2 => (1..12i64).prop_map(EngineTransition::ToggleSelectItem),
                1 => Just(EngineTransition::ClearSelection),
                1 => Just(EngineTransition::Reset),
            ]
            .boxed()
        }

        fn apply(state: Self::State, transition: &Self::Transition) -> Self::State {
            let mut state = state;

            match transition {
                EngineTransition::Load(people) => {
                    state.people = people.clone();
                    state.has_error = false;
                    state.page = state.page.min(state.total_pages());
                }
                EngineTransition::FailLoad => {
                    state.has_error = true;
                }
                EngineTransition::Search(q) => {
                    state.search = q.clone();
                    state.page = 1;
                }
                EngineTransition::ClearSearch => {
                    state.search.clear();
                    state.page = 1;
                }
                EngineTransition::FilterCity(city) => {
                    state.city = city.clone();
                    state.page = 1;
                }
                EngineTransition::FilterAges(ages) => {
                    state.ages = Some(ages.clone());
                    state.page = 1;
                }
                EngineTransition::RemoveFilter(key) => {
                    match *key {
                        "city" => state.city = None,
                        _ => state.ages = None,
                    }
                    state.page = 1;
                }
                EngineTransition::ClearFilters => {
                    state.city = None;
                    state.ages = None;
                    state.page = 1;
                }
                EngineTransition::SortByField(field) => {
                    if state.sort_field == *field {
                        state.sort_desc = !state.sort_desc;
                    } else {
                        state.sort_field = field;
                        state.sort_desc = false;
                    }
                }
                EngineTransition::SetSorting(field, direction) => {
                    state.sort_field = field;
                    state.sort_desc = *direction == SortDirection::Desc;
                }
                EngineTransition::GoToPage(n) => {
                    if *n >= 1 && *n <= state.total_pages() {
                        state.page = *n;
                    }
                }
                EngineTransition::NextPage => {
                    if state.page < state.total_pages() {
                        state.page += 1;
                    }
                }
                EngineTransition::PrevPage => {
                    if state.page > 1 {
                        state.page -= 1;
                    }
                }
                EngineTransition::SetPageSize(n) => {
                    if *n > 0 {
                        state.page_size = *n;
                        state.page = 1;
                    }
                }
                EngineTransition::ToggleSelectAll => {
                    let visible = state.visible();
                    if !visible.is_empty() && visible.iter().all(|id| state.selection.contains(id))
                    {
                        state.selection.clear();
                    } else {
                        state.selection = visible.into_iter().collect();
                    }
                }
                EngineTransition::ToggleSelectItem(id) => {
                    if !state.selection.remove(id) {
                        state.selection.insert(*id);
                    }
                }
                EngineTransition::ClearSelection => {
                    state.selection.clear();
                }
                EngineTransition::Reset => {
                    state.page = 1;
                    state.search.clear();
                    state.city = None;
                    state.ages = None;
                    state.sort_field = "id";
                    state.sort_desc = false;
                    state.selection.clear();
                }
            }

            state
        }
    }

    struct EngineTest {
        engine: ListEngine,
    }

    impl StateMachineTest for EngineTest {
        type SystemUnderTest = Self;
        type Reference = ReferenceState;

        fn init_test(
            _ref_state: &<Self::Reference as ReferenceStateMachine>::State,
        ) -> Self::SystemUnderTest {
            let fetcher = Arc::new(FetchFn(|_params: FetchParams| async {
                Ok::<_, ApiError>(FetchResponse::default())
            }));
            let config = ListConfig::default()
                .with_page_size(PAGE_SIZE)
                .with_search_fields(SEARCH_FIELDS.iter().copied())
                .with_auto_load(false);

            EngineTest {
                engine: ListEngine::new(fetcher, config),
            }
        }

        fn apply(
            mut state: Self::SystemUnderTest,
            _ref_state: &<Self::Reference as ReferenceStateMachine>::State,
            transition: <Self::Reference as ReferenceStateMachine>::Transition,
        ) -> Self::SystemUnderTest {
            let engine = &mut state.engine;

            match transition {
                EngineTransition::Load(people) => {
                    let ticket = engine.begin_load(FetchParams::new());
                    let records = people.iter().map(Person::to_record).collect();
                    let loaded = engine
                        .finish_load(ticket, Ok(FetchResponse::from_records(records)))
                        .unwrap();
                    assert_eq!(loaded, people.len());
                }
                EngineTransition::FailLoad => {
                    let ticket = engine.begin_load(FetchParams::new());
                    let result =
                        engine.finish_load(ticket, Err(ApiError::network("injected failure")));
                    assert!(result.is_err());
                }
                EngineTransition::Search(q) => engine.search(&q),
                EngineTransition::ClearSearch => engine.clear_search(),
                EngineTransition::FilterCity(Some(city)) => engine.set_filter("city", city),
                EngineTransition::FilterCity(None) => engine.set_filter("city", ""),
                EngineTransition::FilterAges(ages) => engine.set_filter("age", ages),
                EngineTransition::RemoveFilter(key) => engine.remove_filter(key),
                EngineTransition::ClearFilters => engine.clear_filters(),
                EngineTransition::SortByField(field) => engine.sort_by_field(field),
                EngineTransition::SetSorting(field, direction) => {
                    engine.set_sorting(field, direction)
                }
                EngineTransition::GoToPage(n) => {
                    engine.go_to_page(n);
                }
                EngineTransition::NextPage => {
                    engine.next_page();
                }
                EngineTransition::PrevPage => {
                    engine.prev_page();
                }
                EngineTransition::SetPageSize(n) => engine.set_page_size(n),
                EngineTransition::ToggleSelectAll => engine.toggle_select_all(),
                EngineTransition::ToggleSelectItem(id) => engine.toggle_select_item(id),
                EngineTransition::ClearSelection => engine.clear_selection(),
                EngineTransition::Reset => engine.reset(),
            }

            state
        }

        fn check_invariants(
            state: &Self::SystemUnderTest,
            ref_state: &<Self::Reference as ReferenceStateMachine>::State,
        ) {
            let engine = &state.engine;
            let ids = |rows: Vec<&Record>| -> Vec<i64> {
                rows.iter()
                    .filter_map(|r| r.get("id").and_then(Value::as_i64))
                    .collect()
            };

            let expected_filtered: Vec<i64> = ref_state.filtered().iter().map(|p| p.id).collect();
            let expected_sorted: Vec<i64> = ref_state.sorted().iter().map(|p| p.id).collect();

            assert_eq!(ids(engine.filtered_rows()), expected_filtered);
            assert_eq!(ids(engine.sorted_rows()), expected_sorted);
            assert_eq!(ids(engine.page_rows()), ref_state.visible());

            assert_eq!(engine.filtered_rows().len(), engine.total_items());
            assert_eq!(engine.total_items(), expected_filtered.len());
            assert_eq!(engine.total_pages(), ref_state.total_pages());
            assert_eq!(engine.current_page(), ref_state.page);
            assert_eq!(engine.page_size(), ref_state.page_size);
            assert_eq!(engine.has_next_page(), ref_state.page < ref_state.total_pages());
            assert_eq!(engine.has_prev_page(), ref_state.page > 1);
            assert!(engine.current_page() >= 1 && engine.current_page() <= engine.total_pages());

            let expected_selection: Vec<RecordId> =
                ref_state.selection.iter().map(|&id| RecordId::Int(id)).collect();
            assert_eq!(engine.selected_ids(), expected_selection);
            assert_eq!(engine.all_selected(), ref_state.all_selected());

            assert_eq!(engine.error().is_some(), ref_state.has_error);
            assert!(!engine.is_loading());
        }
    }

    proptest_state_machine::prop_state_machine! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            failure_persistence: None,
            .. ProptestConfig::default()
        })]

        #[test]
        fn test_list_engine_matches_reference(sequential 1..40 => EngineTest);
    }
}

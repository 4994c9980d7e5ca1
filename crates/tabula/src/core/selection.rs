use std::collections::BTreeSet;

use tabula_api::RecordId;

/// Record ids marked as selected.
///
/// Selection is independent of the visible page; only `select_exactly` and
/// `clear` drop ids that are not on screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<RecordId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.ids.contains(id)
    }

    /// Adds `id` if absent, removes it otherwise. Returns whether it is now selected.
    pub fn toggle(&mut self, id: RecordId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Replace the selection with `ids`
    pub fn select_exactly<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = RecordId>,
    {
        self.ids = ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.ids.iter()
    }

    /// True when `visible` is non-empty, has the same size as the selection
    /// and every visible id is selected.
    pub fn covers_exactly(&self, visible: &[RecordId]) -> bool {
        !visible.is_empty()
            && self.ids.len() == visible.len()
            && visible.iter().all(|id| self.ids.contains(id))
    }

    /// True when every visible id is selected, regardless of other selections
    pub fn covers(&self, visible: &[RecordId]) -> bool {
        !visible.is_empty() && visible.iter().all(|id| self.ids.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut sel = SelectionSet::new();
        assert!(sel.toggle(RecordId::from(2)));
        assert!(sel.contains(&RecordId::from(2)));
        assert!(!sel.toggle(RecordId::from(2)));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_covers_exactly_requires_same_size() {
        let mut sel = SelectionSet::new();
        sel.select_exactly([RecordId::from(1), RecordId::from(2), RecordId::from(9)]);
        let page = [RecordId::from(1), RecordId::from(2)];

        assert!(sel.covers(&page));
        assert!(!sel.covers_exactly(&page));

        sel.toggle(RecordId::from(9));
        assert!(sel.covers_exactly(&page));
        assert!(!sel.covers_exactly(&[]));
    }
}

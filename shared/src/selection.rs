use std::collections::HashSet;

use crate::identity::{IdentityKey, TileIdentity};
use crate::render::TileStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// The box is already sold and cannot be selected.
    RejectedSold,
}

/// Insertion-ordered identity list with a key index for O(1) membership.
#[derive(Debug, Clone, Default)]
struct OrderedSet {
    items: Vec<TileIdentity>,
    keys: HashSet<IdentityKey>,
}

impl OrderedSet {
    fn contains(&self, identity: &TileIdentity) -> bool {
        self.keys.contains(&identity.key())
    }

    fn push(&mut self, identity: TileIdentity) -> bool {
        if !self.keys.insert(identity.key()) {
            return false;
        }
        self.items.push(identity);
        true
    }

    fn remove(&mut self, identity: &TileIdentity) -> bool {
        let key = identity.key();
        if !self.keys.remove(&key) {
            return false;
        }
        self.items.retain(|item| item.key() != key);
        true
    }

    fn clear(&mut self) {
        self.items.clear();
        self.keys.clear();
    }
}

/// Sold and selected boxes. A box is in at most one of the two.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    sold: OrderedSet,
    selected: OrderedSet,
}

impl SelectionStore {
    pub fn status_of(&self, identity: &TileIdentity) -> TileStatus {
        if self.sold.contains(identity) {
            TileStatus::Sold
        } else if self.selected.contains(identity) {
            TileStatus::Selected
        } else {
            TileStatus::None
        }
    }

    pub fn toggle_selected(&mut self, identity: TileIdentity) -> ToggleOutcome {
        if self.sold.contains(&identity) {
            return ToggleOutcome::RejectedSold;
        }
        if self.selected.remove(&identity) {
            ToggleOutcome::Removed
        } else {
            self.selected.push(identity);
            ToggleOutcome::Added
        }
    }

    /// Snapshot of the pending selection, in click order. Sold is untouched;
    /// the caller persists first and records afterwards.
    pub fn commit_purchase(&self) -> Vec<TileIdentity> {
        self.selected.items.clone()
    }

    pub fn reset_selection(&mut self) {
        self.selected.clear();
    }

    /// Replace the sold set with what storage holds. Duplicates keep their
    /// first position. Selected boxes that turn out to be sold leave the
    /// selection; returns how many did.
    pub fn load_sold(&mut self, sold: impl IntoIterator<Item = TileIdentity>) -> usize {
        self.sold.clear();
        for identity in sold {
            self.sold.push(identity);
        }

        let taken: Vec<TileIdentity> = self
            .selected
            .items
            .iter()
            .filter(|identity| self.sold.contains(identity))
            .copied()
            .collect();
        for identity in &taken {
            self.selected.remove(identity);
        }
        taken.len()
    }

    /// Append purchased boxes; already-sold ones are skipped.
    pub(crate) fn record_sold(&mut self, purchased: &[TileIdentity]) -> usize {
        purchased
            .iter()
            .filter(|identity| self.sold.push(**identity))
            .count()
    }

    pub fn sold(&self) -> &[TileIdentity] {
        &self.sold.items
    }

    pub fn selected(&self) -> &[TileIdentity] {
        &self.selected.items
    }

    pub fn selected_len(&self) -> usize {
        self.selected.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: TileIdentity = TileIdentity::new(10.0, 20.0);
    const B: TileIdentity = TileIdentity::new(10.0, 20.04);
    const C: TileIdentity = TileIdentity::new(-3.5, 101.25);

    #[test]
    fn double_toggle_restores_selection() {
        let mut store = SelectionStore::default();
        store.toggle_selected(C);
        let before = store.selected().to_vec();

        assert_eq!(store.toggle_selected(A), ToggleOutcome::Added);
        assert_eq!(store.toggle_selected(A), ToggleOutcome::Removed);
        assert_eq!(store.selected(), before.as_slice());
    }

    #[test]
    fn sold_box_cannot_be_selected() {
        let mut store = SelectionStore::default();
        store.load_sold([A]);

        assert_eq!(store.status_of(&A), TileStatus::Sold);
        assert_eq!(store.toggle_selected(A), ToggleOutcome::RejectedSold);
        assert!(store.selected().is_empty());
        assert_eq!(store.status_of(&A), TileStatus::Sold);
    }

    #[test]
    fn status_reflects_selection() {
        let mut store = SelectionStore::default();
        assert_eq!(store.status_of(&B), TileStatus::None);
        store.toggle_selected(B);
        assert_eq!(store.status_of(&B), TileStatus::Selected);
    }

    #[test]
    fn commit_returns_selection_without_recording_it() {
        let mut store = SelectionStore::default();
        store.toggle_selected(A);
        store.toggle_selected(B);

        assert_eq!(store.commit_purchase(), vec![A, B]);
        assert!(store.sold().is_empty());
        assert_eq!(store.selected_len(), 2);
    }

    #[test]
    fn removing_keeps_remaining_order() {
        let mut store = SelectionStore::default();
        store.toggle_selected(A);
        store.toggle_selected(B);
        store.toggle_selected(C);
        store.toggle_selected(B);
        assert_eq!(store.selected(), &[A, C]);
    }

    #[test]
    fn load_sold_collapses_duplicates() {
        let mut store = SelectionStore::default();
        store.load_sold([A, B, A]);
        assert_eq!(store.sold(), &[A, B]);
    }

    #[test]
    fn loading_sold_takes_boxes_out_of_selection() {
        let mut store = SelectionStore::default();
        store.toggle_selected(A);
        store.toggle_selected(B);
        assert_eq!(store.load_sold([B]), 1);
        assert_eq!(store.selected(), &[A]);
        assert_eq!(store.status_of(&B), TileStatus::Sold);
    }

    #[test]
    fn record_sold_skips_existing_entries() {
        let mut store = SelectionStore::default();
        store.load_sold([A]);
        assert_eq!(store.record_sold(&[A, B]), 1);
        assert_eq!(store.sold(), &[A, B]);
    }

    #[test]
    fn reset_empties_selection_only() {
        let mut store = SelectionStore::default();
        store.load_sold([A]);
        store.toggle_selected(B);
        store.reset_selection();
        assert!(store.selected().is_empty());
        assert_eq!(store.sold(), &[A]);
    }
}

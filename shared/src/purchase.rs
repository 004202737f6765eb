use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::config::{PURCHASE_SUCCESS_MESSAGE, SOLD_STORAGE_KEY};
use crate::error::{PurchaseError, StorageError};
use crate::identity::TileIdentity;
use crate::notify::Notifier;
use crate::overlay::GridOverlay;
use crate::storage::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Completed { count: usize },
    NothingSelected,
}

/// A purchase decided but not yet persisted.
#[derive(Debug, Clone)]
pub struct PendingPurchase {
    purchased: Vec<TileIdentity>,
    combined: Vec<TileIdentity>,
}

impl PendingPurchase {
    pub fn purchased(&self) -> &[TileIdentity] {
        &self.purchased
    }

    /// Sold set as it will be written: previous sold followed by the purchase.
    pub fn combined(&self) -> &[TileIdentity] {
        &self.combined
    }
}

/// Moves the selection into the sold set through storage.
///
/// The work is split so that no borrow of the overlay spans the storage
/// await: [`begin`](Self::begin) snapshots, [`persist`](Self::persist)
/// writes, [`finish`](Self::finish) applies. [`purchase`](Self::purchase)
/// runs all three, and only once the stored sold set has been read, so a
/// write never replaces a record this coordinator has not seen.
pub struct PurchaseCoordinator<S, N> {
    storage: S,
    notifier: N,
    sold_loaded: Cell<bool>,
}

impl<S: KeyValueStore, N: Notifier> PurchaseCoordinator<S, N> {
    pub fn new(storage: S, notifier: N) -> Self {
        Self {
            storage,
            notifier,
            sold_loaded: Cell::new(false),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Whether the stored sold set has been read successfully.
    pub fn sold_loaded(&self) -> bool {
        self.sold_loaded.get()
    }

    /// Read the sold set from storage into the overlay. Live tiles are
    /// re-rendered and selected boxes that are already sold are deselected.
    pub async fn load_sold(&self, grid: &RefCell<GridOverlay>) -> Result<usize, StorageError> {
        let stored: Option<Vec<TileIdentity>> = self.storage.get(SOLD_STORAGE_KEY).await?;

        let mut overlay = grid.borrow_mut();
        let taken = overlay.apply_sold(stored.unwrap_or_default());
        self.sold_loaded.set(true);
        let count = overlay.store().sold().len();
        tracing::info!(count, deselected = taken, "sold boxes loaded");
        Ok(count)
    }

    pub(crate) fn begin(&self, overlay: &GridOverlay) -> Option<PendingPurchase> {
        let store = overlay.store();
        let purchased = store.commit_purchase();
        if purchased.is_empty() {
            return None;
        }

        let mut seen: HashSet<TileIdentity> = store.sold().iter().copied().collect();
        let mut combined = store.sold().to_vec();
        combined.extend(purchased.iter().copied().filter(|id| seen.insert(*id)));
        Some(PendingPurchase {
            purchased,
            combined,
        })
    }

    pub(crate) async fn persist(&self, pending: &PendingPurchase) -> Result<(), StorageError> {
        self.storage
            .set(SOLD_STORAGE_KEY, pending.combined.as_slice())
            .await
    }

    /// Apply a persisted purchase: record it as sold, clear the selection,
    /// rebuild the grid and tell the user.
    pub(crate) fn finish(&self, overlay: &mut GridOverlay, pending: PendingPurchase) -> usize {
        let count = overlay.store_mut().record_sold(&pending.purchased);
        overlay.store_mut().reset_selection();
        overlay.rebuild();
        tracing::info!(count, sold = overlay.store().sold().len(), "boxes purchased");
        self.notifier.notify(PURCHASE_SUCCESS_MESSAGE);
        count
    }

    pub async fn purchase(&self, grid: &RefCell<GridOverlay>) -> Result<PurchaseOutcome, PurchaseError> {
        if !self.sold_loaded.get()
            && let Err(e) = self.load_sold(grid).await
        {
            tracing::warn!(error = %e, "purchase refused, sold boxes unreadable");
            return Err(PurchaseError::SoldUnavailable(e));
        }

        let Some(pending) = self.begin(&grid.borrow()) else {
            return Ok(PurchaseOutcome::NothingSelected);
        };

        if let Err(e) = self.persist(&pending).await {
            tracing::warn!(error = %e, count = pending.purchased.len(), "purchase not persisted");
            return Err(e.into());
        }

        let count = self.finish(&mut grid.borrow_mut(), pending);
        Ok(PurchaseOutcome::Completed { count })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use futures::executor::block_on;

    use super::*;
    use crate::geo::PixelPoint;
    use crate::map::testing::FixedMap;
    use crate::render::SOLD_BORDER;
    use crate::selection::ToggleOutcome;
    use crate::storage::MemoryStore;

    const A: TileIdentity = TileIdentity::new(10.0, 20.0);
    const B: TileIdentity = TileIdentity::new(10.0, 20.04);
    const C: TileIdentity = TileIdentity::new(10.0, 20.08);

    fn active_grid() -> RefCell<GridOverlay> {
        let mut overlay = GridOverlay::default();
        overlay.on_zoom_changed(20);
        RefCell::new(overlay)
    }

    fn select(grid: &RefCell<GridOverlay>, identity: TileIdentity) {
        grid.borrow_mut().store_mut().toggle_selected(identity);
    }

    #[test]
    fn purchase_moves_selection_into_sold() {
        let toasts = RefCell::new(Vec::<String>::new());
        let coordinator = PurchaseCoordinator::new(MemoryStore::default(), |m: &str| {
            toasts.borrow_mut().push(m.to_owned())
        });
        let grid = active_grid();
        select(&grid, A);
        select(&grid, B);

        let outcome = block_on(coordinator.purchase(&grid)).expect("purchase");

        assert_eq!(outcome, PurchaseOutcome::Completed { count: 2 });
        let overlay = grid.borrow();
        assert_eq!(overlay.store().sold(), &[A, B]);
        assert!(overlay.store().selected().is_empty());
        assert!(overlay.is_active());
        assert_eq!(
            coordinator.storage().raw(SOLD_STORAGE_KEY).as_deref(),
            Some(r#"[{"lat":10.0,"lng":20.0},{"lat":10.0,"lng":20.04}]"#)
        );
        assert_eq!(toasts.borrow().as_slice(), &[PURCHASE_SUCCESS_MESSAGE]);
    }

    #[test]
    fn purchased_tiles_come_back_sold_after_rebuild() {
        let coordinator = PurchaseCoordinator::new(MemoryStore::default(), |_: &str| {});
        let map = FixedMap::at(
            20,
            PixelPoint::new(3_500_000.0 * 40.0, 2_100_000.0 * 40.0),
            800.0,
            600.0,
        );
        let point = PixelPoint::new(125.0, 45.0);
        let grid = active_grid();
        grid.borrow_mut().sync_tiles(&map);
        assert_eq!(grid.borrow_mut().click_at(&map, point), Some(ToggleOutcome::Added));

        let outcome = block_on(coordinator.purchase(&grid)).expect("purchase");
        assert_eq!(outcome, PurchaseOutcome::Completed { count: 1 });

        let mut overlay = grid.borrow_mut();
        assert_eq!(overlay.tile_count(), 0);
        overlay.sync_tiles(&map);
        let tile = overlay.tile_at(&map, point).expect("tile");
        assert_eq!(tile.surface.border, SOLD_BORDER);
        assert!(!tile.is_highlighted());
        assert_eq!(overlay.click_at(&map, point), Some(ToggleOutcome::RejectedSold));
        assert!(overlay.store().selected().is_empty());
    }

    #[test]
    fn purchase_appends_after_existing_sold() {
        let coordinator = PurchaseCoordinator::new(MemoryStore::default(), |_: &str| {});
        coordinator
            .storage()
            .insert_raw(SOLD_STORAGE_KEY, r#"[{"lat":10.0,"lng":20.0}]"#);
        let grid = active_grid();
        block_on(coordinator.load_sold(&grid)).expect("load");
        select(&grid, C);
        select(&grid, B);

        block_on(coordinator.purchase(&grid)).expect("purchase");

        assert_eq!(grid.borrow().store().sold(), &[A, C, B]);
        let stored: Option<Vec<TileIdentity>> =
            block_on(coordinator.storage().get(SOLD_STORAGE_KEY)).expect("read back");
        assert_eq!(stored, Some(vec![A, C, B]));
    }

    #[test]
    fn failed_write_leaves_selection_untouched() {
        let toasts = RefCell::new(Vec::<String>::new());
        let coordinator = PurchaseCoordinator::new(MemoryStore::default(), |m: &str| {
            toasts.borrow_mut().push(m.to_owned())
        });
        coordinator.storage().reject_writes(true);
        let grid = active_grid();
        select(&grid, A);
        select(&grid, B);
        let before = grid.borrow().store().selected().to_vec();

        let err = block_on(coordinator.purchase(&grid)).expect_err("purchase should fail");

        assert!(matches!(err, PurchaseError::Persistence(StorageError::Unavailable(_))));
        let overlay = grid.borrow();
        assert_eq!(overlay.store().selected(), before.as_slice());
        assert!(overlay.store().sold().is_empty());
        assert_eq!(coordinator.storage().raw(SOLD_STORAGE_KEY), None);
        assert!(toasts.borrow().is_empty());
    }

    #[test]
    fn unreadable_sold_record_blocks_purchase() {
        let toasts = RefCell::new(Vec::<String>::new());
        let coordinator = PurchaseCoordinator::new(MemoryStore::default(), |m: &str| {
            toasts.borrow_mut().push(m.to_owned())
        });
        let record = r#"[{"lat":10.0,"lng":20.0},{"lat":1.0}]"#;
        coordinator.storage().insert_raw(SOLD_STORAGE_KEY, record);
        let grid = active_grid();
        assert!(block_on(coordinator.load_sold(&grid)).is_err());
        assert!(!coordinator.sold_loaded());
        select(&grid, A);

        let err = block_on(coordinator.purchase(&grid)).expect_err("purchase should be refused");

        assert!(matches!(err, PurchaseError::SoldUnavailable(StorageError::Deserialize(_))));
        assert_eq!(coordinator.storage().raw(SOLD_STORAGE_KEY).as_deref(), Some(record));
        assert_eq!(grid.borrow().store().selected(), &[A]);
        assert!(toasts.borrow().is_empty());
    }

    #[test]
    fn purchase_rereads_sold_once_storage_recovers() {
        let coordinator = PurchaseCoordinator::new(MemoryStore::default(), |_: &str| {});
        coordinator.storage().insert_raw(SOLD_STORAGE_KEY, "{not json");
        let grid = active_grid();
        assert!(block_on(coordinator.load_sold(&grid)).is_err());
        select(&grid, A);
        select(&grid, B);

        coordinator
            .storage()
            .insert_raw(SOLD_STORAGE_KEY, r#"[{"lat":10.0,"lng":20.0}]"#);
        let outcome = block_on(coordinator.purchase(&grid)).expect("purchase");

        assert_eq!(outcome, PurchaseOutcome::Completed { count: 1 });
        assert!(coordinator.sold_loaded());
        assert_eq!(grid.borrow().store().sold(), &[A, B]);
        let stored: Option<Vec<TileIdentity>> =
            block_on(coordinator.storage().get(SOLD_STORAGE_KEY)).expect("read back");
        assert_eq!(stored, Some(vec![A, B]));
    }

    #[test]
    fn degenerate_sold_entries_are_kept() {
        let coordinator = PurchaseCoordinator::new(MemoryStore::default(), |_: &str| {});
        coordinator.storage().insert_raw(
            SOLD_STORAGE_KEY,
            r#"[{"lat":10.0,"lng":20.0},{"lat":1.0,"lng":null}]"#,
        );
        let grid = active_grid();
        assert_eq!(block_on(coordinator.load_sold(&grid)).expect("load"), 2);
        select(&grid, B);

        block_on(coordinator.purchase(&grid)).expect("purchase");

        assert_eq!(
            coordinator.storage().raw(SOLD_STORAGE_KEY).as_deref(),
            Some(r#"[{"lat":10.0,"lng":20.0},{"lat":1.0,"lng":null},{"lat":10.0,"lng":20.04}]"#)
        );
    }

    #[test]
    fn empty_selection_short_circuits() {
        let toasts = RefCell::new(Vec::<String>::new());
        let coordinator = PurchaseCoordinator::new(MemoryStore::default(), |m: &str| {
            toasts.borrow_mut().push(m.to_owned())
        });
        let grid = active_grid();

        let outcome = block_on(coordinator.purchase(&grid)).expect("purchase");

        assert_eq!(outcome, PurchaseOutcome::NothingSelected);
        assert_eq!(coordinator.storage().raw(SOLD_STORAGE_KEY), None);
        assert!(toasts.borrow().is_empty());
    }

    #[test]
    fn load_sold_handles_absent_and_duplicate_entries() {
        let coordinator = PurchaseCoordinator::new(MemoryStore::default(), |_: &str| {});
        let grid = RefCell::new(GridOverlay::default());
        assert_eq!(block_on(coordinator.load_sold(&grid)).expect("load"), 0);

        coordinator.storage().insert_raw(
            SOLD_STORAGE_KEY,
            r#"[{"lat":10.0,"lng":20.0},{"lat":10.0,"lng":20.04},{"lat":10.0,"lng":20.0}]"#,
        );
        assert_eq!(block_on(coordinator.load_sold(&grid)).expect("load"), 2);
        assert_eq!(grid.borrow().store().sold(), &[A, B]);
    }

    #[test]
    fn malformed_sold_record_is_reported() {
        let coordinator = PurchaseCoordinator::new(MemoryStore::default(), |_: &str| {});
        coordinator.storage().insert_raw(SOLD_STORAGE_KEY, r#"{"lat":1}"#);
        let grid = RefCell::new(GridOverlay::default());
        let err = block_on(coordinator.load_sold(&grid)).expect_err("load should fail");
        assert!(matches!(err, StorageError::Deserialize(_)));
        assert!(grid.borrow().store().sold().is_empty());
    }

    #[test]
    fn begin_snapshots_without_mutating() {
        let coordinator = PurchaseCoordinator::new(MemoryStore::default(), |_: &str| {});
        let grid = active_grid();
        select(&grid, B);
        let pending = coordinator.begin(&grid.borrow()).expect("pending");
        assert_eq!(pending.purchased(), &[B]);
        assert_eq!(pending.combined(), &[B]);
        assert_eq!(grid.borrow().store().selected_len(), 1);
        assert!(grid.borrow().store().sold().is_empty());
    }
}

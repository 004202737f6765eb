use std::collections::HashMap;

use crate::config::GridConfig;
use crate::geo::{PixelPoint, TileCoord};
use crate::identity::{CoordinateQuantizer, TileIdentity};
use crate::map::MapProvider;
use crate::render::{SELECTED_CLASS, TileRenderer, TileStatus, TileSurface};
use crate::selection::{SelectionStore, ToggleOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Activated,
    Deactivated,
    Unchanged,
}

/// One materialized grid box. Carries its own resolved identity so clicks
/// never have to recompute it.
#[derive(Debug, Clone)]
pub struct GridTile {
    pub coord: TileCoord,
    pub identity: TileIdentity,
    pub surface: TileSurface,
    selected_class: bool,
}

impl GridTile {
    pub fn has_class(&self, class: &str) -> bool {
        class == SELECTED_CLASS && self.selected_class
    }

    pub fn is_highlighted(&self) -> bool {
        self.selected_class
    }
}

/// Live tiles of an active overlay, keyed by their unwrapped coordinate.
#[derive(Debug, Default)]
struct GridLayer {
    tiles: HashMap<TileCoord, GridTile>,
}

/// The purchase grid. Exists only at the activation zoom; owns the selection
/// state and every live tile.
#[derive(Debug, Default)]
pub struct GridOverlay {
    config: GridConfig,
    quantizer: CoordinateQuantizer,
    renderer: TileRenderer,
    store: SelectionStore,
    zoom: Option<u8>,
    layer: Option<GridLayer>,
}

impl GridOverlay {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            quantizer: CoordinateQuantizer::new(config),
            renderer: TileRenderer::new(config),
            store: SelectionStore::default(),
            zoom: None,
            layer: None,
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.layer.is_some()
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut SelectionStore {
        &mut self.store
    }

    pub fn tiles(&self) -> impl Iterator<Item = &GridTile> {
        self.layer.iter().flat_map(|layer| layer.tiles.values())
    }

    pub fn tile_count(&self) -> usize {
        self.layer.as_ref().map_or(0, |layer| layer.tiles.len())
    }

    /// Zoom gate. Call on every zoom change of the host map.
    pub fn on_zoom_changed(&mut self, zoom: u8) -> Transition {
        self.zoom = Some(zoom);
        if zoom == self.config.activation_zoom {
            if self.layer.is_some() {
                return Transition::Unchanged;
            }
            self.activate();
            Transition::Activated
        } else if self.layer.is_some() {
            self.deactivate();
            Transition::Deactivated
        } else {
            Transition::Unchanged
        }
    }

    fn activate(&mut self) {
        self.store.reset_selection();
        self.layer = Some(GridLayer::default());
        tracing::info!(zoom = self.config.activation_zoom, "grid overlay activated");
    }

    fn deactivate(&mut self) {
        let released = self.layer.take().map_or(0, |layer| layer.tiles.len());
        self.store.reset_selection();
        tracing::info!(released, "grid overlay deactivated");
    }

    /// Tear down and, if the map still sits at the activation zoom, start over
    /// so every tile re-reads its status.
    pub fn rebuild(&mut self) -> bool {
        if self.layer.is_some() {
            self.deactivate();
        }
        if self.zoom == Some(self.config.activation_zoom) {
            self.activate();
        }
        self.is_active()
    }

    /// Replace the sold set and re-render live tiles in place. Selected boxes
    /// that turn out to be sold are dropped from the selection; returns how
    /// many were.
    pub fn apply_sold(&mut self, sold: impl IntoIterator<Item = TileIdentity>) -> usize {
        let taken = self.store.load_sold(sold);
        if let Some(layer) = self.layer.as_mut() {
            for tile in layer.tiles.values_mut() {
                let status = self.store.status_of(&tile.identity);
                tile.surface = self.renderer.render(&tile.identity, status);
                tile.selected_class = status == TileStatus::Selected;
            }
        }
        taken
    }

    /// Materialize one box. Returns the live tile, or `None` while inactive or
    /// for a coordinate the grid does not cover.
    pub fn create_tile(&mut self, map: &impl MapProvider, coord: TileCoord) -> Option<&GridTile> {
        if coord.z != self.config.activation_zoom {
            return None;
        }
        self.quantizer.normalize(coord)?;

        let Self {
            quantizer,
            renderer,
            store,
            layer,
            ..
        } = self;
        let layer = layer.as_mut()?;
        let tile = layer.tiles.entry(coord).or_insert_with(|| {
            let identity = quantizer.identity(map, coord);
            let status = store.status_of(&identity);
            GridTile {
                coord,
                identity,
                surface: renderer.render(&identity, status),
                selected_class: status == TileStatus::Selected,
            }
        });
        Some(tile)
    }

    pub fn release_tile(&mut self, coord: TileCoord) -> bool {
        self.layer
            .as_mut()
            .is_some_and(|layer| layer.tiles.remove(&coord).is_some())
    }

    /// Bring the live tile set in line with what the map shows: create the
    /// visible boxes that are missing and drop the ones scrolled out of view.
    /// Returns how many tiles were created.
    pub fn sync_tiles(&mut self, map: &impl MapProvider) -> usize {
        let z = self.config.activation_zoom;
        if self.layer.is_none() || map.zoom() != z {
            return 0;
        }

        let bounds = map.pixel_bounds();
        if bounds.is_empty() {
            return 0;
        }
        let size = self.config.tile_size_px();
        let min_x = (bounds.min.x / size).floor() as i64;
        let min_y = (bounds.min.y / size).floor() as i64;
        let max_x = (bounds.max.x / size).ceil() as i64 - 1;
        let max_y = (bounds.max.y / size).ceil() as i64 - 1;

        if let Some(layer) = self.layer.as_mut() {
            layer.tiles.retain(|coord, _| {
                (min_x..=max_x).contains(&coord.x) && (min_y..=max_y).contains(&coord.y)
            });
        }

        let before = self.tile_count();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                self.create_tile(map, TileCoord::new(x, y, z));
            }
        }
        let created = self.tile_count() - before;
        if created > 0 {
            tracing::debug!(created, live = self.tile_count(), "grid tiles created");
        }
        created
    }

    /// Live tile under a container (screen) point.
    pub fn tile_at(&self, map: &impl MapProvider, point: PixelPoint) -> Option<&GridTile> {
        let layer = self.layer.as_ref()?;
        let px = map.container_to_pixel(point);
        let size = self.config.tile_size_px();
        let coord = TileCoord::new(
            (px.x / size).floor() as i64,
            (px.y / size).floor() as i64,
            self.config.activation_zoom,
        );
        layer.tiles.get(&coord)
    }

    /// Click handler for the box with `identity`. `None` while inactive or
    /// when no live tile carries `identity`.
    pub fn click(&mut self, identity: TileIdentity) -> Option<ToggleOutcome> {
        let layer = self.layer.as_mut()?;
        if !layer.tiles.values().any(|tile| tile.identity == identity) {
            return None;
        }
        let outcome = self.store.toggle_selected(identity);
        if outcome != ToggleOutcome::RejectedSold {
            let on = outcome == ToggleOutcome::Added;
            for tile in layer.tiles.values_mut() {
                if tile.identity == identity {
                    tile.selected_class = on;
                }
            }
        }
        tracing::debug!(
            lat = identity.lat,
            lng = identity.lng,
            ?outcome,
            selected = self.store.selected_len(),
            "grid tile clicked"
        );
        Some(outcome)
    }

    pub fn click_at(&mut self, map: &impl MapProvider, point: PixelPoint) -> Option<ToggleOutcome> {
        let identity = self.tile_at(map, point)?.identity;
        self.click(identity)
    }
}

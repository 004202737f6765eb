/// Zoom level at which the purchase grid is materialized.
pub const ACTIVATION_ZOOM: u8 = 20;
/// Edge length of one grid box in screen pixels.
pub const TILE_SIZE: u32 = 40;
pub const OVERLAY_OPACITY: f64 = 0.8;

pub const MIN_MAP_ZOOM: u8 = 0;
pub const MAX_MAP_ZOOM: u8 = 20;
/// Edge length of a base map tile; the projection's pixel space is built on it.
pub const BASE_TILE_SIZE: f64 = 256.0;

pub const SOLD_STORAGE_KEY: &str = "boxes";
pub const PURCHASE_SUCCESS_MESSAGE: &str = "Boxes bought successfully!";

/// Fixed grid parameters, bundled so the overlay and renderer agree on them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub activation_zoom: u8,
    pub tile_size: u32,
    pub opacity: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            activation_zoom: ACTIVATION_ZOOM,
            tile_size: TILE_SIZE,
            opacity: OVERLAY_OPACITY,
        }
    }
}

impl GridConfig {
    pub fn tile_size_px(&self) -> f64 {
        self.tile_size as f64
    }

    /// Number of grid columns (and rows) spanning the world at `zoom`.
    /// The last column is partial when the world width is not a multiple of the tile size.
    pub fn world_tiles(&self, zoom: u8) -> i64 {
        let world_px = BASE_TILE_SIZE * 2f64.powi(zoom as i32);
        (world_px / self.tile_size_px()).ceil() as i64
    }
}

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::config::BASE_TILE_SIZE;

const EARTH_RADIUS: f64 = 6_378_137.0;
const MAX_LATITUDE: f64 = 85.051_128_779_8;
const DEG: f64 = PI / 180.0;

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// A point in projected pixel space at some zoom, or in container (screen) space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// Axis-aligned pixel rectangle; `max` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBounds {
    pub min: PixelPoint,
    pub max: PixelPoint,
}

impl PixelBounds {
    pub const fn new(min: PixelPoint, max: PixelPoint) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }
}

/// Grid cell address: column `x`, row `y` at zoom `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: i64,
    pub y: i64,
    pub z: u8,
}

impl TileCoord {
    pub const fn new(x: i64, y: i64, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Pixel-space position of the cell's top-left corner.
    pub fn north_west(&self, tile_size: f64) -> PixelPoint {
        PixelPoint::new(self.x as f64 * tile_size, self.y as f64 * tile_size)
    }
}

/// EPSG:3857 spherical Mercator with the usual 256px-per-tile pixel space.
#[derive(Debug, Clone, Copy, Default)]
pub struct SphericalMercator;

impl SphericalMercator {
    pub fn world_size(zoom: f64) -> f64 {
        BASE_TILE_SIZE * 2f64.powf(zoom)
    }

    pub fn project(&self, latlng: LatLng, zoom: f64) -> PixelPoint {
        let lat = latlng.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let sin_lat = (lat * DEG).sin();
        let mx = EARTH_RADIUS * latlng.lng * DEG;
        let my = EARTH_RADIUS * ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / 2.0;

        let k = 0.5 / (PI * EARTH_RADIUS);
        let size = Self::world_size(zoom);
        PixelPoint::new(size * (k * mx + 0.5), size * (-k * my + 0.5))
    }

    pub fn unproject(&self, point: PixelPoint, zoom: f64) -> LatLng {
        let k = 0.5 / (PI * EARTH_RADIUS);
        let size = Self::world_size(zoom);
        let mx = (point.x / size - 0.5) / k;
        let my = (point.y / size - 0.5) / -k;

        LatLng::new(
            (2.0 * (my / EARTH_RADIUS).exp().atan() - PI / 2.0) / DEG,
            mx / DEG / EARTH_RADIUS,
        )
    }
}

use boxmap_shared::config::{MAX_MAP_ZOOM, MIN_MAP_ZOOM};
use boxmap_shared::{LatLng, MapProvider, PixelBounds, PixelPoint, SphericalMercator};

/// Slippy-map view: an integer zoom and the pixel-space center at that zoom.
/// Container coordinates are CSS pixels relative to the canvas top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center_px: PixelPoint,
    pub zoom: u8,
    pub width: f64,
    pub height: f64,
}

impl Default for MapView {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 1, 1200.0, 800.0)
    }
}

impl MapView {
    pub fn new(center: LatLng, zoom: u8, width: f64, height: f64) -> Self {
        let zoom = zoom.clamp(MIN_MAP_ZOOM, MAX_MAP_ZOOM);
        Self {
            center_px: SphericalMercator.project(center, zoom as f64),
            zoom,
            width,
            height,
        }
    }

    pub fn center(&self) -> LatLng {
        SphericalMercator.unproject(self.center_px, self.zoom as f64)
    }

    pub fn set_view(&mut self, center: LatLng, zoom: u8) {
        let zoom = zoom.clamp(MIN_MAP_ZOOM, MAX_MAP_ZOOM);
        self.zoom = zoom;
        self.center_px = SphericalMercator.project(center, zoom as f64);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Pixel-space position of the container's top-left corner.
    pub fn pixel_origin(&self) -> PixelPoint {
        self.center_px.offset(-self.width / 2.0, -self.height / 2.0)
    }

    pub fn pixel_to_container(&self, point: PixelPoint) -> PixelPoint {
        let origin = self.pixel_origin();
        PixelPoint::new(point.x - origin.x, point.y - origin.y)
    }

    pub fn latlng_to_container(&self, latlng: LatLng) -> PixelPoint {
        self.pixel_to_container(SphericalMercator.project(latlng, self.zoom as f64))
    }

    /// Drag the map by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let world = SphericalMercator::world_size(self.zoom as f64);
        self.center_px = PixelPoint::new(
            self.center_px.x - dx,
            (self.center_px.y - dy).clamp(0.0, world),
        );
    }

    /// Step the zoom by `steps` levels, keeping the container point
    /// (`screen_x`, `screen_y`) over the same geographic spot.
    /// Returns whether the zoom changed.
    pub fn zoom_at(&mut self, steps: i32, screen_x: f64, screen_y: f64) -> bool {
        let target = (self.zoom as i32 + steps).clamp(MIN_MAP_ZOOM as i32, MAX_MAP_ZOOM as i32) as u8;
        if target == self.zoom {
            return false;
        }
        let factor = 2f64.powi(target as i32 - self.zoom as i32);
        let focus = self.pixel_origin().offset(screen_x, screen_y).scale(factor);
        let origin = focus.offset(-screen_x, -screen_y);
        self.center_px = origin.offset(self.width / 2.0, self.height / 2.0);
        self.zoom = target;
        true
    }

    /// Zoom around the container center.
    pub fn zoom_by(&mut self, steps: i32) -> bool {
        self.zoom_at(steps, self.width / 2.0, self.height / 2.0)
    }
}

impl MapProvider for MapView {
    fn zoom(&self) -> u8 {
        self.zoom
    }

    fn unproject(&self, point: PixelPoint, zoom: u8) -> LatLng {
        SphericalMercator.unproject(point, zoom as f64)
    }

    fn container_to_pixel(&self, point: PixelPoint) -> PixelPoint {
        let origin = self.pixel_origin();
        point.offset(origin.x, origin.y)
    }

    fn pixel_bounds(&self) -> PixelBounds {
        let origin = self.pixel_origin();
        PixelBounds::new(origin, origin.offset(self.width, self.height))
    }
}

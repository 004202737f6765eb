use crate::geo::{LatLng, PixelBounds, PixelPoint};

/// What the grid needs from the host map.
///
/// The host owns projection and the viewport; the grid only asks it to
/// translate between container, pixel and geographic space.
pub trait MapProvider {
    /// Current integer zoom level.
    fn zoom(&self) -> u8;

    /// Pixel-space point to geographic position at `zoom`.
    fn unproject(&self, point: PixelPoint, zoom: u8) -> LatLng;

    /// Container (screen) point to pixel space at the current zoom.
    fn container_to_pixel(&self, point: PixelPoint) -> PixelPoint;

    /// Pixel-space rectangle currently visible.
    fn pixel_bounds(&self) -> PixelBounds;
}

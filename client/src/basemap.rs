use std::collections::{HashMap, HashSet};

use boxmap_shared::config::BASE_TILE_SIZE;
use boxmap_shared::{MapProvider, PixelBounds, PixelPoint};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::viewport::MapView;

pub const ATTRIBUTION: &str = "© OpenStreetMap contributors";
const TILE_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

type ImageKey = (u8, i64, i64);

/// One raster tile placement. `x` is wrapped into the world; `origin` is
/// the pixel-space top-left of the (possibly unwrapped) slot it fills.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseTile {
    pub z: u8,
    pub x: i64,
    pub y: i64,
    pub origin: PixelPoint,
}

impl BaseTile {
    fn key(&self) -> ImageKey {
        (self.z, self.x, self.y)
    }
}

pub fn base_tile_url(z: u8, x: i64, y: i64) -> String {
    TILE_URL_TEMPLATE
        .replace("{z}", &z.to_string())
        .replace("{x}", &x.to_string())
        .replace("{y}", &y.to_string())
}

/// Raster tiles covering `bounds` at `zoom`. Rows outside the world are
/// skipped; columns wrap around the antimeridian.
pub fn visible_base_tiles(bounds: PixelBounds, zoom: u8) -> Vec<BaseTile> {
    if bounds.is_empty() {
        return Vec::new();
    }
    let count = 1i64 << zoom;
    let min_x = (bounds.min.x / BASE_TILE_SIZE).floor() as i64;
    let max_x = (bounds.max.x / BASE_TILE_SIZE).ceil() as i64 - 1;
    let min_y = ((bounds.min.y / BASE_TILE_SIZE).floor() as i64).max(0);
    let max_y = ((bounds.max.y / BASE_TILE_SIZE).ceil() as i64 - 1).min(count - 1);

    let mut tiles = Vec::new();
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            tiles.push(BaseTile {
                z: zoom,
                x: x.rem_euclid(count),
                y,
                origin: PixelPoint::new(x as f64 * BASE_TILE_SIZE, y as f64 * BASE_TILE_SIZE),
            });
        }
    }
    tiles
}

/// OpenStreetMap raster layer drawn underneath the grid.
///
/// Images are cached per tile and dropped once they leave the view or the
/// zoom changes. Every image shares one `onload` handler that asks for a
/// repaint.
pub struct BaseMap {
    images: HashMap<ImageKey, HtmlImageElement>,
    onload: Closure<dyn FnMut()>,
}

impl BaseMap {
    pub fn new(on_ready: impl Fn() + 'static) -> Self {
        Self {
            images: HashMap::new(),
            onload: Closure::<dyn FnMut()>::new(on_ready),
        }
    }

    pub fn draw(&mut self, ctx: &CanvasRenderingContext2d, view: &MapView) {
        let tiles = visible_base_tiles(view.pixel_bounds(), view.zoom());
        let wanted: HashSet<ImageKey> = tiles.iter().map(BaseTile::key).collect();

        self.images.retain(|key, img| {
            let keep = wanted.contains(key);
            if !keep {
                img.set_onload(None);
            }
            keep
        });

        for tile in &tiles {
            let Some(img) = self.image_for(tile) else {
                continue;
            };
            if !img.complete() || img.natural_width() == 0 {
                continue;
            }
            let at = view.pixel_to_container(tile.origin);
            let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
                img,
                at.x,
                at.y,
                BASE_TILE_SIZE,
                BASE_TILE_SIZE,
            );
        }
    }

    fn image_for(&mut self, tile: &BaseTile) -> Option<&HtmlImageElement> {
        if !self.images.contains_key(&tile.key()) {
            let img = match HtmlImageElement::new() {
                Ok(img) => img,
                Err(e) => {
                    tracing::warn!(error = ?e, "cannot create tile image");
                    return None;
                }
            };
            img.set_onload(Some(self.onload.as_ref().unchecked_ref()));
            img.set_src(&base_tile_url(tile.z, tile.x, tile.y));
            self.images.insert(tile.key(), img);
        }
        self.images.get(&tile.key())
    }
}

impl Drop for BaseMap {
    fn drop(&mut self) {
        for img in self.images.values() {
            img.set_onload(None);
        }
    }
}

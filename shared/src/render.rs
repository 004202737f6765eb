use crate::config::GridConfig;
use crate::identity::TileIdentity;

/// Purchase state of one box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileStatus {
    Sold,
    Selected,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Format as a CSS color string.
    pub fn css(&self) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

pub const SOLD_BORDER: Rgba = Rgba::new(255, 0, 0, 1.0);
pub const NEUTRAL_BORDER: Rgba = Rgba::new(128, 128, 128, 1.0);

/// Class toggled on a tile while it is selected.
pub const SELECTED_CLASS: &str = "border-show";
/// Stroke painted for [`SELECTED_CLASS`], on top of the tile's own border.
pub const SELECTED_HIGHLIGHT: Rgba = Rgba::new(56, 128, 255, 1.0);
pub const SELECTED_HIGHLIGHT_WIDTH: f64 = 3.0;

/// A rendered tile: a fixed-size surface with a one-pixel closed border path.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSurface {
    pub width: u32,
    pub height: u32,
    pub border: Rgba,
    pub opacity: f64,
    pub path: [(f64, f64); 4],
}

impl TileSurface {
    pub fn border_css(&self) -> String {
        self.border.css()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TileRenderer {
    config: GridConfig,
}

impl TileRenderer {
    pub fn new(config: GridConfig) -> Self {
        Self { config }
    }

    /// Draw one box. Selected boxes keep the neutral border; their highlight
    /// comes from [`SELECTED_CLASS`] applied by the overlay.
    pub fn render(&self, _identity: &TileIdentity, status: TileStatus) -> TileSurface {
        let size = self.config.tile_size;
        let edge = size.saturating_sub(1) as f64;
        let border = match status {
            TileStatus::Sold => SOLD_BORDER,
            TileStatus::Selected | TileStatus::None => NEUTRAL_BORDER,
        };
        TileSurface {
            width: size,
            height: size,
            border,
            opacity: self.config.opacity,
            path: [(0.0, 0.0), (edge, 0.0), (edge, edge), (0.0, edge)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sold_is_red_and_others_grey() {
        let r = TileRenderer::default();
        let id = TileIdentity::new(10.0, 20.0);
        assert_eq!(r.render(&id, TileStatus::Sold).border, SOLD_BORDER);
        assert_eq!(r.render(&id, TileStatus::None).border, NEUTRAL_BORDER);
        assert_eq!(r.render(&id, TileStatus::Selected).border, NEUTRAL_BORDER);
    }

    #[test]
    fn surface_is_tile_sized_with_inset_border() {
        let surface = TileRenderer::default().render(&TileIdentity::new(0.0, 0.0), TileStatus::None);
        assert_eq!((surface.width, surface.height), (40, 40));
        assert_eq!(surface.path[2], (39.0, 39.0));
        assert_eq!(surface.opacity, 0.8);
    }

    #[test]
    fn css_formats_rgba() {
        assert_eq!(SOLD_BORDER.css(), "rgba(255,0,0,1)");
    }
}

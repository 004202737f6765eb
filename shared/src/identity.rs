use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::GridConfig;
use crate::geo::{LatLng, TileCoord};
use crate::map::MapProvider;

/// Identity comparisons happen on a nanodegree grid (~0.1 mm at the equator).
const KEY_SCALE: f64 = 1e9;
/// Key used for any non-finite coordinate component.
const DEGENERATE_KEY: i64 = i64::MIN;

/// Quantized form of a [`TileIdentity`]; equality and hashing go through this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub lat_nd: i64,
    pub lng_nd: i64,
}

fn quantize(deg: f64) -> i64 {
    if !deg.is_finite() {
        return DEGENERATE_KEY;
    }
    (deg * KEY_SCALE).round() as i64
}

/// JSON writes non-finite floats as `null`; read them back as NaN.
fn degree_or_nan<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Geographic anchor (top-left corner) of one grid box. This is also the
/// persisted record: `{"lat": .., "lng": ..}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TileIdentity {
    #[serde(deserialize_with = "degree_or_nan")]
    pub lat: f64,
    #[serde(deserialize_with = "degree_or_nan")]
    pub lng: f64,
}

impl TileIdentity {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn key(&self) -> IdentityKey {
        IdentityKey {
            lat_nd: quantize(self.lat),
            lng_nd: quantize(self.lng),
        }
    }

    pub fn latlng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Unprojection produced something outside the geographic domain.
    /// Such identities stay usable as keys.
    pub fn is_degenerate(&self) -> bool {
        !self.lat.is_finite()
            || !self.lng.is_finite()
            || self.lat.abs() > 90.0
            || self.lng.abs() > 180.0
    }
}

impl From<LatLng> for TileIdentity {
    fn from(ll: LatLng) -> Self {
        Self::new(ll.lat, ll.lng)
    }
}

impl PartialEq for TileIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TileIdentity {}

impl Hash for TileIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Turns grid cell addresses into stable geographic identities.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateQuantizer {
    config: GridConfig,
}

impl CoordinateQuantizer {
    pub fn new(config: GridConfig) -> Self {
        Self { config }
    }

    /// Wrap the column around the antimeridian. Rows outside the world are
    /// rejected rather than wrapped.
    pub fn normalize(&self, coord: TileCoord) -> Option<TileCoord> {
        let span = self.config.world_tiles(coord.z);
        if coord.y < 0 || coord.y >= span {
            return None;
        }
        Some(TileCoord::new(coord.x.rem_euclid(span), coord.y, coord.z))
    }

    /// Identity of the cell at `coord`: the unprojected top-left pixel.
    /// Pure in (coord, map projection); columns are wrapped first so every
    /// copy of a cell across the antimeridian resolves to the same identity.
    pub fn identity(&self, map: &impl MapProvider, coord: TileCoord) -> TileIdentity {
        let span = self.config.world_tiles(coord.z);
        let wrapped = TileCoord::new(coord.x.rem_euclid(span), coord.y, coord.z);
        let nw = wrapped.north_west(self.config.tile_size_px());
        let identity = TileIdentity::from(map.unproject(nw, coord.z));
        if identity.is_degenerate() {
            tracing::trace!(x = coord.x, y = coord.y, z = coord.z, "degenerate tile identity");
        }
        identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::PixelPoint;
    use crate::map::testing::FixedMap;

    fn map() -> FixedMap {
        FixedMap::at(20, PixelPoint::new(0.0, 0.0), 800.0, 600.0)
    }

    #[test]
    fn same_coord_yields_equal_identity() {
        let q = CoordinateQuantizer::default();
        let coord = TileCoord::new(3_500_000, 2_100_000, 20);
        let a = q.identity(&map(), coord);
        let b = q.identity(&map(), coord);
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn neighbouring_cells_differ() {
        let q = CoordinateQuantizer::default();
        let a = q.identity(&map(), TileCoord::new(3_500_000, 2_100_000, 20));
        let b = q.identity(&map(), TileCoord::new(3_500_001, 2_100_000, 20));
        assert_ne!(a, b);
        assert_eq!(a.lat, b.lat);
        assert!(b.lng > a.lng);
    }

    #[test]
    fn identity_is_top_left_corner() {
        let q = CoordinateQuantizer::default();
        let id = q.identity(&map(), TileCoord::new(0, 0, 20));
        assert!((id.lng + 180.0).abs() < 1e-9);
        assert!(id.lat > 85.0);
    }

    #[test]
    fn wrapped_column_resolves_to_same_identity() {
        let q = CoordinateQuantizer::default();
        let span = GridConfig::default().world_tiles(20);
        let a = q.identity(&map(), TileCoord::new(12, 40, 20));
        let b = q.identity(&map(), TileCoord::new(12 + span, 40, 20));
        let c = q.identity(&map(), TileCoord::new(12 - span, 40, 20));
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn normalize_rejects_rows_outside_world() {
        let q = CoordinateQuantizer::default();
        let span = GridConfig::default().world_tiles(20);
        assert_eq!(q.normalize(TileCoord::new(0, -1, 20)), None);
        assert_eq!(q.normalize(TileCoord::new(0, span, 20)), None);
        assert_eq!(
            q.normalize(TileCoord::new(-1, 5, 20)),
            Some(TileCoord::new(span - 1, 5, 20))
        );
    }

    #[test]
    fn equality_tolerates_sub_nanodegree_noise() {
        let a = TileIdentity::new(10.0, 20.0);
        let b = TileIdentity::new(10.0 + 1e-12, 20.0 - 1e-12);
        assert_eq!(a, b);
        assert_ne!(a, TileIdentity::new(10.0, 20.000_001));
    }

    #[test]
    fn non_finite_components_share_sentinel_key() {
        let a = TileIdentity::new(f64::NAN, 1.0);
        let b = TileIdentity::new(f64::INFINITY, 1.0);
        assert!(a.is_degenerate());
        assert_eq!(a, b);
        assert_eq!(a.key().lat_nd, i64::MIN);
    }

    #[test]
    fn serializes_as_lat_lng_object() {
        let json = serde_json::to_string(&TileIdentity::new(10.0, 20.04)).expect("serialize");
        assert_eq!(json, r#"{"lat":10.0,"lng":20.04}"#);
    }

    #[test]
    fn degenerate_identity_survives_storage() {
        let degenerate = TileIdentity::new(1.0, f64::NAN);
        let json = serde_json::to_string(&degenerate).expect("serialize");
        assert_eq!(json, r#"{"lat":1.0,"lng":null}"#);

        let back: TileIdentity = serde_json::from_str(&json).expect("deserialize");
        assert!(back.is_degenerate());
        assert_eq!(back, degenerate);
    }
}

pub mod config;
pub mod error;
pub mod geo;
pub mod identity;
pub mod map;
pub mod notify;
pub mod overlay;
pub mod purchase;
pub mod render;
pub mod selection;
pub mod storage;

pub use config::GridConfig;
pub use error::{PurchaseError, StorageError};
pub use geo::{LatLng, PixelBounds, PixelPoint, SphericalMercator, TileCoord};
pub use identity::{CoordinateQuantizer, IdentityKey, TileIdentity};
pub use map::MapProvider;
pub use notify::Notifier;
pub use overlay::{GridOverlay, GridTile, Transition};
pub use purchase::{PendingPurchase, PurchaseCoordinator, PurchaseOutcome};
pub use render::{Rgba, TileRenderer, TileStatus, TileSurface};
pub use selection::{SelectionStore, ToggleOutcome};
pub use storage::{KeyValueStore, MemoryStore};

//! Shared coordinate types and configuration for the tilestream engine.
//!
//! # Invariants
//! - Coordinate values are plain `Copy` data; transforms return new values.
//! - Configuration is validated once and then treated as immutable.

pub mod config;
pub mod types;

pub use config::{
    ConfigError, ElevationConfig, ItemConfig, KindThresholds, NoiseOctave, Range, TileConfig,
};
pub use types::{GeoError, GeoPoint, PlanarPoint, TileBounds, TileKey, normalize_longitude};

pub fn crate_info() -> &'static str {
    "tilestream-common v0.1.0"
}

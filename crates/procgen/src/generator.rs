use serde::{Deserialize, Serialize};
use tilestream_common::{ConfigError, GeoPoint, TileBounds, TileConfig, TileKey};
use tilestream_geo::TileGrid;

use crate::heightfield::Heightfield;
use crate::items::{ContextualItem, place_items};
use crate::random::tile_seed;

/// Everything synthesized for one tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileContent {
    pub key: TileKey,
    /// Grid coordinate the tile was generated from; also its center.
    pub origin: GeoPoint,
    pub bounds: TileBounds,
    pub heightfield: Heightfield,
    pub items: Vec<ContextualItem>,
}

/// Pure tile synthesizer.
///
/// Output depends only on the grid coordinate and the configuration captured
/// at construction; there is no hidden state.
#[derive(Debug, Clone)]
pub struct Generator {
    config: TileConfig,
    grid: TileGrid,
}

impl Generator {
    pub fn new(config: TileConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = TileGrid::new(config.block_size_meters)?;
        Ok(Self { config, grid })
    }

    pub fn config(&self) -> &TileConfig {
        &self.config
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Generate the tile centered on the given grid coordinate.
    pub fn generate(&self, grid_lat: f64, grid_lon: f64) -> TileContent {
        let key = self.grid.key_for(GeoPoint::new(grid_lat, grid_lon));
        let bounds = self.grid.bounds_around(grid_lat, grid_lon);
        let heightfield = Heightfield::synthesize(
            &bounds,
            grid_lat,
            grid_lon,
            self.config.heightfield_resolution,
            &self.config.elevation,
        );
        let seed = tile_seed(grid_lat, grid_lon);
        let items = place_items(key, seed, &bounds, &heightfield, &self.config.items);

        tracing::trace!(%key, seed, items = items.len(), "generated tile");

        TileContent {
            key,
            origin: GeoPoint::new(grid_lat, grid_lon),
            bounds,
            heightfield,
            items,
        }
    }

    /// Generate the tile identified by `key`.
    pub fn generate_key(&self, key: TileKey) -> TileContent {
        let c = self.grid.center(key);
        self.generate(c.latitude, c.longitude)
    }
}

use std::time::SystemTime;

use tilestream_common::{GeoPoint, TileBounds, TileKey};
use tilestream_procgen::{ContextualItem, Heightfield, TileContent};

/// A resident tile.
///
/// Only the tile manager's load path constructs tiles. Consumers receive them
/// as shared, read-only `Arc<Tile>` handles.
#[derive(Debug)]
pub struct Tile {
    key: TileKey,
    center: GeoPoint,
    bounds: TileBounds,
    heightfield: Heightfield,
    items: Vec<ContextualItem>,
    loaded_at: SystemTime,
}

impl Tile {
    pub(crate) fn from_content(content: TileContent) -> Self {
        Self {
            key: content.key,
            center: content.origin,
            bounds: content.bounds,
            heightfield: content.heightfield,
            items: content.items,
            loaded_at: SystemTime::now(),
        }
    }

    pub fn key(&self) -> TileKey {
        self.key
    }

    /// Grid coordinate the tile was generated from.
    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn bounds(&self) -> &TileBounds {
        &self.bounds
    }

    pub fn heightfield(&self) -> &Heightfield {
        &self.heightfield
    }

    pub fn items(&self) -> &[ContextualItem] {
        &self.items
    }

    pub fn loaded_at(&self) -> SystemTime {
        self.loaded_at
    }

    /// Interpolated ground elevation at `p`, if it lies on this tile.
    pub fn elevation_at(&self, p: GeoPoint) -> Option<f64> {
        if !self.bounds.contains(p) {
            return None;
        }
        let u = (p.longitude - self.bounds.west) / self.bounds.lon_span();
        let v = (p.latitude - self.bounds.south) / self.bounds.lat_span();
        Some(self.heightfield.sample_bilinear(u, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilestream_common::TileConfig;
    use tilestream_procgen::Generator;

    #[test]
    fn tile_carries_generated_content() {
        let generator = Generator::new(TileConfig::default()).unwrap();
        let content = generator.generate(0.0, 0.0);
        let tile = Tile::from_content(content.clone());

        assert_eq!(tile.key(), content.key);
        assert_eq!(tile.center(), GeoPoint::new(0.0, 0.0));
        assert_eq!(tile.heightfield(), &content.heightfield);
        assert_eq!(tile.items(), content.items.as_slice());
        assert!(tile.loaded_at() <= SystemTime::now());
    }

    #[test]
    fn elevation_only_inside_bounds() {
        let generator = Generator::new(TileConfig::default()).unwrap();
        let tile = Tile::from_content(generator.generate(0.0, 0.0));

        let center = tile.elevation_at(GeoPoint::new(0.0, 0.0)).unwrap();
        assert!((0.0..=500.0).contains(&center));

        let sw = GeoPoint::new(tile.bounds().south, tile.bounds().west);
        assert_eq!(tile.elevation_at(sw), Some(tile.heightfield().data[0]));
        assert_eq!(tile.elevation_at(GeoPoint::new(1.0, 1.0)), None);
    }
}

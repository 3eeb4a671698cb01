use serde::{Deserialize, Serialize};
use tilestream_common::{ItemConfig, KindThresholds, TileBounds, TileKey};

use crate::heightfield::Heightfield;
use crate::random::seeded_random;

/// Category of a procedurally placed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Landmark,
    Building,
    Tree,
    Structure,
}

impl ItemKind {
    /// Classify a draw in [0,1) against cumulative thresholds.
    pub fn classify(r: f64, thresholds: &KindThresholds) -> Self {
        if r < thresholds.landmark {
            Self::Landmark
        } else if r < thresholds.building {
            Self::Building
        } else if r < thresholds.tree {
            Self::Tree
        } else {
            Self::Structure
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landmark => "landmark",
            Self::Building => "building",
            Self::Tree => "tree",
            Self::Structure => "structure",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// An object placed on a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextualItem {
    /// `<tile key>_item_<index>`; stable across regenerations.
    pub id: String,
    pub kind: ItemKind,
    pub latitude: f64,
    pub longitude: f64,
    /// Ground elevation under the item.
    pub elevation: f64,
    pub height: f64,
    pub width: f64,
    pub depth: f64,
}

/// Number of items on a tile with the given seed, in `[min, max]` inclusive.
pub fn item_count(seed: u64, config: &ItemConfig) -> usize {
    let span = (config.max_per_tile - config.min_per_tile) as f64 + 1.0;
    config.min_per_tile as usize + (seeded_random(seed) * span).floor() as usize
}

/// Place the items of one tile.
///
/// Item `i` draws from `seed + (i + 1) * stride + k` for its k-th value:
/// position (east, north), kind, height, width, depth. Ground elevation is
/// the nearest heightfield sample.
pub fn place_items(
    key: TileKey,
    seed: u64,
    bounds: &TileBounds,
    heightfield: &Heightfield,
    config: &ItemConfig,
) -> Vec<ContextualItem> {
    let count = item_count(seed, config);
    (0..count)
        .map(|i| {
            let item_seed = seed.wrapping_add((i as u64 + 1).wrapping_mul(config.seed_stride));
            let draw = |k: u64| seeded_random(item_seed.wrapping_add(k));

            let (u, v) = (draw(0), draw(1));
            let position = bounds.lerp(u, v);
            let kind = ItemKind::classify(draw(2), &config.thresholds);
            let height_range = match kind {
                ItemKind::Landmark => config.landmark_height,
                ItemKind::Building => config.building_height,
                ItemKind::Tree => config.tree_height,
                ItemKind::Structure => config.structure_height,
            };

            ContextualItem {
                id: format!("{key}_item_{i}"),
                kind,
                latitude: position.latitude,
                longitude: position.longitude,
                elevation: heightfield.sample_nearest(u, v),
                height: height_range.lerp(draw(3)),
                width: config.footprint.lerp(draw(4)),
                depth: config.footprint.lerp(draw(5)),
            }
        })
        .collect()
}

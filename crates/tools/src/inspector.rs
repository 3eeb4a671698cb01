use std::collections::BTreeMap;

use tilestream_common::{GeoPoint, TileKey};
use tilestream_procgen::ItemKind;
use tilestream_stream::TileManager;

/// Resident-set inspector for developer tooling.
///
/// Read-only queries against a tile manager for debugging and CLI output.
pub struct TileInspector;

impl TileInspector {
    /// Produce a summary of the resident set.
    pub fn summary(manager: &TileManager) -> ResidentSummary {
        let tiles = manager.resident_tiles();
        let mut items_by_kind = BTreeMap::new();
        let mut min_elevation = f64::INFINITY;
        let mut max_elevation = f64::NEG_INFINITY;
        for tile in &tiles {
            for item in tile.items() {
                *items_by_kind.entry(item.kind.as_str()).or_insert(0) += 1;
            }
            min_elevation = min_elevation.min(tile.heightfield().min_elevation);
            max_elevation = max_elevation.max(tile.heightfield().max_elevation);
        }
        let elevation_range = (!tiles.is_empty()).then_some((min_elevation, max_elevation));

        ResidentSummary {
            resident_tiles: tiles.len(),
            listeners: manager.listener_count(),
            observer: manager.last_position(),
            items_by_kind,
            elevation_range,
        }
    }

    /// Details of one resident tile.
    pub fn inspect_tile(manager: &TileManager, key: TileKey) -> Option<TileInfo> {
        manager.tile(&key).map(|tile| {
            let count = |kind: ItemKind| tile.items().iter().filter(|i| i.kind == kind).count();
            let hf = tile.heightfield();
            TileInfo {
                key,
                center: tile.center(),
                resolution: hf.width,
                elevation: (hf.min_elevation, hf.max_elevation),
                landmarks: count(ItemKind::Landmark),
                buildings: count(ItemKind::Building),
                trees: count(ItemKind::Tree),
                structures: count(ItemKind::Structure),
            }
        })
    }

    /// List all resident keys in key order.
    pub fn list_tiles(manager: &TileManager) -> Vec<TileKey> {
        manager.resident_keys()
    }
}

/// Summary of the resident set for the inspector.
#[derive(Debug, Clone)]
pub struct ResidentSummary {
    pub resident_tiles: usize,
    pub listeners: usize,
    pub observer: Option<GeoPoint>,
    pub items_by_kind: BTreeMap<&'static str, usize>,
    pub elevation_range: Option<(f64, f64)>,
}

impl ResidentSummary {
    pub fn total_items(&self) -> usize {
        self.items_by_kind.values().sum()
    }
}

impl std::fmt::Display for ResidentSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Resident: tiles={} items={} listeners={}",
            self.resident_tiles,
            self.total_items(),
            self.listeners
        )?;
        if let Some(p) = self.observer {
            write!(f, " observer={p}")?;
        }
        if let Some((lo, hi)) = self.elevation_range {
            write!(f, " elevation=[{lo:.1}, {hi:.1}]")?;
        }
        for (kind, n) in &self.items_by_kind {
            write!(f, " {kind}s={n}")?;
        }
        Ok(())
    }
}

/// Detailed info about a single tile.
#[derive(Debug, Clone)]
pub struct TileInfo {
    pub key: TileKey,
    pub center: GeoPoint,
    pub resolution: usize,
    pub elevation: (f64, f64),
    pub landmarks: usize,
    pub buildings: usize,
    pub trees: usize,
    pub structures: usize,
}

impl std::fmt::Display for TileInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tile [{}] center={} grid={}x{} elevation=[{:.1}, {:.1}] landmarks={} buildings={} trees={} structures={}",
            self.key,
            self.center,
            self.resolution,
            self.resolution,
            self.elevation.0,
            self.elevation.1,
            self.landmarks,
            self.buildings,
            self.trees,
            self.structures,
        )
    }
}

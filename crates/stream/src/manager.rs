use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tilestream_common::{ConfigError, GeoError, GeoPoint, TileConfig, TileKey};
use tilestream_geo::{TileGrid, ground_distance_meters};
use tilestream_procgen::{ContextualItem, Generator};

use crate::events::{ListenerResult, ListenerSet, Subscription, TileEvent, TileEventKind};
use crate::stats::{StreamTotals, UpdateStats};
use crate::tile::Tile;

/// Errors from tile manager operations.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("invalid observer position: {0}")]
    InvalidPosition(#[from] GeoError),
}

/// Owns the resident tile cache and keeps it centered on a moving observer.
///
/// Tiles whose center lies within the load radius are generated and cached;
/// cached tiles whose center drifts beyond the unload distance are evicted.
/// Radius and movement checks use ground distance, so the same radius covers
/// the same area of terrain at every latitude.
/// The gap between the two radii keeps tiles near the boundary from
/// thrashing. Every update commits all cache changes before notifying
/// listeners, first with a single `Load` event and then a single `Unload`
/// event.
#[derive(Debug)]
pub struct TileManager {
    generator: Generator,
    resident: BTreeMap<TileKey, Arc<Tile>>,
    listeners: ListenerSet,
    last_position: Option<GeoPoint>,
    stats: UpdateStats,
    totals: StreamTotals,
}

impl TileManager {
    pub fn new(config: TileConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_generator(Generator::new(config)?))
    }

    pub fn with_generator(generator: Generator) -> Self {
        Self {
            generator,
            resident: BTreeMap::new(),
            listeners: ListenerSet::default(),
            last_position: None,
            stats: UpdateStats::default(),
            totals: StreamTotals::default(),
        }
    }

    pub fn config(&self) -> &TileConfig {
        self.generator.config()
    }

    pub fn grid(&self) -> &TileGrid {
        self.generator.grid()
    }

    /// Move the observer and reconcile the resident set around it.
    ///
    /// Movements shorter than the configured threshold since the last
    /// processed position are ignored.
    pub fn update_position(&mut self, observer: GeoPoint) -> Result<UpdateStats, StreamError> {
        observer.validate()?;

        let config = self.generator.config();
        if let Some(last) = self.last_position {
            let moved = ground_distance_meters(last, observer);
            if moved < config.movement_threshold_meters {
                tracing::trace!(moved, "observer below movement threshold");
                let stats = UpdateStats {
                    total_resident: self.resident.len(),
                    debounced: true,
                    ..UpdateStats::default()
                };
                self.totals.record(&stats);
                return Ok(stats);
            }
        }

        let _span = tracing::info_span!(
            "update_position",
            lat = observer.latitude,
            lon = observer.longitude
        )
        .entered();
        let start = Instant::now();
        let load_radius = config.load_radius_meters;
        let unload_distance = config.unload_distance_meters;
        let grid = *self.generator.grid();

        let mut loaded = Vec::new();
        let mut generate_time = Duration::ZERO;
        for key in grid.keys_around(observer, load_radius) {
            if self.resident.contains_key(&key)
                || ground_distance_meters(grid.center(key), observer) > load_radius
            {
                continue;
            }
            let generating = Instant::now();
            let content = self.generator.generate_key(key);
            generate_time += generating.elapsed();
            let tile = Arc::new(Tile::from_content(content));
            tracing::debug!(%key, items = tile.items().len(), "loading tile");
            self.resident.insert(key, Arc::clone(&tile));
            loaded.push(tile);
        }

        let evicted: Vec<TileKey> = self
            .resident
            .iter()
            .filter(|(_, tile)| ground_distance_meters(tile.center(), observer) > unload_distance)
            .map(|(key, _)| *key)
            .collect();
        let mut unloaded = Vec::with_capacity(evicted.len());
        for key in evicted {
            if let Some(tile) = self.resident.remove(&key) {
                tracing::debug!(%key, "unloading tile");
                unloaded.push(tile);
            }
        }

        self.last_position = Some(observer);
        let (tiles_loaded, tiles_unloaded) = (loaded.len(), unloaded.len());

        let notifying = Instant::now();
        self.notify(TileEventKind::Load, loaded);
        self.notify(TileEventKind::Unload, unloaded);
        let notify_time = notifying.elapsed();

        self.stats = UpdateStats {
            tiles_loaded,
            tiles_unloaded,
            total_resident: self.resident.len(),
            update_time: start.elapsed(),
            generate_time,
            notify_time,
            debounced: false,
        };
        self.totals.record(&self.stats);

        tracing::trace!(
            loaded = self.stats.tiles_loaded,
            unloaded = self.stats.tiles_unloaded,
            total = self.stats.total_resident,
            "tile update complete"
        );

        Ok(self.stats)
    }

    fn notify(&mut self, kind: TileEventKind, tiles: Vec<Arc<Tile>>) {
        if tiles.is_empty() {
            return;
        }
        let event = TileEvent { kind, tiles };
        let report = self.listeners.dispatch(&event);
        if report.failed > 0 {
            tracing::debug!(
                %kind,
                delivered = report.delivered,
                failed = report.failed,
                "tile event partially delivered"
            );
        }
    }

    /// Snapshot of all resident tiles in key order.
    pub fn resident_tiles(&self) -> Vec<Arc<Tile>> {
        self.resident.values().cloned().collect()
    }

    pub fn resident_keys(&self) -> Vec<TileKey> {
        self.resident.keys().copied().collect()
    }

    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    pub fn tile(&self, key: &TileKey) -> Option<Arc<Tile>> {
        self.resident.get(key).cloned()
    }

    pub fn is_resident(&self, key: &TileKey) -> bool {
        self.resident.contains_key(key)
    }

    /// Key of the grid cell containing `p`.
    pub fn key_for(&self, p: GeoPoint) -> TileKey {
        self.generator.grid().key_for(p)
    }

    /// Register a listener, called synchronously in registration order once
    /// per batched event.
    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&TileEvent) -> ListenerResult + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Remove exactly the listener registered under `sub`. Returns whether it
    /// was still registered.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        self.listeners.unsubscribe(sub)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drop every resident tile, listener and the movement baseline.
    ///
    /// No events are emitted. The manager can be driven again afterwards and
    /// behaves like a freshly constructed one.
    pub fn dispose(&mut self) {
        tracing::debug!(
            tiles = self.resident.len(),
            listeners = self.listeners.len(),
            "disposing tile manager"
        );
        self.resident.clear();
        self.listeners.clear();
        self.last_position = None;
        self.stats = UpdateStats::default();
        self.totals = StreamTotals::default();
    }

    /// Last observer position that triggered a recomputation.
    pub fn last_position(&self) -> Option<GeoPoint> {
        self.last_position
    }

    /// Statistics from the last processed (non-debounced) update.
    pub fn stats(&self) -> &UpdateStats {
        &self.stats
    }

    /// Counters accumulated over every update since creation or `dispose`.
    pub fn totals(&self) -> &StreamTotals {
        &self.totals
    }

    /// Ground elevation at `p` from the resident tile covering it.
    pub fn elevation_at(&self, p: GeoPoint) -> Option<f64> {
        self.resident.get(&self.key_for(p))?.elevation_at(p)
    }

    /// Resident items within `radius_meters` of ground distance from `p`,
    /// nearest first.
    pub fn items_near(&self, p: GeoPoint, radius_meters: f64) -> Vec<(f64, &ContextualItem)> {
        let mut found: Vec<(f64, &ContextualItem)> = self
            .resident
            .values()
            .flat_map(|tile| tile.items())
            .map(|item| {
                let at = GeoPoint::new(item.latitude, item.longitude);
                (ground_distance_meters(p, at), item)
            })
            .filter(|(d, _)| *d <= radius_meters)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        found
    }
}

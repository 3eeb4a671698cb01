//! Engine configuration.
//!
//! Captured once when a generator or tile manager is constructed and never
//! mutated afterwards, so every tile in a cache was produced under the same
//! parameters.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("unload distance {unload}m is smaller than load radius {load}m")]
    UnloadInsideLoadRadius { load: f64, unload: f64 },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Inclusive numeric range used for item dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Map `t` in [0,1) into the range.
    pub fn lerp(&self, t: f64) -> f64 {
        self.min + t * (self.max - self.min)
    }

    fn check(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ConfigError::invalid(
                field,
                format!("expected finite min <= max, got [{}, {}]", self.min, self.max),
            ));
        }
        Ok(())
    }
}

/// One sinusoidal term of the elevation function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseOctave {
    /// Peak contribution in meters.
    pub amplitude: f64,
    /// Angular frequency in radians per degree of latitude/longitude.
    pub frequency: f64,
}

/// Elevation synthesis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    pub min: f64,
    pub max: f64,
    /// Elevation before any octave is added.
    pub base: f64,
    /// Weight of the tile's grid coordinate in each octave's phase.
    pub regional_phase: f64,
    pub octaves: Vec<NoiseOctave>,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 500.0,
            base: 180.0,
            regional_phase: 0.5,
            octaves: vec![
                NoiseOctave {
                    amplitude: 120.0,
                    frequency: 40.0,
                },
                NoiseOctave {
                    amplitude: 60.0,
                    frequency: 180.0,
                },
                NoiseOctave {
                    amplitude: 25.0,
                    frequency: 750.0,
                },
                NoiseOctave {
                    amplitude: 8.0,
                    frequency: 3000.0,
                },
            ],
        }
    }
}

/// Cumulative classification thresholds for contextual items.
///
/// A draw `r` in [0,1) is compared in order: `r < landmark` is a landmark,
/// else `r < building` a building, else `r < tree` a tree, otherwise a
/// structure. Values are absolute, not increments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindThresholds {
    pub landmark: f64,
    pub building: f64,
    pub tree: f64,
}

impl Default for KindThresholds {
    fn default() -> Self {
        Self {
            landmark: 0.1,
            building: 0.3,
            tree: 1.0,
        }
    }
}

/// Contextual item placement parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemConfig {
    pub min_per_tile: u32,
    pub max_per_tile: u32,
    /// Seed distance between consecutive items of one tile.
    pub seed_stride: u64,
    pub thresholds: KindThresholds,
    pub landmark_height: Range,
    pub building_height: Range,
    pub tree_height: Range,
    pub structure_height: Range,
    /// Width and depth range shared by all kinds.
    pub footprint: Range,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            min_per_tile: 5,
            max_per_tile: 15,
            seed_stride: 1000,
            thresholds: KindThresholds::default(),
            landmark_height: Range::new(50.0, 150.0),
            building_height: Range::new(10.0, 60.0),
            tree_height: Range::new(5.0, 20.0),
            structure_height: Range::new(5.0, 30.0),
            footprint: Range::new(5.0, 25.0),
        }
    }
}

/// Top-level configuration for generation and streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    /// Edge length of a tile in meters.
    pub block_size_meters: f64,
    /// Tiles whose center lies within this distance become resident.
    pub load_radius_meters: f64,
    /// Resident tiles whose center lies beyond this distance are evicted.
    pub unload_distance_meters: f64,
    /// Minimum observer displacement before the resident set is recomputed.
    pub movement_threshold_meters: f64,
    /// Heightfield samples per tile edge.
    pub heightfield_resolution: usize,
    pub elevation: ElevationConfig,
    pub items: ItemConfig,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            block_size_meters: 1000.0,
            load_radius_meters: 2000.0,
            unload_distance_meters: 2500.0,
            movement_threshold_meters: 100.0,
            heightfield_resolution: 32,
            elevation: ElevationConfig::default(),
            items: ItemConfig::default(),
        }
    }
}

impl TileConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations that would produce nonsensical streaming or
    /// generation behavior.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("block_size_meters", self.block_size_meters)?;
        positive("load_radius_meters", self.load_radius_meters)?;
        positive("unload_distance_meters", self.unload_distance_meters)?;
        if self.unload_distance_meters < self.load_radius_meters {
            return Err(ConfigError::UnloadInsideLoadRadius {
                load: self.load_radius_meters,
                unload: self.unload_distance_meters,
            });
        }
        if !self.movement_threshold_meters.is_finite() || self.movement_threshold_meters < 0.0 {
            return Err(ConfigError::invalid(
                "movement_threshold_meters",
                format!("expected >= 0, got {}", self.movement_threshold_meters),
            ));
        }
        if self.heightfield_resolution <= 1 {
            return Err(ConfigError::invalid(
                "heightfield_resolution",
                format!("expected > 1, got {}", self.heightfield_resolution),
            ));
        }

        let e = &self.elevation;
        Range::new(e.min, e.max).check("elevation")?;
        if !e.base.is_finite() || !e.regional_phase.is_finite() {
            return Err(ConfigError::invalid(
                "elevation",
                "base and regional_phase must be finite",
            ));
        }
        if e
            .octaves
            .iter()
            .any(|o| !o.amplitude.is_finite() || !o.frequency.is_finite())
        {
            return Err(ConfigError::invalid(
                "elevation.octaves",
                "amplitude and frequency must be finite",
            ));
        }

        let items = &self.items;
        if items.min_per_tile > items.max_per_tile {
            return Err(ConfigError::invalid(
                "items.min_per_tile",
                format!(
                    "{} exceeds max_per_tile {}",
                    items.min_per_tile, items.max_per_tile
                ),
            ));
        }
        let t = items.thresholds;
        let ascending = 0.0 <= t.landmark
            && t.landmark <= t.building
            && t.building <= t.tree
            && t.tree <= 1.0;
        if !ascending {
            return Err(ConfigError::invalid(
                "items.thresholds",
                format!(
                    "expected 0 <= landmark <= building <= tree <= 1, got {} / {} / {}",
                    t.landmark, t.building, t.tree
                ),
            ));
        }
        items.landmark_height.check("items.landmark_height")?;
        items.building_height.check("items.building_height")?;
        items.tree_height.check("items.tree_height")?;
        items.structure_height.check("items.structure_height")?;
        items.footprint.check("items.footprint")?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::invalid(
            field,
            format!("expected a positive finite value, got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TileConfig::default();
        config.validate().unwrap();
        assert_eq!(config.block_size_meters, 1000.0);
        assert_eq!(config.load_radius_meters, 2000.0);
        assert_eq!(config.unload_distance_meters, 2500.0);
        assert_eq!(config.movement_threshold_meters, 100.0);
        assert_eq!(config.heightfield_resolution, 32);
        assert_eq!(config.items.min_per_tile, 5);
        assert_eq!(config.items.max_per_tile, 15);
        assert_eq!(config.elevation.min, 0.0);
        assert_eq!(config.elevation.max, 500.0);
    }

    #[test]
    fn unload_inside_load_radius_rejected() {
        let config = TileConfig {
            unload_distance_meters: 1500.0,
            ..TileConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnloadInsideLoadRadius { .. })
        ));
    }

    #[test]
    fn resolution_of_one_rejected() {
        let config = TileConfig {
            heightfield_resolution: 1,
            ..TileConfig::default()
        };
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "heightfield_resolution"),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn descending_thresholds_rejected() {
        let mut config = TileConfig::default();
        config.items.thresholds.building = 0.05;
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_block_size_rejected() {
        let config = TileConfig {
            block_size_meters: 0.0,
            ..TileConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config = TileConfig::from_json_str(r#"{ "block_size_meters": 250.0 }"#).unwrap();
        assert_eq!(config.block_size_meters, 250.0);
        assert_eq!(config.heightfield_resolution, 32);
        assert_eq!(config.items, ItemConfig::default());
    }

    #[test]
    fn invalid_json_config_rejected() {
        let result = TileConfig::from_json_str(r#"{ "load_radius_meters": 9000.0 }"#);
        assert!(matches!(
            result,
            Err(ConfigError::UnloadInsideLoadRadius { .. })
        ));
        assert!(matches!(
            TileConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn json_file_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tiles.json");
        let mut config = TileConfig::default();
        config.items.max_per_tile = 3;
        config.items.min_per_tile = 1;
        std::fs::write(&path, config.to_json_pretty().unwrap()).unwrap();

        let loaded = TileConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_read_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = TileConfig::from_json_file(tmp.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Read(_))));
    }
}

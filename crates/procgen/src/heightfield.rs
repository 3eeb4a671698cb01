use serde::{Deserialize, Serialize};
use tilestream_common::{ElevationConfig, TileBounds};

/// Regular grid of elevation samples covering one tile.
///
/// Row-major; row 0 lies on the southern edge and column 0 on the western
/// edge. Samples sit on the tile boundary, so neighbouring tiles share their
/// edge values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heightfield {
    pub width: usize,
    pub height: usize,
    pub min_elevation: f64,
    pub max_elevation: f64,
    pub data: Vec<f64>,
}

impl Heightfield {
    /// Synthesize a `resolution` × `resolution` field over `bounds`.
    ///
    /// Each sample is the configured base plus a sum of sinusoidal octaves of
    /// the sample's absolute coordinate, phase-shifted by the tile's grid
    /// coordinate, then clamped to the configured elevation range.
    pub fn synthesize(
        bounds: &TileBounds,
        grid_lat: f64,
        grid_lon: f64,
        resolution: usize,
        config: &ElevationConfig,
    ) -> Self {
        let steps = (resolution - 1) as f64;
        let lat_phase = grid_lat * config.regional_phase;
        let lon_phase = grid_lon * config.regional_phase;

        let mut data = Vec::with_capacity(resolution * resolution);
        let mut min_elevation = f64::INFINITY;
        let mut max_elevation = f64::NEG_INFINITY;

        for row in 0..resolution {
            for col in 0..resolution {
                let p = bounds.lerp(col as f64 / steps, row as f64 / steps);
                let raw = config.octaves.iter().fold(config.base, |acc, o| {
                    acc + o.amplitude
                        * (o.frequency * p.latitude + lat_phase).sin()
                        * (o.frequency * p.longitude + lon_phase).cos()
                });
                let elevation = raw.clamp(config.min, config.max);
                min_elevation = min_elevation.min(elevation);
                max_elevation = max_elevation.max(elevation);
                data.push(elevation);
            }
        }

        Self {
            width: resolution,
            height: resolution,
            min_elevation,
            max_elevation,
            data,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.height && col < self.width {
            Some(self.data[row * self.width + col])
        } else {
            None
        }
    }

    /// Nearest sample to normalized (u east, v north), clamped to the edges.
    pub fn sample_nearest(&self, u: f64, v: f64) -> f64 {
        let col = nearest_index(u, self.width);
        let row = nearest_index(v, self.height);
        self.data[row * self.width + col]
    }

    /// Bilinear interpolation at normalized (u east, v north), clamped to the edges.
    pub fn sample_bilinear(&self, u: f64, v: f64) -> f64 {
        let fx = u.clamp(0.0, 1.0) * (self.width - 1) as f64;
        let fy = v.clamp(0.0, 1.0) * (self.height - 1) as f64;
        let c0 = (fx.floor() as usize).min(self.width - 2);
        let r0 = (fy.floor() as usize).min(self.height - 2);
        let tx = fx - c0 as f64;
        let ty = fy - r0 as f64;

        let at = |r: usize, c: usize| self.data[r * self.width + c];
        let south = at(r0, c0) * (1.0 - tx) + at(r0, c0 + 1) * tx;
        let north = at(r0 + 1, c0) * (1.0 - tx) + at(r0 + 1, c0 + 1) * tx;
        south * (1.0 - ty) + north * ty
    }
}

fn nearest_index(t: f64, len: usize) -> usize {
    let max = (len - 1) as f64;
    (t * max).round().clamp(0.0, max) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilestream_common::NoiseOctave;

    fn bounds() -> TileBounds {
        TileBounds {
            north: 0.0045,
            south: -0.0045,
            east: 0.0045,
            west: -0.0045,
        }
    }

    #[test]
    fn synthesize_dimensions_and_metadata() {
        let config = ElevationConfig::default();
        let hf = Heightfield::synthesize(&bounds(), 0.0, 0.0, 32, &config);
        assert_eq!(hf.width, 32);
        assert_eq!(hf.height, 32);
        assert_eq!(hf.data.len(), 32 * 32);

        let min = hf.data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = hf.data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(hf.min_elevation, min);
        assert_eq!(hf.max_elevation, max);
    }

    #[test]
    fn samples_clamped_to_range() {
        let config = ElevationConfig {
            min: 100.0,
            max: 120.0,
            base: 110.0,
            regional_phase: 0.5,
            octaves: vec![NoiseOctave {
                amplitude: 400.0,
                frequency: 2000.0,
            }],
        };
        let hf = Heightfield::synthesize(&bounds(), 0.0, 0.0, 16, &config);
        assert!(hf.data.iter().all(|e| (100.0..=120.0).contains(e)));
        assert_eq!(hf.min_elevation, 100.0);
        assert_eq!(hf.max_elevation, 120.0);
    }

    #[test]
    fn flat_config_gives_flat_field() {
        let config = ElevationConfig {
            base: 42.0,
            octaves: Vec::new(),
            ..ElevationConfig::default()
        };
        let hf = Heightfield::synthesize(&bounds(), 0.0, 0.0, 4, &config);
        assert!(hf.data.iter().all(|&e| e == 42.0));
        assert_eq!(hf.sample_bilinear(0.3, 0.7), 42.0);
    }

    #[test]
    fn nearest_sampling_clamps_to_edges() {
        let hf = Heightfield {
            width: 2,
            height: 2,
            min_elevation: 0.0,
            max_elevation: 3.0,
            data: vec![0.0, 1.0, 2.0, 3.0],
        };
        assert_eq!(hf.sample_nearest(0.0, 0.0), 0.0);
        assert_eq!(hf.sample_nearest(1.0, 0.0), 1.0);
        assert_eq!(hf.sample_nearest(0.0, 1.0), 2.0);
        assert_eq!(hf.sample_nearest(5.0, 5.0), 3.0);
        assert_eq!(hf.sample_nearest(-1.0, -1.0), 0.0);
        assert_eq!(hf.get(1, 1), Some(3.0));
        assert_eq!(hf.get(2, 0), None);
    }

    #[test]
    fn bilinear_interpolates_between_samples() {
        let hf = Heightfield {
            width: 2,
            height: 2,
            min_elevation: 0.0,
            max_elevation: 3.0,
            data: vec![0.0, 1.0, 2.0, 3.0],
        };
        assert_eq!(hf.sample_bilinear(0.5, 0.0), 0.5);
        assert_eq!(hf.sample_bilinear(0.0, 0.5), 1.0);
        assert_eq!(hf.sample_bilinear(0.5, 0.5), 1.5);
        assert_eq!(hf.sample_bilinear(1.0, 1.0), 3.0);
    }
}

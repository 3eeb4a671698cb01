use tilestream_common::{ConfigError, GeoPoint, TileBounds, TileKey, normalize_longitude};

use crate::projection::METERS_PER_DEGREE;

/// Floor applied to cos(latitude) when converting metric widths into
/// longitude degrees.
pub const MIN_COS_LATITUDE: f64 = 1e-3;

/// Tile edges this close to the antimeridian are snapped onto it.
const ANTIMERIDIAN_EPSILON: f64 = 1e-9;

/// cos(latitude) clamped away from zero.
pub fn guarded_cos(latitude: f64) -> f64 {
    latitude.to_radians().cos().max(MIN_COS_LATITUDE)
}

fn snap_to_antimeridian(lon: f64) -> f64 {
    if (lon.abs() - 180.0).abs() < ANTIMERIDIAN_EPSILON {
        180.0_f64.copysign(lon)
    } else {
        lon
    }
}

/// Fixed-size grid of square tiles laid over the globe.
///
/// Rows have a constant latitude height of `block_size / METERS_PER_DEGREE`.
/// Each row holds an odd number of columns whose ground width is the block
/// size, rounded up so the row closes exactly around the globe; column 0 is
/// centered on the prime meridian and the antimeridian falls on the edge
/// between the first and last column. Row indices stop at the last row
/// whose center is on the globe, and that row's tiles extend to the pole.
/// A tile's grid coordinate is its center; points snap to the nearest
/// center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGrid {
    block_size: f64,
}

impl TileGrid {
    /// Create a grid with the given tile edge length in meters.
    pub fn new(block_size_meters: f64) -> Result<Self, ConfigError> {
        if !(block_size_meters.is_finite() && block_size_meters > 0.0) {
            return Err(ConfigError::Invalid {
                field: "block_size_meters",
                reason: format!("expected a positive length, got {block_size_meters}"),
            });
        }
        Ok(Self {
            block_size: block_size_meters,
        })
    }

    pub fn block_size(&self) -> f64 {
        self.block_size
    }

    /// Latitude height of every row, in degrees.
    pub fn lat_step(&self) -> f64 {
        self.block_size / METERS_PER_DEGREE
    }

    /// Largest row index; rows run from `-max_row()` to `max_row()`.
    pub fn max_row(&self) -> i64 {
        (90.0 / self.lat_step()).floor() as i64
    }

    /// Number of columns in the row at `latitude`. Always odd.
    pub fn columns(&self, latitude: f64) -> i64 {
        let nominal_step = self.block_size / (METERS_PER_DEGREE * guarded_cos(latitude));
        let n = (360.0 / nominal_step).floor().max(1.0) as i64;
        if n % 2 == 0 { n - 1 } else { n }
    }

    /// Longitude width of a column in the row at `latitude`, in degrees.
    pub fn lon_step(&self, latitude: f64) -> f64 {
        360.0 / self.columns(latitude) as f64
    }

    /// Latitude of the center of row `lat_index`.
    pub fn row_latitude(&self, lat_index: i64) -> f64 {
        lat_index as f64 * self.lat_step()
    }

    fn clamp_row(&self, lat_index: i64) -> i64 {
        let max_row = self.max_row();
        lat_index.clamp(-max_row, max_row)
    }

    /// Snap a point to the key of the cell containing it.
    pub fn key_for(&self, p: GeoPoint) -> TileKey {
        let lat_index = self.clamp_row((p.latitude / self.lat_step()).round() as i64);
        let columns = self.columns(self.row_latitude(lat_index));
        let half = columns / 2;
        let lon = normalize_longitude(p.longitude);
        // ±180 sits on a column edge; keep it in the column on its own side
        let lon_index = ((lon * columns as f64 / 360.0).round() as i64).clamp(-half, half);
        TileKey::new(lat_index, lon_index)
    }

    /// Grid coordinate (cell center) of a key.
    pub fn center(&self, key: TileKey) -> GeoPoint {
        let lat = self.row_latitude(self.clamp_row(key.lat_index));
        let columns = self.columns(lat);
        let lon_index = wrap_column(key.lon_index, columns);
        GeoPoint::new(lat, lon_index as f64 * 360.0 / columns as f64)
    }

    /// Bounds of the cell identified by `key`.
    pub fn bounds(&self, key: TileKey) -> TileBounds {
        let c = self.center(key);
        self.bounds_around(c.latitude, c.longitude)
    }

    /// Bounds of a tile centered on the given grid coordinate.
    ///
    /// A tile with no row beyond it toward a pole extends to that pole.
    pub fn bounds_around(&self, grid_lat: f64, grid_lon: f64) -> TileBounds {
        let lat_step = self.lat_step();
        let half_lat = lat_step * 0.5;
        let half_lon = self.lon_step(grid_lat) * 0.5;
        let north = if grid_lat + lat_step > 90.0 {
            90.0
        } else {
            grid_lat + half_lat
        };
        let south = if grid_lat - lat_step < -90.0 {
            -90.0
        } else {
            grid_lat - half_lat
        };
        TileBounds {
            north,
            south,
            east: snap_to_antimeridian(grid_lon + half_lon),
            west: snap_to_antimeridian(grid_lon - half_lon),
        }
    }

    /// Every key whose center could lie within `radius_meters` of `p`.
    ///
    /// Returns a square neighborhood of `ceil(radius / block) + 1` cells per
    /// axis, wrapped across the antimeridian and cut at the polar rows; callers
    /// filter by distance. Rows too narrow for the neighborhood contribute
    /// each column once.
    pub fn keys_around(&self, p: GeoPoint, radius_meters: f64) -> Vec<TileKey> {
        let reach = (radius_meters / self.block_size).ceil() as i64 + 1;
        let center_row = self.key_for(p).lat_index;
        let max_row = self.max_row();
        let first_row = (center_row - reach).max(-max_row);
        let last_row = (center_row + reach).min(max_row);

        let mut keys = Vec::with_capacity(((2 * reach + 1) * (2 * reach + 1)) as usize);
        for lat_index in first_row..=last_row {
            let columns = self.columns(self.row_latitude(lat_index));
            let center_col = (p.longitude * columns as f64 / 360.0).round() as i64;
            let span = reach.min(columns / 2);
            for lon_index in center_col - span..=center_col + span {
                keys.push(TileKey::new(lat_index, wrap_column(lon_index, columns)));
            }
        }
        keys
    }
}

/// Bring a column index into `[-columns / 2, columns / 2]`.
fn wrap_column(lon_index: i64, columns: i64) -> i64 {
    let half = columns / 2;
    (lon_index + half).rem_euclid(columns) - half
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> TileGrid {
        TileGrid::new(1000.0).unwrap()
    }

    #[test]
    fn points_in_same_cell_share_key() {
        let grid = grid();
        let a = grid.key_for(GeoPoint::new(0.0001, 0.0001));
        let b = grid.key_for(GeoPoint::new(-0.0002, 0.0003));
        assert_eq!(a, b);
        assert_eq!(a, TileKey::new(0, 0));

        let east = grid.key_for(GeoPoint::new(0.0, 0.012));
        assert_eq!(east, TileKey::new(0, 1));
    }

    #[test]
    fn key_reproducible_from_grid_coordinate() {
        let grid = grid();
        for key in [
            TileKey::new(0, 0),
            TileKey::new(-7, 13),
            TileKey::new(5300, -42),
            TileKey::new(0, 20037),
            TileKey::new(-3, -20037),
        ] {
            assert_eq!(grid.key_for(grid.center(key)), key);
        }
    }

    #[test]
    fn bounds_contain_snapped_point() {
        let grid = grid();
        for p in [
            GeoPoint::new(47.61, -122.33),
            GeoPoint::new(-33.86, 151.21),
            GeoPoint::new(70.0, 25.0),
            GeoPoint::new(0.0044, -0.0044),
            GeoPoint::new(0.0, 180.0),
            GeoPoint::new(0.0, -180.0),
            GeoPoint::new(64.0, 179.9999),
            GeoPoint::new(89.999, 0.0),
            GeoPoint::new(-90.0, 30.0),
        ] {
            let key = grid.key_for(p);
            assert!(grid.bounds(key).contains(p), "{p} not in {key}");
        }
    }

    #[test]
    fn columns_widen_with_latitude() {
        let grid = grid();
        assert!(grid.lon_step(60.0) > grid.lon_step(0.0));
        assert!((grid.lon_step(60.0) / grid.lon_step(0.0) - 2.0).abs() < 1e-3);
        for lat in [0.0, 33.3, 60.0, 89.99] {
            let columns = grid.columns(lat);
            assert_eq!(columns % 2, 1);
            // ground width never drops below the block size
            let width = grid.lon_step(lat) * METERS_PER_DEGREE * guarded_cos(lat);
            assert!(width >= 1000.0 - 1e-6, "{width}m at {lat}");
        }
    }

    #[test]
    fn centers_stay_on_the_globe() {
        let grid = grid();
        for p in [
            GeoPoint::new(0.0, 179.999),
            GeoPoint::new(0.0, -179.999),
            GeoPoint::new(71.0, 180.0),
            GeoPoint::new(89.999, 0.0),
            GeoPoint::new(-89.999, -120.0),
        ] {
            for key in grid.keys_around(p, 2000.0) {
                let c = grid.center(key);
                assert!(c.validate().is_ok(), "{key} center {c} near {p}");
            }
        }
    }

    #[test]
    fn antimeridian_neighbors_share_keys() {
        let grid = grid();
        let west_side = grid.keys_around(GeoPoint::new(0.0, 179.999), 2000.0);
        let east_side = grid.keys_around(GeoPoint::new(0.0, -179.999), 2000.0);
        let last = grid.key_for(GeoPoint::new(0.0, 179.999));
        let first = grid.key_for(GeoPoint::new(0.0, -179.999));
        assert_ne!(last, first);
        for key in [last, first] {
            assert!(west_side.contains(&key));
            assert!(east_side.contains(&key));
        }
    }

    #[test]
    fn polar_observer_snaps_to_last_row() {
        let grid = grid();
        let north = grid.key_for(GeoPoint::new(89.999, 0.0));
        assert_eq!(north.lat_index, grid.max_row());
        assert!(grid.center(north).latitude <= 90.0);
        assert_eq!(grid.bounds(north).north, 90.0);
        assert!(grid.keys_around(GeoPoint::new(89.999, 0.0), 2000.0).contains(&north));

        let south = grid.key_for(GeoPoint::new(-90.0, 0.0));
        assert_eq!(south.lat_index, -grid.max_row());
        assert_eq!(grid.bounds(south).south, -90.0);
    }

    #[test]
    fn keys_around_is_square_neighborhood() {
        let grid = grid();
        let keys = grid.keys_around(GeoPoint::new(0.0, 0.0), 2000.0);
        // reach = 3 cells each way
        assert_eq!(keys.len(), 49);
        assert!(keys.contains(&TileKey::new(0, 0)));
        assert!(keys.contains(&TileKey::new(3, -3)));
    }

    #[test]
    fn narrow_rows_yield_each_column_once() {
        let grid = TileGrid::new(2_000_000.0).unwrap();
        let keys = grid.keys_around(GeoPoint::new(80.0, 0.0), 6_000_000.0);
        let mut unique = keys.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn rejects_non_positive_block_size() {
        assert!(matches!(
            TileGrid::new(0.0),
            Err(ConfigError::Invalid {
                field: "block_size_meters",
                ..
            })
        ));
        assert!(TileGrid::new(f64::NAN).is_err());
    }
}

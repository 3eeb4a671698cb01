//! Geography: projection between geographic and planar coordinates, and the
//! tile grid built on top of it.
//!
//! # Invariants
//! - `to_geo(to_planar(p))` recovers `p` to floating-point tolerance away from
//!   the poles.
//! - Distances are symmetric and zero only for identical points.
//! - Longitude widths never divide by a zero cosine.
//! - Grid keys are canonical: every tile center is a valid coordinate, and
//!   each piece of ground has exactly one key on either side of the
//!   antimeridian.

mod grid;
mod projection;

pub use grid::{MIN_COS_LATITUDE, TileGrid, guarded_cos};
pub use projection::{
    EARTH_RADIUS_METERS, MAX_PROJECTED_LATITUDE, METERS_PER_DEGREE, distance_meters,
    ground_distance_meters, meters_per_degree_at, to_geo, to_planar,
};

pub fn crate_info() -> &'static str {
    "tilestream-geo v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("geo"));
    }
}

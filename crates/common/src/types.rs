use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Longitudes this close past the antimeridian are treated as rounding noise
/// and clamped instead of wrapped to the other side.
const LONGITUDE_EPSILON: f64 = 1e-9;

/// Errors from coordinate validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    #[error("coordinate is not finite: ({latitude}, {longitude})")]
    NotFinite { latitude: f64, longitude: f64 },
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Construct without validation. Use [`GeoPoint::try_new`] at input boundaries.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Construct a validated point.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let p = Self::new(latitude, longitude);
        p.validate()?;
        Ok(p)
    }

    /// Check that both components are finite and inside their ranges.
    pub fn validate(&self) -> Result<(), GeoError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(GeoError::NotFinite {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeoError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GeoError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }

    /// Offset by the given number of degrees, producing a new point.
    pub fn offset(self, d_lat: f64, d_lon: f64) -> Self {
        Self::new(self.latitude + d_lat, self.longitude + d_lon)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Wrap a longitude into [-180, 180].
pub fn normalize_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else if lon.abs() <= 180.0 + LONGITUDE_EPSILON {
        lon.clamp(-180.0, 180.0)
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// A point in a projected plane, in meters.
///
/// Only meaningful relative to another planar point from the same projection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn as_dvec2(self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Offset from `origin` to `self`.
    pub fn relative_to(self, origin: PlanarPoint) -> DVec2 {
        self.as_dvec2() - origin.as_dvec2()
    }

    pub fn distance(self, other: PlanarPoint) -> f64 {
        self.as_dvec2().distance(other.as_dvec2())
    }
}

/// Discrete grid cell identifier.
///
/// `lat_index` counts rows of fixed metric height from the equator;
/// `lon_index` counts columns inside that row. Ordering is row-major, which
/// gives deterministic iteration when keys are stored in ordered maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    pub lat_index: i64,
    pub lon_index: i64,
}

impl TileKey {
    pub const fn new(lat_index: i64, lon_index: i64) -> Self {
        Self {
            lat_index,
            lon_index,
        }
    }
}

impl std::fmt::Display for TileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tile_{}_{}", self.lat_index, self.lon_index)
    }
}

/// Degree-space bounding box of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl TileBounds {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.north + self.south) * 0.5,
            (self.east + self.west) * 0.5,
        )
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: GeoPoint) -> bool {
        p.latitude >= self.south
            && p.latitude <= self.north
            && p.longitude >= self.west
            && p.longitude <= self.east
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    /// Map normalized (u east, v north) in [0,1] to a geographic point.
    pub fn lerp(&self, u: f64, v: f64) -> GeoPoint {
        GeoPoint::new(
            self.south + v * self.lat_span(),
            self.west + u * self.lon_span(),
        )
    }
}

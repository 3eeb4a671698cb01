use std::f64::consts::{FRAC_PI_2, PI};

use tilestream_common::{GeoPoint, PlanarPoint, normalize_longitude};

/// Sphere radius used by the spherical Mercator projection (WGS-84 semi-major axis).
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Meters along a meridian per degree of latitude, and along the equator per
/// degree of longitude.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_METERS * PI / 180.0;

/// Mercator diverges at the poles; latitudes are clamped to this magnitude
/// before projecting.
pub const MAX_PROJECTED_LATITUDE: f64 = 89.999;

/// Forward spherical Mercator projection.
pub fn to_planar(geo: GeoPoint) -> PlanarPoint {
    debug_assert!(
        geo.latitude.is_finite() && geo.longitude.is_finite(),
        "non-finite coordinate {geo}"
    );
    let lat = geo
        .latitude
        .clamp(-MAX_PROJECTED_LATITUDE, MAX_PROJECTED_LATITUDE)
        .to_radians();
    PlanarPoint::new(
        EARTH_RADIUS_METERS * geo.longitude.to_radians(),
        EARTH_RADIUS_METERS * lat.tan().asinh(),
    )
}

/// Inverse of [`to_planar`]. Longitude is wrapped into [-180, 180].
pub fn to_geo(p: PlanarPoint) -> GeoPoint {
    debug_assert!(p.x.is_finite() && p.y.is_finite(), "non-finite planar point {p:?}");
    let lat = (p.y / EARTH_RADIUS_METERS)
        .sinh()
        .atan()
        .clamp(-FRAC_PI_2, FRAC_PI_2);
    GeoPoint::new(
        lat.to_degrees(),
        normalize_longitude((p.x / EARTH_RADIUS_METERS).to_degrees()),
    )
}

/// Euclidean distance between the projections of `a` and `b`, in meters.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    to_planar(a).distance(to_planar(b))
}

/// Approximate ground distance between `a` and `b`, in meters.
///
/// Mercator stretches lengths by sec(latitude). This measures the same
/// separation with the stretch removed at the mean latitude, taking the
/// longitude difference the short way across the antimeridian. Accurate for
/// separations of a few tiles, which is what radius checks compare.
pub fn ground_distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lon = normalize_longitude(b.longitude - a.longitude);
    let mean_lat = 0.5 * (a.latitude + b.latitude);
    let dx = d_lon * meters_per_degree_at(mean_lat);
    let dy = (b.latitude - a.latitude) * METERS_PER_DEGREE;
    dx.hypot(dy)
}

/// Ground meters per degree of longitude at `latitude`.
///
/// Shrinks with meridian convergence toward the poles; strictly positive on
/// the open interval (-90, 90).
pub fn meters_per_degree_at(latitude: f64) -> f64 {
    METERS_PER_DEGREE * latitude.to_radians().cos()
}

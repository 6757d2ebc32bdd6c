//! Spherical geometry helpers

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two WGS84 points in meters (haversine).
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Wrap an angle in degrees into (-180, 180].
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Offset a point by `distance_m` along `bearing_deg` using a flat-earth
/// approximation (adequate for the few kilometers of a synthetic drive).
pub fn offset(lat: f64, lon: f64, distance_m: f64, bearing_deg: f64) -> (f64, f64) {
    let bearing = bearing_deg.to_radians();
    let d_lat = distance_m * bearing.cos() / 111_000.0;
    let d_lon = distance_m * bearing.sin() / (111_000.0 * lat.to_radians().cos());
    (lat + d_lat, lon + d_lon)
}

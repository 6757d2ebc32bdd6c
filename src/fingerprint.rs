//! Route fingerprint
//!
//! Density-suppressed sequence of grid tiles hashed into an opaque route id.
//! Two drives along the same path land on the same id independent of the
//! sampling rate, as long as consecutive accepted points stay comparable.

use crate::config::FingerprintConfig;
use crate::geo::haversine_m;
use crate::types::LocationSample;
use sha2::{Digest, Sha256};

const TILE_SEPARATOR: &str = "|";

/// Tile accumulator for one trip
#[derive(Debug, Clone)]
pub struct RouteFingerprint {
    config: FingerprintConfig,
    tiles: Vec<String>,
    last_accepted: Option<(f64, f64)>,
}

impl RouteFingerprint {
    pub fn new(config: &FingerprintConfig) -> Self {
        Self {
            config: config.clone(),
            tiles: Vec::new(),
            last_accepted: None,
        }
    }

    /// Clear all tiles
    pub fn start(&mut self) {
        self.tiles.clear();
        self.last_accepted = None;
    }

    /// Append the sample's tile unless it is within the minimum spacing of
    /// the last accepted sample. Returns true when a tile was appended.
    pub fn on_location(&mut self, sample: &LocationSample) -> bool {
        if !sample.has_valid_position() {
            return false;
        }
        if let Some((lat, lon)) = self.last_accepted {
            if haversine_m(lat, lon, sample.latitude, sample.longitude) < self.config.min_spacing_m {
                return false;
            }
        }
        self.last_accepted = Some((sample.latitude, sample.longitude));
        self.tiles.push(self.tile(sample.latitude, sample.longitude));
        true
    }

    /// Hash of the joined tile sequence (lowercase hex SHA-256)
    pub fn finish(&self) -> String {
        let joined = self.tiles.join(TILE_SEPARATOR);
        hex::encode(Sha256::digest(joined.as_bytes()))
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn tiles(&self) -> &[String] {
        &self.tiles
    }

    fn tile(&self, lat: f64, lon: f64) -> String {
        let q_lat = (lat / self.config.grid_deg).round() as i64;
        let q_lon = (lon / self.config.grid_deg).round() as i64;
        format!("{}_{}", q_lat, q_lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::offset;

    const LAT: f64 = 37.7749;
    const LON: f64 = -122.4194;

    fn fingerprint() -> RouteFingerprint {
        RouteFingerprint::new(&FingerprintConfig::default())
    }

    /// 40 m per second: north for 60 s, then east for 60 s
    fn one_hz_path() -> Vec<LocationSample> {
        let mut out = Vec::new();
        let (mut lat, mut lon) = (LAT, LON);
        for i in 0..120i64 {
            out.push(LocationSample::new(lat, lon, i * 1_000, 40.0, 0.0));
            let bearing = if i < 60 { 0.0 } else { 90.0 };
            (lat, lon) = offset(lat, lon, 40.0, bearing);
        }
        out
    }

    fn hash_of<'a>(samples: impl Iterator<Item = &'a LocationSample>) -> (String, usize) {
        let mut fp = fingerprint();
        fp.start();
        for s in samples {
            fp.on_location(s);
        }
        (fp.finish(), fp.tile_count())
    }

    #[test]
    fn test_empty_route_hash() {
        assert_eq!(
            fingerprint().finish(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_tile_format() {
        let mut fp = fingerprint();
        fp.on_location(&LocationSample::new(LAT, LON, 0, 10.0, 0.0));
        assert_eq!(fp.tiles(), ["37775_-122419".to_string()]);
    }

    #[test]
    fn test_density_suppression() {
        let mut fp = fingerprint();
        assert!(fp.on_location(&LocationSample::new(LAT, LON, 0, 10.0, 0.0)));
        let (lat, lon) = offset(LAT, LON, 50.0, 0.0);
        assert!(!fp.on_location(&LocationSample::new(lat, lon, 1_000, 10.0, 0.0)));
        let (lat, lon) = offset(LAT, LON, 101.0, 0.0);
        assert!(fp.on_location(&LocationSample::new(lat, lon, 2_000, 10.0, 0.0)));
        assert_eq!(fp.tile_count(), 2);
    }

    #[test]
    fn test_stable_across_sampling_rates() {
        let path = one_hz_path();
        let (every_second, tiles_1s) = hash_of(path.iter());
        let (every_third, tiles_3s) = hash_of(path.iter().step_by(3));

        assert_eq!(tiles_1s, 40);
        assert_eq!(tiles_1s, tiles_3s);
        assert_eq!(every_second, every_third);
    }

    #[test]
    fn test_different_routes_differ() {
        let path = one_hz_path();
        let (forward, _) = hash_of(path.iter());
        let (reverse, _) = hash_of(path.iter().rev());
        assert_ne!(forward, reverse);
    }

    #[test]
    fn test_invalid_position_ignored() {
        let mut fp = fingerprint();
        assert!(!fp.on_location(&LocationSample::new(f64::NAN, LON, 0, 10.0, 0.0)));
        assert!(!fp.on_location(&LocationSample::new(95.0, LON, 0, 10.0, 0.0)));
        assert_eq!(fp.tile_count(), 0);
    }

    #[test]
    fn test_start_clears() {
        let mut fp = fingerprint();
        fp.on_location(&LocationSample::new(LAT, LON, 0, 10.0, 0.0));
        fp.start();
        assert_eq!(fp.tile_count(), 0);
        // Spacing is measured from scratch again
        assert!(fp.on_location(&LocationSample::new(LAT, LON, 1_000, 10.0, 0.0)));
    }
}

//! Route aggregation
//!
//! Trips sharing a route fingerprint are folded into one summary with a
//! running trip count and average star rating. The store is plain data that
//! the host persists as JSON between sessions.

use crate::types::TripRecord;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Aggregate over all valid trips of one route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub route_id: String,
    pub first_seen_ms: i64,
    pub last_seen_ms: i64,
    pub trip_count: u32,
    /// Running mean of trip stars (0-5)
    pub avg_stars: f64,
}

/// Route summaries keyed by route id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteStore {
    routes: HashMap<String, RouteSummary>,
}

impl RouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a finished trip into its route. Invalid trips are not recorded.
    pub fn record_trip(&mut self, trip: &TripRecord, now_ms: i64) -> Option<&RouteSummary> {
        if !trip.valid {
            debug!("route {}: skipping invalid trip {}", trip.route_id, trip.trip_id);
            return None;
        }

        let stars = f64::from(trip.stars);
        let summary = self
            .routes
            .entry(trip.route_id.clone())
            .and_modify(|r| {
                let n = f64::from(r.trip_count);
                r.avg_stars = (r.avg_stars * n + stars) / (n + 1.0);
                r.trip_count += 1;
                r.last_seen_ms = now_ms;
            })
            .or_insert_with(|| RouteSummary {
                route_id: trip.route_id.clone(),
                first_seen_ms: now_ms,
                last_seen_ms: now_ms,
                trip_count: 1,
                avg_stars: stars,
            });

        debug!(
            "route {}: {} trips, {:.2} avg stars",
            summary.route_id, summary.trip_count, summary.avg_stars
        );
        Some(summary)
    }

    pub fn get(&self, route_id: &str) -> Option<&RouteSummary> {
        self.routes.get(route_id)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Summaries ordered by trip count, most driven first
    pub fn summaries(&self) -> Vec<&RouteSummary> {
        let mut out: Vec<_> = self.routes.values().collect();
        out.sort_by(|a, b| {
            b.trip_count
                .cmp(&a.trip_count)
                .then_with(|| a.route_id.cmp(&b.route_id))
        });
        out
    }

    /// Load route store from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize route store to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventCounters;

    fn trip(route_id: &str, stars: u8, valid: bool) -> TripRecord {
        TripRecord {
            trip_id: format!("trip-{}", stars),
            start_epoch_ms: 0,
            end_epoch_ms: 600_000,
            duration_min: 10.0,
            distance_km: 5.0,
            route_id: route_id.to_string(),
            score: f64::from(stars) * 20.0,
            stars,
            valid,
            counters: EventCounters::default(),
            night_minutes: 0.0,
            markers: vec![],
            path: vec![],
        }
    }

    #[test]
    fn test_first_trip_creates_route() {
        let mut store = RouteStore::new();
        let summary = store.record_trip(&trip("abc", 4, true), 1_000).unwrap();
        assert_eq!(summary.trip_count, 1);
        assert_eq!(summary.avg_stars, 4.0);
        assert_eq!(summary.first_seen_ms, 1_000);
    }

    #[test]
    fn test_running_average() {
        let mut store = RouteStore::new();
        store.record_trip(&trip("abc", 5, true), 1_000);
        store.record_trip(&trip("abc", 3, true), 2_000);
        store.record_trip(&trip("abc", 4, true), 3_000);

        let summary = store.get("abc").unwrap();
        assert_eq!(summary.trip_count, 3);
        assert!((summary.avg_stars - 4.0).abs() < 1e-9);
        assert_eq!(summary.first_seen_ms, 1_000);
        assert_eq!(summary.last_seen_ms, 3_000);
    }

    #[test]
    fn test_invalid_trip_ignored() {
        let mut store = RouteStore::new();
        assert!(store.record_trip(&trip("abc", 0, false), 1_000).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_summaries_ordering() {
        let mut store = RouteStore::new();
        store.record_trip(&trip("b", 5, true), 1_000);
        store.record_trip(&trip("a", 5, true), 1_000);
        store.record_trip(&trip("b", 5, true), 2_000);

        let ids: Vec<_> = store.summaries().iter().map(|r| r.route_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_serialization() {
        let mut store = RouteStore::new();
        store.record_trip(&trip("abc", 3, true), 1_000);

        let json = store.to_json().unwrap();
        let restored = RouteStore::from_json(&json).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.get("abc"), store.get("abc"));
    }
}

//! Core types for the TripScore pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: location samples, trip transitions, event counters and the
//! finalized trip record.

use serde::{Deserialize, Serialize};

/// A single geolocation fix reported by the host at roughly 1 Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Latitude (degrees, WGS84)
    pub latitude: f64,
    /// Longitude (degrees, WGS84)
    pub longitude: f64,
    /// Fix time (milliseconds since Unix epoch)
    pub timestamp_ms: i64,
    /// Ground speed (m/s)
    pub speed_mps: f64,
    /// Course over ground (degrees, 0-360)
    #[serde(default)]
    pub bearing_deg: f64,
    /// Horizontal accuracy (meters)
    #[serde(default)]
    pub accuracy_m: f64,
}

impl LocationSample {
    pub fn new(
        latitude: f64,
        longitude: f64,
        timestamp_ms: i64,
        speed_mps: f64,
        bearing_deg: f64,
    ) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
            speed_mps,
            bearing_deg,
            accuracy_m: 5.0,
        }
    }

    /// Speed clamped to `>= 0`; NaN reads as standstill.
    pub fn clamped_speed(&self) -> f64 {
        if self.speed_mps.is_finite() {
            self.speed_mps.max(0.0)
        } else {
            0.0
        }
    }

    /// Coordinates are finite and inside the WGS84 range.
    pub fn has_valid_position(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Speed and bearing can safely feed the filters.
    pub fn has_valid_kinematics(&self) -> bool {
        self.speed_mps.is_finite() && self.bearing_deg.is_finite()
    }
}

/// Phase of the trip segmentation state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripPhase {
    Idle,
    CandidateStart,
    Active,
}

/// Lifecycle transition emitted for every processed sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum TripTransition {
    None,
    Started { start_time_ms: i64 },
    Ongoing,
    Ended { end_time_ms: i64 },
}

impl TripTransition {
    pub fn is_started(&self) -> bool {
        matches!(self, TripTransition::Started { .. })
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, TripTransition::Ended { .. })
    }
}

/// Driving event category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Speeding,
    Acceleration,
    Braking,
    Cornering,
}

impl EventCategory {
    pub const ALL: [EventCategory; 4] = [
        EventCategory::Speeding,
        EventCategory::Acceleration,
        EventCategory::Braking,
        EventCategory::Cornering,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Speeding => "speeding",
            EventCategory::Acceleration => "acceleration",
            EventCategory::Braking => "braking",
            EventCategory::Cornering => "cornering",
        }
    }

    fn index(&self) -> usize {
        match self {
            EventCategory::Speeding => 0,
            EventCategory::Acceleration => 1,
            EventCategory::Braking => 2,
            EventCategory::Cornering => 3,
        }
    }
}

/// Severity tier of a classified event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    None,
    Minor,
    Mid,
    Major,
}

impl Severity {
    /// Numeric level (0=none, 1=minor, 2=mid, 3=major)
    pub fn level(&self) -> u8 {
        match self {
            Severity::None => 0,
            Severity::Minor => 1,
            Severity::Mid => 2,
            Severity::Major => 3,
        }
    }

    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Severity::None,
            1 => Severity::Minor,
            2 => Severity::Mid,
            _ => Severity::Major,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Minor => "minor",
            Severity::Mid => "mid",
            Severity::Major => "major",
        }
    }
}

/// Event counts per severity tier for one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub minor: u32,
    pub mid: u32,
    pub major: u32,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> u32 {
        match severity {
            Severity::None => 0,
            Severity::Minor => self.minor,
            Severity::Mid => self.mid,
            Severity::Major => self.major,
        }
    }

    pub fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::None => {}
            Severity::Minor => self.minor += 1,
            Severity::Mid => self.mid += 1,
            Severity::Major => self.major += 1,
        }
    }

    pub fn decrement(&mut self, severity: Severity) {
        match severity {
            Severity::None => {}
            Severity::Minor => self.minor = self.minor.saturating_sub(1),
            Severity::Mid => self.mid = self.mid.saturating_sub(1),
            Severity::Major => self.major = self.major.saturating_sub(1),
        }
    }

    pub fn total(&self) -> u32 {
        self.minor + self.mid + self.major
    }
}

/// Accumulated per-trip counters, reset at trip start
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventCounters {
    pub speeding: SeverityCounts,
    pub acceleration: SeverityCounts,
    pub braking: SeverityCounts,
    pub cornering: SeverityCounts,
    /// Distance travelled during the trip (meters)
    pub distance_m: f64,
    /// Seconds of phone handling while moving
    pub handled_seconds: f64,
    /// Seconds with the screen on while moving (tracked, not penalized)
    pub screen_on_moving_seconds: f64,
    /// Seconds driven during night hours
    pub night_seconds: f64,
}

impl EventCounters {
    pub fn category(&self, category: EventCategory) -> &SeverityCounts {
        match category.index() {
            0 => &self.speeding,
            1 => &self.acceleration,
            2 => &self.braking,
            _ => &self.cornering,
        }
    }

    pub fn category_mut(&mut self, category: EventCategory) -> &mut SeverityCounts {
        match category.index() {
            0 => &mut self.speeding,
            1 => &mut self.acceleration,
            2 => &mut self.braking,
            _ => &mut self.cornering,
        }
    }

    /// Total number of counted events across all categories
    pub fn total_events(&self) -> u32 {
        EventCategory::ALL
            .iter()
            .map(|c| self.category(*c).total())
            .sum()
    }
}

/// Phone state supplied by the host on each context tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneContext {
    pub screen_on: bool,
    pub locked: bool,
}

/// Location-tagged record of a counted driving event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMarker {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: i64,
    pub category: EventCategory,
    pub severity: Severity,
    /// Measured quantity that triggered the event (m/s or m/s^2)
    pub value: f64,
}

/// Point of the recorded trip trail
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: i64,
    pub speed_mps: f64,
    pub bearing_deg: f64,
}

impl From<&LocationSample> for PathPoint {
    fn from(sample: &LocationSample) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            timestamp_ms: sample.timestamp_ms,
            speed_mps: sample.speed_mps,
            bearing_deg: sample.bearing_deg,
        }
    }
}

/// Finalized trip, created once per completed trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub trip_id: String,
    pub start_epoch_ms: i64,
    pub end_epoch_ms: i64,
    pub duration_min: f64,
    pub distance_km: f64,
    pub route_id: String,
    /// Behavioral score (0-100)
    pub score: f64,
    /// Star rating (0-5)
    pub stars: u8,
    /// Passed the duration/distance validity gate
    pub valid: bool,
    pub counters: EventCounters,
    pub night_minutes: f64,
    #[serde(default)]
    pub markers: Vec<EventMarker>,
    #[serde(default)]
    pub path: Vec<PathPoint>,
}

/// Snapshot of an in-progress trip for live display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveTripState {
    pub active: bool,
    pub start_time_ms: i64,
    pub duration_min: f64,
    pub distance_km: f64,
    pub live_score: f64,
    pub counters: EventCounters,
    #[serde(default)]
    pub path: Vec<PathPoint>,
}

impl LiveTripState {
    pub fn inactive() -> Self {
        Self {
            active: false,
            start_time_ms: 0,
            duration_min: 0.0,
            distance_km: 0.0,
            live_score: 100.0,
            counters: EventCounters::default(),
            path: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Major > Severity::Mid);
        assert!(Severity::Mid > Severity::Minor);
        assert!(Severity::Minor > Severity::None);
        assert_eq!(Severity::from_level(2), Severity::Mid);
        assert_eq!(Severity::Major.level(), 3);
    }

    #[test]
    fn test_counts_decrement_saturates() {
        let mut counts = SeverityCounts::default();
        counts.decrement(Severity::Minor);
        assert_eq!(counts.minor, 0);

        counts.increment(Severity::Mid);
        counts.increment(Severity::Major);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn test_category_dispatch() {
        let mut counters = EventCounters::default();
        counters
            .category_mut(EventCategory::Braking)
            .increment(Severity::Major);

        assert_eq!(counters.braking.major, 1);
        assert_eq!(counters.category(EventCategory::Braking).major, 1);
        assert_eq!(counters.category(EventCategory::Cornering).total(), 0);
        assert_eq!(counters.total_events(), 1);
    }

    #[test]
    fn test_sample_validity() {
        let ok = LocationSample::new(37.77, -122.41, 0, 10.0, 45.0);
        assert!(ok.has_valid_position());
        assert!(ok.has_valid_kinematics());

        let bad = LocationSample::new(f64::NAN, -122.41, 0, f64::NAN, 45.0);
        assert!(!bad.has_valid_position());
        assert!(!bad.has_valid_kinematics());
        assert_eq!(bad.clamped_speed(), 0.0);

        let negative = LocationSample::new(0.0, 0.0, 0, -3.0, 0.0);
        assert_eq!(negative.clamped_speed(), 0.0);
    }

    #[test]
    fn test_transition_serialization() {
        let json = serde_json::to_string(&TripTransition::Started { start_time_ms: 42 }).unwrap();
        assert_eq!(json, r#"{"transition":"started","start_time_ms":42}"#);
    }
}

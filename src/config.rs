//! Tunable policy tables
//!
//! Every threshold used by the pipeline lives here as a named constant,
//! exposed through serde config structs that load from JSON.

use crate::error::TripError;
use crate::types::Severity;
use serde::{Deserialize, Serialize};

/// Speed above which a sample counts as vehicular motion (~8 km/h)
pub const HIGH_SPEED_MPS: f64 = 2.22;
/// Speed below which a sample counts as stopped (~3 km/h)
pub const LOW_SPEED_MPS: f64 = 0.83;
/// Sustained high-speed time required to confirm a trip start
pub const START_MIN_DURATION_MS: i64 = 20_000;
/// Distance covered while high-speed required to confirm a trip start
pub const START_MIN_DISTANCE_M: f64 = 150.0;
/// Sustained low-speed time that ends a trip
pub const END_LOW_SPEED_MS: i64 = 5 * 60_000;

pub const ALPHA_SPEED: f64 = 0.2;
pub const ALPHA_BEARING: f64 = 0.3;

/// Minimum sample spacing for derivative computation (seconds)
pub const MIN_DT_S: f64 = 0.4;
/// Minimum filtered speed for acceleration/braking/cornering events (~14.4 km/h)
pub const MIN_SPEED_FOR_EVENTS_MPS: f64 = 4.0;
/// Same-category events within this window collapse into one
pub const GROUPING_WINDOW_MS: i64 = 10_000;
/// Gap after which a lower-severity event opens a new group
pub const SEVERITY_RESET_MS: i64 = 3_000;

/// Placeholder posted limit used when the host supplies none (100 km/h)
pub const BASELINE_SPEED_LIMIT_KMH: f64 = 100.0;

pub const TOUCH_WINDOW_MS: i64 = 5_000;
pub const MIN_TOUCHES_FOR_DISTRACTION: usize = 2;
pub const DISTRACTION_MOVING_SPEED_MPS: f64 = 4.0;

pub const MINOR_WEIGHT: f64 = 10.0;
pub const MID_WEIGHT: f64 = 25.0;
pub const MAJOR_WEIGHT: f64 = 45.0;
pub const MIN_VALID_DURATION_MIN: f64 = 2.0;
pub const MIN_VALID_DISTANCE_KM: f64 = 0.8;
pub const LONG_TRIP_THRESHOLD_MIN: f64 = 90.0;
pub const LONG_TRIP_STEP_MIN: f64 = 30.0;
pub const DISTRACTION_PENALTY_PER_MIN: f64 = 5.0;
pub const NIGHT_FACTOR: f64 = 1.2;

pub const FINGERPRINT_MIN_SPACING_M: f64 = 100.0;
pub const FINGERPRINT_GRID_DEG: f64 = 0.001;

pub const NIGHT_START_HOUR: u32 = 23;
pub const NIGHT_END_HOUR: u32 = 5;

/// Trip start/end hysteresis thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripDetectionConfig {
    pub high_speed_mps: f64,
    pub low_speed_mps: f64,
    pub start_min_duration_ms: i64,
    pub start_min_distance_m: f64,
    pub end_low_speed_ms: i64,
}

impl Default for TripDetectionConfig {
    fn default() -> Self {
        Self {
            high_speed_mps: HIGH_SPEED_MPS,
            low_speed_mps: LOW_SPEED_MPS,
            start_min_duration_ms: START_MIN_DURATION_MS,
            start_min_distance_m: START_MIN_DISTANCE_M,
            end_low_speed_ms: END_LOW_SPEED_MS,
        }
    }
}

/// Exponential smoothing factors (0 < alpha <= 1, lower = smoother)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub alpha_speed: f64,
    pub alpha_bearing: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            alpha_speed: ALPHA_SPEED,
            alpha_bearing: ALPHA_BEARING,
        }
    }
}

/// Three ascending break points; a value strictly above a break point
/// reaches that tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityTiers {
    pub minor: f64,
    pub mid: f64,
    pub major: f64,
}

impl SeverityTiers {
    pub const fn new(minor: f64, mid: f64, major: f64) -> Self {
        Self { minor, mid, major }
    }

    pub fn classify(&self, value: f64) -> Severity {
        if !value.is_finite() {
            Severity::None
        } else if value > self.major {
            Severity::Major
        } else if value > self.mid {
            Severity::Mid
        } else if value > self.minor {
            Severity::Minor
        } else {
            Severity::None
        }
    }

    fn is_ascending(&self) -> bool {
        self.minor <= self.mid && self.mid <= self.major
    }
}

/// Speeding tiers relative to the posted (or placeholder) limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedingThresholds {
    /// Limit used when the host has not supplied one (km/h)
    pub baseline_limit_kmh: f64,
    /// Ratios of the limit at which each tier begins
    pub ratios: SeverityTiers,
}

impl Default for SpeedingThresholds {
    fn default() -> Self {
        Self {
            baseline_limit_kmh: BASELINE_SPEED_LIMIT_KMH,
            ratios: SeverityTiers::new(1.10, 1.20, 1.30),
        }
    }
}

impl SpeedingThresholds {
    pub fn classify(&self, speed_kmh: f64, limit_kmh: Option<f64>) -> Severity {
        let limit = limit_kmh
            .filter(|l| l.is_finite() && *l > 0.0)
            .unwrap_or(self.baseline_limit_kmh);
        if limit <= 0.0 {
            return Severity::None;
        }
        self.ratios.classify(speed_kmh / limit)
    }
}

/// Event classification policy table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    pub min_dt_s: f64,
    pub min_speed_for_events_mps: f64,
    pub grouping_window_ms: i64,
    pub severity_reset_ms: i64,
    pub speeding: SpeedingThresholds,
    /// Longitudinal acceleration (m/s^2)
    pub acceleration: SeverityTiers,
    /// Deceleration magnitude (m/s^2); applied to `-a_long`
    pub braking: SeverityTiers,
    /// Lateral acceleration (m/s^2)
    pub cornering: SeverityTiers,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            min_dt_s: MIN_DT_S,
            min_speed_for_events_mps: MIN_SPEED_FOR_EVENTS_MPS,
            grouping_window_ms: GROUPING_WINDOW_MS,
            severity_reset_ms: SEVERITY_RESET_MS,
            speeding: SpeedingThresholds::default(),
            acceleration: SeverityTiers::new(2.5, 3.5, 5.0),
            braking: SeverityTiers::new(1.5, 2.5, 3.5),
            cornering: SeverityTiers::new(0.7, 1.3, 3.0),
        }
    }
}

/// Phone handling detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistractionConfig {
    pub touch_window_ms: i64,
    pub min_touches: usize,
    pub moving_speed_mps: f64,
}

impl Default for DistractionConfig {
    fn default() -> Self {
        Self {
            touch_window_ms: TOUCH_WINDOW_MS,
            min_touches: MIN_TOUCHES_FOR_DISTRACTION,
            moving_speed_mps: DISTRACTION_MOVING_SPEED_MPS,
        }
    }
}

/// Score weights and validity gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub minor_weight: f64,
    pub mid_weight: f64,
    pub major_weight: f64,
    pub min_valid_duration_min: f64,
    pub min_valid_distance_km: f64,
    pub long_trip_threshold_min: f64,
    pub long_trip_step_min: f64,
    pub distraction_penalty_per_min: f64,
    pub night_factor: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            minor_weight: MINOR_WEIGHT,
            mid_weight: MID_WEIGHT,
            major_weight: MAJOR_WEIGHT,
            min_valid_duration_min: MIN_VALID_DURATION_MIN,
            min_valid_distance_km: MIN_VALID_DISTANCE_KM,
            long_trip_threshold_min: LONG_TRIP_THRESHOLD_MIN,
            long_trip_step_min: LONG_TRIP_STEP_MIN,
            distraction_penalty_per_min: DISTRACTION_PENALTY_PER_MIN,
            night_factor: NIGHT_FACTOR,
        }
    }
}

/// Route tile quantization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    pub min_spacing_m: f64,
    pub grid_deg: f64,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            min_spacing_m: FINGERPRINT_MIN_SPACING_M,
            grid_deg: FINGERPRINT_GRID_DEG,
        }
    }
}

/// Night window in local time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NightConfig {
    pub start_hour: u32,
    pub end_hour: u32,
    /// Offset of the driver's local time from UTC
    pub utc_offset_minutes: i32,
}

impl Default for NightConfig {
    fn default() -> Self {
        Self {
            start_hour: NIGHT_START_HOUR,
            end_hour: NIGHT_END_HOUR,
            utc_offset_minutes: 0,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripConfig {
    pub detection: TripDetectionConfig,
    pub filter: FilterConfig,
    pub classifier: ClassifierThresholds,
    pub distraction: DistractionConfig,
    pub scoring: ScoringPolicy,
    pub fingerprint: FingerprintConfig,
    pub night: NightConfig,
}

impl TripConfig {
    /// Load and validate a configuration from JSON. Missing fields take
    /// their default values.
    pub fn from_json(json: &str) -> Result<Self, TripError> {
        let config: TripConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, TripError> {
        serde_json::to_string_pretty(self).map_err(|e| TripError::EncodingError(e.to_string()))
    }

    /// Check internal consistency of the policy tables
    pub fn validate(&self) -> Result<(), TripError> {
        let d = &self.detection;
        if d.low_speed_mps > d.high_speed_mps {
            return Err(TripError::InvalidConfig(
                "detection.low_speed_mps must not exceed high_speed_mps".to_string(),
            ));
        }
        if d.start_min_duration_ms < 0 || d.end_low_speed_ms <= 0 || d.start_min_distance_m < 0.0 {
            return Err(TripError::InvalidConfig(
                "detection windows must be non-negative".to_string(),
            ));
        }

        for (name, alpha) in [
            ("filter.alpha_speed", self.filter.alpha_speed),
            ("filter.alpha_bearing", self.filter.alpha_bearing),
        ] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(TripError::InvalidConfig(format!(
                    "{} must be in (0, 1], got {}",
                    name, alpha
                )));
            }
        }

        let c = &self.classifier;
        for (name, tiers) in [
            ("classifier.speeding.ratios", c.speeding.ratios),
            ("classifier.acceleration", c.acceleration),
            ("classifier.braking", c.braking),
            ("classifier.cornering", c.cornering),
        ] {
            if !tiers.is_ascending() {
                return Err(TripError::InvalidConfig(format!(
                    "{} tiers must be ascending (minor <= mid <= major)",
                    name
                )));
            }
        }
        if c.min_dt_s <= 0.0 {
            return Err(TripError::InvalidConfig(
                "classifier.min_dt_s must be positive".to_string(),
            ));
        }
        if c.grouping_window_ms <= 0 || c.severity_reset_ms < 0 {
            return Err(TripError::InvalidConfig(
                "classifier grouping windows must be positive".to_string(),
            ));
        }

        if self.distraction.touch_window_ms <= 0 {
            return Err(TripError::InvalidConfig(
                "distraction.touch_window_ms must be positive".to_string(),
            ));
        }

        let s = &self.scoring;
        if s.minor_weight < 0.0 || s.mid_weight < 0.0 || s.major_weight < 0.0 || s.night_factor < 1.0 {
            return Err(TripError::InvalidConfig(
                "scoring weights must be non-negative and night_factor >= 1".to_string(),
            ));
        }
        if s.long_trip_step_min <= 0.0 {
            return Err(TripError::InvalidConfig(
                "scoring.long_trip_step_min must be positive".to_string(),
            ));
        }

        if self.fingerprint.grid_deg <= 0.0 {
            return Err(TripError::InvalidConfig(
                "fingerprint.grid_deg must be positive".to_string(),
            ));
        }

        if self.night.start_hour > 23 || self.night.end_hour > 23 {
            return Err(TripError::InvalidConfig(
                "night hours must be in 0..=23".to_string(),
            ));
        }

        Ok(())
    }
}

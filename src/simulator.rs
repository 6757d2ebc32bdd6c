//! Synthetic drives
//!
//! Deterministic 1 Hz sample streams for demos and end-to-end tests. Each
//! scenario starts stationary, drives a profile, then idles long enough for
//! the trip to end on its own.

use crate::geo::offset;
use crate::types::LocationSample;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Starting point of every scenario
pub const BASE_LATITUDE: f64 = 37.7749;
pub const BASE_LONGITUDE: f64 = -122.4194;

const SAMPLE_INTERVAL_MS: i64 = 1_000;
const ACCURACY_M: f64 = 5.0;
const LEAD_IN_S: f64 = 5.0;
/// Long enough to cover the five minute end window
const STATIONARY_TAIL_S: f64 = 600.0;

const CRUISE_MPS: f64 = 10.0;
const FAST_MPS: f64 = 20.0;
const CRUISE_END_S: f64 = 125.0;
const ACCEL_DURATION_S: f64 = 5.0;
const FAST_END_S: f64 = 185.0;
const GENTLE_BRAKE_S: f64 = 20.0;
const HARD_BRAKE_S: f64 = 3.0;
const STRAIGHT_BEARING: f64 = 45.0;

const TURN_RADIUS_M: f64 = 200.0;
/// 45 km/h
const SLOW_TURN_MPS: f64 = 12.5;
/// 65 km/h
const FAST_TURN_MPS: f64 = 18.06;
const STRAIGHT_S: f64 = 120.0;

/// Available synthetic drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Cruise, moderate acceleration, gentle stop; no events
    Normal,
    /// Same drive ending in a 3 s stop from 72 km/h
    HardBrake,
    /// Two half circles of 200 m radius at 45 and 65 km/h
    Cornering,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Normal, Scenario::HardBrake, Scenario::Cornering];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Normal => "normal",
            Scenario::HardBrake => "hard_brake",
            Scenario::Cornering => "cornering",
        }
    }

    /// Seconds of simulated time
    pub fn duration_s(&self) -> f64 {
        match self {
            Scenario::Normal => FAST_END_S + GENTLE_BRAKE_S + STATIONARY_TAIL_S,
            Scenario::HardBrake => FAST_END_S + HARD_BRAKE_S + STATIONARY_TAIL_S,
            Scenario::Cornering => cornering_phases().stop + STATIONARY_TAIL_S,
        }
    }

    /// Generate the full 1 Hz stream starting at `start_ms`
    pub fn generate(&self, start_ms: i64) -> Vec<LocationSample> {
        let count = self.duration_s().ceil() as usize;
        let mut samples = Vec::with_capacity(count);
        let (mut lat, mut lon) = (BASE_LATITUDE, BASE_LONGITUDE);

        for i in 0..count {
            let elapsed = i as f64;
            let (speed, bearing) = self.kinematics(elapsed);
            samples.push(LocationSample {
                latitude: lat,
                longitude: lon,
                timestamp_ms: start_ms + i as i64 * SAMPLE_INTERVAL_MS,
                speed_mps: speed,
                bearing_deg: bearing,
                accuracy_m: ACCURACY_M,
            });
            let step_m = speed * SAMPLE_INTERVAL_MS as f64 / 1000.0;
            (lat, lon) = offset(lat, lon, step_m, bearing);
        }
        samples
    }

    /// `(speed m/s, bearing degrees)` at `elapsed` seconds
    fn kinematics(&self, elapsed: f64) -> (f64, f64) {
        match self {
            Scenario::Normal => straight_profile(elapsed, GENTLE_BRAKE_S),
            Scenario::HardBrake => straight_profile(elapsed, HARD_BRAKE_S),
            Scenario::Cornering => cornering_profile(elapsed),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Scenario::Normal),
            "hard_brake" | "hard-brake" => Ok(Scenario::HardBrake),
            "cornering" => Ok(Scenario::Cornering),
            other => Err(format!("unknown scenario: {}", other)),
        }
    }
}

fn straight_profile(elapsed: f64, brake_s: f64) -> (f64, f64) {
    let speed = if elapsed < LEAD_IN_S {
        0.0
    } else if elapsed < CRUISE_END_S {
        CRUISE_MPS
    } else if elapsed < FAST_END_S {
        let t = elapsed - CRUISE_END_S;
        if t < ACCEL_DURATION_S {
            CRUISE_MPS + (FAST_MPS - CRUISE_MPS) * t / ACCEL_DURATION_S
        } else {
            FAST_MPS
        }
    } else if elapsed < FAST_END_S + brake_s {
        FAST_MPS * (1.0 - (elapsed - FAST_END_S) / brake_s)
    } else {
        0.0
    };
    (speed, STRAIGHT_BEARING)
}

/// Phase end times (seconds) of the cornering loop
struct CorneringPhases {
    slow_turn: f64,
    first_straight: f64,
    fast_turn: f64,
    second_straight: f64,
    stop: f64,
}

fn cornering_phases() -> CorneringPhases {
    let half_circle_m = PI * TURN_RADIUS_M;
    let slow_turn = LEAD_IN_S + half_circle_m / SLOW_TURN_MPS;
    let first_straight = slow_turn + STRAIGHT_S;
    let fast_turn = first_straight + half_circle_m / FAST_TURN_MPS;
    let second_straight = fast_turn + STRAIGHT_S;
    CorneringPhases {
        slow_turn,
        first_straight,
        fast_turn,
        second_straight,
        stop: second_straight + GENTLE_BRAKE_S,
    }
}

fn cornering_profile(elapsed: f64) -> (f64, f64) {
    let p = cornering_phases();
    if elapsed < LEAD_IN_S {
        (0.0, 0.0)
    } else if elapsed < p.slow_turn {
        let angle = SLOW_TURN_MPS / TURN_RADIUS_M * (elapsed - LEAD_IN_S);
        (SLOW_TURN_MPS, angle.to_degrees() % 360.0)
    } else if elapsed < p.first_straight {
        (SLOW_TURN_MPS, 180.0)
    } else if elapsed < p.fast_turn {
        let angle = PI + FAST_TURN_MPS / TURN_RADIUS_M * (elapsed - p.first_straight);
        (FAST_TURN_MPS, angle.to_degrees() % 360.0)
    } else if elapsed < p.second_straight {
        (FAST_TURN_MPS, 0.0)
    } else if elapsed < p.stop {
        let t = elapsed - p.second_straight;
        (FAST_TURN_MPS * (1.0 - t / GENTLE_BRAKE_S), 0.0)
    } else {
        (0.0, 0.0)
    }
}

//! Trip segmentation
//!
//! Two-stage hysteresis on raw speed:
//! - start: sustained high speed for a minimum time AND a minimum distance,
//!   dated back to the first high-speed sample of the candidate window
//! - end: sustained low speed for a minimum time, dated at the sample that
//!   completes the window
//!
//! Pure function of the phase and its accumulators; no I/O.

use crate::config::TripDetectionConfig;
use crate::geo::haversine_m;
use crate::types::{LocationSample, TripPhase, TripTransition};
use log::{debug, info};

/// Accumulator for an unconfirmed trip start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateStart {
    pub start_time_ms: i64,
    pub high_speed_ms: i64,
    pub distance_m: f64,
    pub last_sample: LocationSample,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PhaseState {
    Idle,
    Candidate(CandidateStart),
    Active { start_time_ms: i64, low_speed_ms: i64 },
}

/// Trip boundary detector
#[derive(Debug, Clone)]
pub struct TripStateMachine {
    config: TripDetectionConfig,
    state: PhaseState,
    last_timestamp_ms: Option<i64>,
}

impl TripStateMachine {
    pub fn new(config: &TripDetectionConfig) -> Self {
        Self {
            config: config.clone(),
            state: PhaseState::Idle,
            last_timestamp_ms: None,
        }
    }

    pub fn phase(&self) -> TripPhase {
        match self.state {
            PhaseState::Idle => TripPhase::Idle,
            PhaseState::Candidate(_) => TripPhase::CandidateStart,
            PhaseState::Active { .. } => TripPhase::Active,
        }
    }

    pub fn candidate(&self) -> Option<&CandidateStart> {
        match &self.state {
            PhaseState::Candidate(c) => Some(c),
            _ => None,
        }
    }

    /// Start time of the active trip
    pub fn trip_start_ms(&self) -> Option<i64> {
        match self.state {
            PhaseState::Active { start_time_ms, .. } => Some(start_time_ms),
            _ => None,
        }
    }

    /// Accumulated low-speed time of the active trip
    pub fn low_speed_ms(&self) -> i64 {
        match self.state {
            PhaseState::Active { low_speed_ms, .. } => low_speed_ms,
            _ => 0,
        }
    }

    /// Re-enter the active phase after a host restart
    pub fn resume(&mut self, start_time_ms: i64) {
        self.state = PhaseState::Active {
            start_time_ms,
            low_speed_ms: 0,
        };
    }

    /// End the active trip on an explicit host request
    pub fn force_end(&mut self, now_ms: i64) -> TripTransition {
        match self.state {
            PhaseState::Active { .. } => {
                self.state = PhaseState::Idle;
                info!("trip ended manually at {}", now_ms);
                TripTransition::Ended { end_time_ms: now_ms }
            }
            _ => {
                self.state = PhaseState::Idle;
                TripTransition::None
            }
        }
    }

    /// Advance the machine with one raw sample
    pub fn on_sample(&mut self, sample: &LocationSample) -> TripTransition {
        let now = sample.timestamp_ms;
        // A fix without a usable speed neither confirms nor aborts a candidate
        if !sample.speed_mps.is_finite() && matches!(self.state, PhaseState::Candidate(_)) {
            debug!("non-finite speed at {} skipped during candidate start", now);
            return TripTransition::None;
        }
        let dt = match self.last_timestamp_ms {
            Some(last) => (now - last).max(0),
            None => 0,
        };
        self.last_timestamp_ms = Some(self.last_timestamp_ms.map_or(now, |last| last.max(now)));

        let speed = sample.clamped_speed();
        let is_high = speed > self.config.high_speed_mps;
        let is_low = speed < self.config.low_speed_mps;

        match self.state {
            PhaseState::Idle => {
                if is_high {
                    self.state = PhaseState::Candidate(CandidateStart {
                        start_time_ms: now,
                        high_speed_ms: 0,
                        distance_m: 0.0,
                        last_sample: *sample,
                    });
                    return self.try_promote();
                }
                TripTransition::None
            }
            PhaseState::Candidate(mut candidate) => {
                if !is_high {
                    self.state = PhaseState::Idle;
                    return TripTransition::None;
                }
                candidate.high_speed_ms += dt;
                if sample.has_valid_position() && candidate.last_sample.has_valid_position() {
                    candidate.distance_m += haversine_m(
                        candidate.last_sample.latitude,
                        candidate.last_sample.longitude,
                        sample.latitude,
                        sample.longitude,
                    );
                }
                if sample.has_valid_position() {
                    candidate.last_sample = *sample;
                }
                self.state = PhaseState::Candidate(candidate);
                self.try_promote()
            }
            PhaseState::Active {
                start_time_ms,
                low_speed_ms,
            } => {
                let low_speed_ms = if is_low { low_speed_ms + dt } else { 0 };
                if low_speed_ms >= self.config.end_low_speed_ms {
                    self.state = PhaseState::Idle;
                    info!("trip ended at {} (started {})", now, start_time_ms);
                    TripTransition::Ended { end_time_ms: now }
                } else {
                    self.state = PhaseState::Active {
                        start_time_ms,
                        low_speed_ms,
                    };
                    TripTransition::Ongoing
                }
            }
        }
    }

    fn try_promote(&mut self) -> TripTransition {
        if let PhaseState::Candidate(candidate) = self.state {
            if candidate.high_speed_ms >= self.config.start_min_duration_ms
                && candidate.distance_m >= self.config.start_min_distance_m
            {
                self.state = PhaseState::Active {
                    start_time_ms: candidate.start_time_ms,
                    low_speed_ms: 0,
                };
                info!(
                    "trip started at {} ({} ms, {:.0} m of motion)",
                    candidate.start_time_ms, candidate.high_speed_ms, candidate.distance_m
                );
                return TripTransition::Started {
                    start_time_ms: candidate.start_time_ms,
                };
            }
        }
        TripTransition::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::offset;

    const T0: i64 = 1_705_320_000_000;

    fn machine() -> TripStateMachine {
        TripStateMachine::new(&TripDetectionConfig::default())
    }

    /// Drive north at `speed` with one sample every `step_ms`, starting at `t`
    /// from `lat`; returns the transitions and the final (t, lat).
    fn drive(
        sm: &mut TripStateMachine,
        t: i64,
        lat: f64,
        speed: f64,
        step_ms: i64,
        count: usize,
    ) -> (Vec<TripTransition>, i64, f64) {
        let mut out = Vec::new();
        let mut t = t;
        let mut lat = lat;
        for _ in 0..count {
            out.push(sm.on_sample(&LocationSample::new(lat, 0.0, t, speed, 0.0)));
            t += step_ms;
            lat = offset(lat, 0.0, speed * step_ms as f64 / 1000.0, 0.0).0;
        }
        (out, t, lat)
    }

    fn start_trip(sm: &mut TripStateMachine) -> i64 {
        // 10 m/s for 25 s covers 250 m
        let (transitions, t, _) = drive(sm, T0, 0.0, 10.0, 1_000, 25);
        assert!(transitions.iter().any(|t| t.is_started()));
        t
    }

    #[test]
    fn test_short_burst_does_not_start() {
        let mut sm = machine();
        // 20 samples 1 s apart span 19 s of accumulated high speed
        let (transitions, _, _) = drive(&mut sm, T0, 0.0, 10.0, 1_000, 20);
        assert!(transitions.iter().all(|t| *t == TripTransition::None));
        assert_eq!(sm.phase(), TripPhase::CandidateStart);
        assert_eq!(sm.candidate().unwrap().high_speed_ms, 19_000);
    }

    #[test]
    fn test_start_dated_to_first_high_speed_sample() {
        let mut sm = machine();
        sm.on_sample(&LocationSample::new(0.0, 0.0, T0 - 5_000, 0.0, 0.0));
        let (transitions, _, _) = drive(&mut sm, T0, 0.0, 10.0, 1_000, 22);

        let started: Vec<_> = transitions.iter().filter(|t| t.is_started()).collect();
        assert_eq!(started.len(), 1);
        assert_eq!(*started[0], TripTransition::Started { start_time_ms: T0 });
        // Promotion happens on the sample completing 20 s (the 21st)
        assert!(transitions[20].is_started());
        assert_eq!(transitions[21], TripTransition::Ongoing);
        assert_eq!(sm.trip_start_ms(), Some(T0));
    }

    #[test]
    fn test_time_without_distance_does_not_start() {
        let mut sm = machine();
        // Speed reported above threshold while barely moving (GPS jitter):
        // 3 m/s claimed, but only 5 m per sample on the ground
        let mut lat = 0.0;
        for i in 0..29 {
            let t = sm.on_sample(&LocationSample::new(lat, 0.0, T0 + i * 1_000, 3.0, 0.0));
            assert_eq!(t, TripTransition::None);
            lat = offset(lat, 0.0, 5.0, 0.0).0;
        }
        // 28 steps * 5 m = 140 m after 28 s
        let candidate = sm.candidate().unwrap();
        assert!(candidate.high_speed_ms >= 20_000);
        assert!(candidate.distance_m < 150.0);

        // Two more steps push the distance past 150 m
        let mut started = false;
        for i in 29..31 {
            started |= sm
                .on_sample(&LocationSample::new(lat, 0.0, T0 + i * 1_000, 3.0, 0.0))
                .is_started();
            lat = offset(lat, 0.0, 5.0, 0.0).0;
        }
        assert!(started);
    }

    #[test]
    fn test_candidate_aborts_on_slow_sample() {
        let mut sm = machine();
        drive(&mut sm, T0, 0.0, 10.0, 1_000, 15);
        assert_eq!(sm.phase(), TripPhase::CandidateStart);

        sm.on_sample(&LocationSample::new(0.0, 0.0, T0 + 15_000, 1.0, 0.0));
        assert_eq!(sm.phase(), TripPhase::Idle);
        assert!(sm.candidate().is_none());

        // The next candidate starts from scratch
        let (transitions, _, _) = drive(&mut sm, T0 + 16_000, 0.0, 10.0, 1_000, 15);
        assert!(transitions.iter().all(|t| !t.is_started()));
        assert_eq!(sm.candidate().unwrap().start_time_ms, T0 + 16_000);
    }

    #[test]
    fn test_nan_speed_keeps_candidate() {
        let mut sm = machine();
        let (_, t, lat) = drive(&mut sm, T0, 0.0, 10.0, 1_000, 10);
        let before = *sm.candidate().unwrap();

        assert_eq!(
            sm.on_sample(&LocationSample::new(lat, 0.0, t, f64::NAN, 0.0)),
            TripTransition::None
        );
        assert_eq!(sm.phase(), TripPhase::CandidateStart);
        assert_eq!(*sm.candidate().unwrap(), before);

        // The skipped second still counts once the next valid fix arrives
        let lat = offset(lat, 0.0, 10.0, 0.0).0;
        let (transitions, _, _) = drive(&mut sm, t + 1_000, lat, 10.0, 1_000, 11);
        // 9 s before the gap, 2 s across it, then 1 s per sample
        assert_eq!(transitions.iter().position(|t| t.is_started()), Some(9));
        assert_eq!(sm.trip_start_ms(), Some(T0));
    }

    #[test]
    fn test_end_requires_full_five_minutes() {
        let mut sm = machine();
        let t = start_trip(&mut sm);

        // First low-speed sample contributes its gap from the last moving one
        // 299 samples at 1 s → 299 s of low speed
        for i in 0..299 {
            let tr = sm.on_sample(&LocationSample::new(0.0, 0.0, t + i * 1_000, 0.0, 0.0));
            assert_eq!(tr, TripTransition::Ongoing, "ended early at sample {}", i);
        }
        assert_eq!(sm.low_speed_ms(), 299_000);

        let end = t + 299_000;
        let tr = sm.on_sample(&LocationSample::new(0.0, 0.0, end, 0.0, 0.0));
        assert_eq!(tr, TripTransition::Ended { end_time_ms: end });
        assert_eq!(sm.phase(), TripPhase::Idle);
    }

    #[test]
    fn test_four_fifty_nine_does_not_end() {
        let mut sm = machine();
        let t = start_trip(&mut sm);
        // Sample at t contributes 1 s, then 298 more: 4:59 total
        for i in 0..299 {
            sm.on_sample(&LocationSample::new(0.0, 0.0, t + i * 1_000, 0.5, 0.0));
        }
        assert_eq!(sm.phase(), TripPhase::Active);
        assert_eq!(sm.low_speed_ms(), 299_000);
    }

    #[test]
    fn test_moving_sample_resets_low_speed() {
        let mut sm = machine();
        let t = start_trip(&mut sm);
        for i in 0..200 {
            sm.on_sample(&LocationSample::new(0.0, 0.0, t + i * 1_000, 0.0, 0.0));
        }
        assert!(sm.low_speed_ms() > 0);

        // Creeping at 1.5 m/s is neither low nor high but resets the window
        sm.on_sample(&LocationSample::new(0.0, 0.0, t + 200_000, 1.5, 0.0));
        assert_eq!(sm.low_speed_ms(), 0);
        assert_eq!(sm.phase(), TripPhase::Active);
    }

    #[test]
    fn test_timestamp_regression_clamps() {
        let mut sm = machine();
        let t = start_trip(&mut sm);
        sm.on_sample(&LocationSample::new(0.0, 0.0, t, 0.0, 0.0));
        let before = sm.low_speed_ms();
        sm.on_sample(&LocationSample::new(0.0, 0.0, t - 60_000, 0.0, 0.0));
        assert_eq!(sm.low_speed_ms(), before);
    }

    #[test]
    fn test_resume_and_force_end() {
        let mut sm = machine();
        sm.resume(T0);
        assert_eq!(sm.phase(), TripPhase::Active);
        assert_eq!(sm.trip_start_ms(), Some(T0));

        assert_eq!(
            sm.on_sample(&LocationSample::new(0.0, 0.0, T0 + 60_000, 12.0, 0.0)),
            TripTransition::Ongoing
        );
        assert_eq!(
            sm.force_end(T0 + 61_000),
            TripTransition::Ended { end_time_ms: T0 + 61_000 }
        );
        assert_eq!(sm.force_end(T0 + 62_000), TripTransition::None);
    }
}

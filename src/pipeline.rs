//! Pipeline orchestration
//!
//! This module provides the public API for TripScore. One processor owns one
//! vehicle's sample stream and runs every sample through:
//!
//! 1. TripStateMachine - trip boundaries
//! 2. EventClassifier - filtered kinematics, grouped events, distraction
//! 3. RouteFingerprint - route identity tiles
//! 4. ScoringEngine - score and stars at trip end
//! 5. RouteStore - per-route aggregation of finished trips

use crate::classifier::EventClassifier;
use crate::config::TripConfig;
use crate::distraction::DistractionTick;
use crate::error::TripError;
use crate::fingerprint::RouteFingerprint;
use crate::routes::RouteStore;
use crate::schema::{InputPayload, InputRecord};
use crate::scoring::ScoringEngine;
use crate::state_machine::TripStateMachine;
use crate::types::{
    EventMarker, LiveTripState, LocationSample, PathPoint, PhoneContext, TripPhase, TripRecord,
    TripTransition,
};
use log::{debug, info, warn};
use std::collections::VecDeque;

/// Upper bound on event markers kept per trip
pub const MAX_EVENT_MARKERS: usize = 1000;
/// Upper bound on trail points kept per trip
pub const MAX_PATH_POINTS: usize = 10_000;
/// A trail point is kept only when more than this much time has passed since
/// the previous one
pub const PATH_POINT_SPACING_MS: i64 = 5_000;

/// Per-trip state; exists exactly while the state machine is active
struct ActiveTrip {
    start_time_ms: i64,
    classifier: EventClassifier,
    fingerprint: RouteFingerprint,
    markers: Vec<EventMarker>,
    path: Vec<PathPoint>,
}

impl ActiveTrip {
    fn new(start_time_ms: i64, config: &TripConfig, speed_limit_kmh: Option<f64>) -> Self {
        let mut classifier = EventClassifier::new(
            &config.classifier,
            &config.filter,
            &config.distraction,
            &config.night,
        );
        classifier.set_speed_limit_kmh(speed_limit_kmh);
        let mut fingerprint = RouteFingerprint::new(&config.fingerprint);
        fingerprint.start();

        Self {
            start_time_ms,
            classifier,
            fingerprint,
            markers: Vec::new(),
            path: Vec::new(),
        }
    }

    fn observe(&mut self, sample: &LocationSample) {
        let events = self.classifier.on_sample(sample);
        self.fingerprint.on_location(sample);

        if !sample.has_valid_position() {
            return;
        }
        self.record_path_point(sample);
        for event in events.iter().filter(|e| e.outcome.changes_counts()) {
            if self.markers.len() >= MAX_EVENT_MARKERS {
                break;
            }
            self.markers.push(EventMarker {
                latitude: sample.latitude,
                longitude: sample.longitude,
                timestamp_ms: sample.timestamp_ms,
                category: event.category,
                severity: event.severity,
                value: event.value,
            });
        }
    }

    fn record_path_point(&mut self, sample: &LocationSample) {
        if self.path.len() >= MAX_PATH_POINTS {
            return;
        }
        let spaced = self
            .path
            .last()
            .map_or(true, |last| sample.timestamp_ms - last.timestamp_ms > PATH_POINT_SPACING_MS);
        if spaced {
            self.path.push(PathPoint::from(sample));
        }
    }

    fn duration_min(&self, now_ms: i64) -> f64 {
        ((now_ms - self.start_time_ms) as f64 / 60_000.0).max(0.0)
    }
}

/// Stateful processor for one vehicle's sample stream.
///
/// Not thread-safe by itself; the host delivers samples one at a time.
pub struct TripProcessor {
    config: TripConfig,
    state_machine: TripStateMachine,
    scoring: ScoringEngine,
    route_store: RouteStore,
    active: Option<ActiveTrip>,
    finished: VecDeque<TripRecord>,
    speed_limit_kmh: Option<f64>,
    last_speed_mps: f64,
}

impl Default for TripProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TripProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self::build(TripConfig::default())
    }

    /// Create a processor with a validated configuration
    pub fn with_config(config: TripConfig) -> Result<Self, TripError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: TripConfig) -> Self {
        Self {
            state_machine: TripStateMachine::new(&config.detection),
            scoring: ScoringEngine::new(&config.scoring),
            config,
            route_store: RouteStore::new(),
            active: None,
            finished: VecDeque::new(),
            speed_limit_kmh: None,
            last_speed_mps: 0.0,
        }
    }

    pub fn config(&self) -> &TripConfig {
        &self.config
    }

    pub fn phase(&self) -> TripPhase {
        self.state_machine.phase()
    }

    /// Feed one location sample
    pub fn process_sample(&mut self, sample: &LocationSample) -> TripTransition {
        if !sample.has_valid_position() || !sample.has_valid_kinematics() {
            warn!(
                "malformed sample at {}: position or kinematics not finite",
                sample.timestamp_ms
            );
        }
        self.last_speed_mps = sample.clamped_speed();

        let transition = self.state_machine.on_sample(sample);
        match transition {
            TripTransition::Started { start_time_ms } => {
                let mut trip = ActiveTrip::new(start_time_ms, &self.config, self.speed_limit_kmh);
                trip.observe(sample);
                self.active = Some(trip);
            }
            TripTransition::Ongoing => {
                if let Some(trip) = self.active.as_mut() {
                    trip.observe(sample);
                }
            }
            TripTransition::Ended { end_time_ms } => {
                if let Some(mut trip) = self.active.take() {
                    trip.observe(sample);
                    let record = self.finalize(trip, end_time_ms);
                    self.finished.push_back(record);
                }
            }
            TripTransition::None => {}
        }
        transition
    }

    /// Feed a batch of samples and return the trips they completed
    pub fn process_samples(&mut self, samples: &[LocationSample]) -> Vec<TripRecord> {
        for sample in samples {
            self.process_sample(sample);
        }
        self.take_finished_trips()
    }

    /// Dispatch one recorded input record
    pub fn process_record(&mut self, record: &InputRecord) -> TripTransition {
        match &record.payload {
            InputPayload::Location(sample) => self.process_sample(sample),
            InputPayload::Touch { timestamp_ms } => {
                self.on_touch(*timestamp_ms);
                TripTransition::None
            }
            InputPayload::PhoneContext {
                timestamp_ms,
                screen_on,
                locked,
            } => {
                let ctx = PhoneContext {
                    screen_on: *screen_on,
                    locked: *locked,
                };
                self.on_phone_context(*timestamp_ms, self.last_speed_mps, ctx);
                TripTransition::None
            }
            InputPayload::SpeedLimit { limit_kmh, .. } => {
                self.set_speed_limit_kmh(*limit_kmh);
                TripTransition::None
            }
        }
    }

    /// Record a screen touch. Ignored outside a trip.
    pub fn on_touch(&mut self, timestamp_ms: i64) {
        if let Some(trip) = self.active.as_mut() {
            trip.classifier.on_touch(timestamp_ms);
        }
    }

    /// Evaluate a phone context tick. `None` outside a trip.
    pub fn on_phone_context(
        &mut self,
        now_ms: i64,
        speed_mps: f64,
        ctx: PhoneContext,
    ) -> Option<DistractionTick> {
        self.active
            .as_mut()
            .map(|trip| trip.classifier.on_phone_context(now_ms, speed_mps, ctx))
    }

    /// Posted limit for the current road; `None` reverts to the baseline
    pub fn set_speed_limit_kmh(&mut self, limit_kmh: Option<f64>) {
        self.speed_limit_kmh = limit_kmh;
        if let Some(trip) = self.active.as_mut() {
            trip.classifier.set_speed_limit_kmh(limit_kmh);
        }
    }

    /// Re-enter an active trip after a host restart. Counters restart from
    /// zero; the start time is kept for duration and scoring.
    pub fn resume_trip(&mut self, start_time_ms: i64) {
        if self.active.is_some() {
            warn!("resume requested while a trip is active; discarding it");
        }
        self.state_machine.resume(start_time_ms);
        self.active = Some(ActiveTrip::new(start_time_ms, &self.config, self.speed_limit_kmh));
        info!("trip resumed from {}", start_time_ms);
    }

    /// End the active trip on host request
    pub fn end_trip(&mut self, now_ms: i64) -> Result<TripRecord, TripError> {
        let trip = self.active.take().ok_or(TripError::NoActiveTrip)?;
        self.state_machine.force_end(now_ms);
        Ok(self.finalize(trip, now_ms))
    }

    /// Snapshot for live display
    pub fn live_state(&self, now_ms: i64) -> LiveTripState {
        match &self.active {
            Some(trip) => {
                let counters = trip.classifier.counters().clone();
                let duration_min = trip.duration_min(now_ms);
                LiveTripState {
                    active: true,
                    start_time_ms: trip.start_time_ms,
                    duration_min,
                    distance_km: counters.distance_m / 1000.0,
                    live_score: self.scoring.live_score(&counters, duration_min),
                    counters,
                    path: trip.path.clone(),
                }
            }
            None => LiveTripState::inactive(),
        }
    }

    /// Drain trips completed by the sample stream
    pub fn take_finished_trips(&mut self) -> Vec<TripRecord> {
        self.finished.drain(..).collect()
    }

    pub fn routes(&self) -> &RouteStore {
        &self.route_store
    }

    /// Load route aggregates from JSON
    pub fn load_routes(&mut self, json: &str) -> Result<(), TripError> {
        self.route_store =
            RouteStore::from_json(json).map_err(|e| TripError::ParseError(e.to_string()))?;
        Ok(())
    }

    /// Save route aggregates to JSON
    pub fn save_routes(&self) -> Result<String, TripError> {
        self.route_store
            .to_json()
            .map_err(|e| TripError::EncodingError(e.to_string()))
    }

    fn finalize(&mut self, trip: ActiveTrip, end_time_ms: i64) -> TripRecord {
        let counters = trip.classifier.counters().clone();
        let duration_min = trip.duration_min(end_time_ms);
        let distance_km = counters.distance_m / 1000.0;
        let result = self.scoring.score(&counters, duration_min, distance_km);
        let peak = trip.classifier.cornering_peak();

        let record = TripRecord {
            trip_id: uuid::Uuid::new_v4().to_string(),
            start_epoch_ms: trip.start_time_ms,
            end_epoch_ms: end_time_ms,
            duration_min,
            distance_km,
            route_id: trip.fingerprint.finish(),
            score: result.score,
            stars: result.stars,
            valid: result.valid,
            night_minutes: counters.night_seconds / 60.0,
            counters,
            markers: trip.markers,
            path: trip.path,
        };

        info!(
            "trip {} finished: {:.1} min, {:.2} km, score {:.1} ({} stars, valid {})",
            record.trip_id,
            record.duration_min,
            record.distance_km,
            record.score,
            record.stars,
            record.valid
        );
        debug!(
            "trip {} events: {} total, max lateral {:.3} m/s^2 at {:.1} km/h (yaw {:.4} rad/s)",
            record.trip_id,
            record.counters.total_events(),
            peak.lateral_accel,
            peak.speed_mps * 3.6,
            peak.yaw_rate
        );

        self.route_store.record_trip(&record, end_time_ms);
        record
    }
}

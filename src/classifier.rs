//! Driving event classification
//!
//! Converts filtered kinematics into severity-tiered events per category and
//! collapses bursts of same-category events into one logical occurrence.
//!
//! Per sample:
//! - speeding is evaluated from filtered speed against the active limit
//! - for samples with a valid position, once at least `min_dt_s` has elapsed
//!   since the last evaluated sample, longitudinal acceleration (filtered speed) and lateral acceleration
//!   (filtered speed times raw yaw rate) feed acceleration, braking and
//!   cornering tiers
//! - distance and night time are accumulated

use crate::config::{ClassifierThresholds, DistractionConfig, FilterConfig, NightConfig};
use crate::distraction::{DistractionTick, DistractionTracker};
use crate::filter::SignalFilter;
use crate::geo::{haversine_m, wrap_degrees};
use crate::types::{EventCategory, EventCounters, LocationSample, PhoneContext, Severity, SeverityCounts};
use chrono::{DateTime, FixedOffset, Timelike};
use log::debug;

/// Grouping memory for one event category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventGroupState {
    pub last_event_time_ms: Option<i64>,
    pub last_severity: Severity,
}

impl Default for EventGroupState {
    fn default() -> Self {
        Self {
            last_event_time_ms: None,
            last_severity: Severity::None,
        }
    }
}

/// How a classified severity was folded into the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingOutcome {
    /// New group, one count added
    Opened,
    /// Same group escalated; one count moved from `from` to the new tier
    Upgraded { from: Severity },
    /// Lower severity after the reset window, counted separately
    Retriggered,
    /// Absorbed into the running group, counts unchanged
    Extended,
}

impl GroupingOutcome {
    pub fn changes_counts(&self) -> bool {
        !matches!(self, GroupingOutcome::Extended)
    }
}

/// Fold one severity observation into a category's counts.
///
/// Shared by all categories; `severity` must not be `Severity::None`.
pub fn apply_grouping(
    group: &mut EventGroupState,
    counts: &mut SeverityCounts,
    timestamp_ms: i64,
    severity: Severity,
    grouping_window_ms: i64,
    severity_reset_ms: i64,
) -> GroupingOutcome {
    let since_last = group.last_event_time_ms.map(|last| timestamp_ms - last);

    let outcome = match since_last {
        None => GroupingOutcome::Opened,
        Some(gap) if gap > grouping_window_ms => GroupingOutcome::Opened,
        Some(_) if severity > group.last_severity => GroupingOutcome::Upgraded {
            from: group.last_severity,
        },
        Some(gap) if severity < group.last_severity && gap > severity_reset_ms => {
            GroupingOutcome::Retriggered
        }
        Some(_) => GroupingOutcome::Extended,
    };

    match outcome {
        GroupingOutcome::Opened | GroupingOutcome::Retriggered => {
            counts.increment(severity);
            group.last_severity = severity;
        }
        GroupingOutcome::Upgraded { from } => {
            counts.decrement(from);
            counts.increment(severity);
            group.last_severity = severity;
        }
        GroupingOutcome::Extended => {}
    }
    // Regressed timestamps must not pull the group backwards
    group.last_event_time_ms = Some(group.last_event_time_ms.map_or(timestamp_ms, |last| last.max(timestamp_ms)));

    outcome
}

/// One severity observation and what grouping did with it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedEvent {
    pub category: EventCategory,
    pub severity: Severity,
    pub outcome: GroupingOutcome,
    /// Triggering quantity: km/h for speeding, m/s^2 otherwise
    pub value: f64,
}

/// Largest lateral acceleration observed in the trip
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CorneringPeak {
    pub lateral_accel: f64,
    pub speed_mps: f64,
    pub yaw_rate: f64,
}

/// Previous evaluated sample for derivative computation
#[derive(Debug, Clone, Copy)]
struct DerivativeBase {
    timestamp_ms: i64,
    speed: f64,
    raw_bearing: f64,
}

/// Whether `timestamp_ms` falls inside the configured night window
pub fn is_night(timestamp_ms: i64, night: &NightConfig) -> bool {
    let offset = match FixedOffset::east_opt(night.utc_offset_minutes * 60) {
        Some(o) => o,
        None => return false,
    };
    let hour = match DateTime::from_timestamp_millis(timestamp_ms) {
        Some(utc) => utc.with_timezone(&offset).hour(),
        None => return false,
    };
    if night.start_hour > night.end_hour {
        hour >= night.start_hour || hour < night.end_hour
    } else {
        hour >= night.start_hour && hour < night.end_hour
    }
}

/// Per-trip event classifier and counter owner
#[derive(Debug, Clone)]
pub struct EventClassifier {
    thresholds: ClassifierThresholds,
    night: NightConfig,
    filter: SignalFilter,
    distraction: DistractionTracker,
    groups: [EventGroupState; 4],
    counters: EventCounters,
    speed_limit_kmh: Option<f64>,
    last_timestamp_ms: Option<i64>,
    last_position: Option<(f64, f64)>,
    derivative_base: Option<DerivativeBase>,
    cornering_peak: CorneringPeak,
}

impl EventClassifier {
    pub fn new(
        thresholds: &ClassifierThresholds,
        filter: &FilterConfig,
        distraction: &DistractionConfig,
        night: &NightConfig,
    ) -> Self {
        Self {
            thresholds: thresholds.clone(),
            night: night.clone(),
            filter: SignalFilter::new(filter),
            distraction: DistractionTracker::new(distraction),
            groups: [EventGroupState::default(); 4],
            counters: EventCounters::default(),
            speed_limit_kmh: None,
            last_timestamp_ms: None,
            last_position: None,
            derivative_base: None,
            cornering_peak: CorneringPeak::default(),
        }
    }

    /// Clear all per-trip state. The speed limit survives; it describes the
    /// road, not the trip.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.distraction.reset();
        self.groups = [EventGroupState::default(); 4];
        self.counters = EventCounters::default();
        self.last_timestamp_ms = None;
        self.last_position = None;
        self.derivative_base = None;
        self.cornering_peak = CorneringPeak::default();
    }

    pub fn counters(&self) -> &EventCounters {
        &self.counters
    }

    pub fn cornering_peak(&self) -> CorneringPeak {
        self.cornering_peak
    }

    pub fn filtered_speed(&self) -> Option<f64> {
        let state = self.filter.state();
        state.initialized.then_some(state.filtered_speed)
    }

    /// Posted limit for the current road segment; `None` reverts to the
    /// configured baseline.
    pub fn set_speed_limit_kmh(&mut self, limit: Option<f64>) {
        self.speed_limit_kmh = limit;
    }

    pub fn group_state(&self, category: EventCategory) -> EventGroupState {
        self.groups[Self::slot(category)]
    }

    /// Process one sample of the active trip
    pub fn on_sample(&mut self, sample: &LocationSample) -> Vec<ClassifiedEvent> {
        let now = sample.timestamp_ms;
        let dt_s = match self.last_timestamp_ms {
            Some(last) => ((now - last).max(0) as f64) / 1000.0,
            None => 0.0,
        };
        self.last_timestamp_ms = Some(self.last_timestamp_ms.map_or(now, |last| last.max(now)));

        if sample.has_valid_position() {
            if let Some((lat, lon)) = self.last_position {
                self.counters.distance_m += haversine_m(lat, lon, sample.latitude, sample.longitude);
            }
            self.last_position = Some((sample.latitude, sample.longitude));
        }

        if dt_s > 0.0 && is_night(now, &self.night) {
            self.counters.night_seconds += dt_s;
        }

        let mut events = Vec::new();

        if !sample.has_valid_kinematics() {
            debug!("skipping kinematics for sample at {}: non-finite speed/bearing", now);
            return events;
        }
        let (speed, _) = match self.filter.update(sample.clamped_speed(), sample.bearing_deg) {
            Some(filtered) => filtered,
            None => return events,
        };

        let speed_kmh = speed * 3.6;
        let speeding = self.thresholds.speeding.classify(speed_kmh, self.speed_limit_kmh);
        self.record(EventCategory::Speeding, now, speeding, speed_kmh, &mut events);

        if sample.has_valid_position() {
            self.evaluate_derivatives(now, speed, sample.bearing_deg, &mut events);
        } else {
            debug!("skipping derivatives for sample at {}: invalid position", now);
        }

        events
    }

    fn evaluate_derivatives(
        &mut self,
        now: i64,
        speed: f64,
        raw_bearing: f64,
        events: &mut Vec<ClassifiedEvent>,
    ) {
        let base = match self.derivative_base {
            Some(base) => base,
            None => {
                // Seed from the first real reading so nothing is compared
                // against an implicit standstill
                self.derivative_base = Some(DerivativeBase {
                    timestamp_ms: now,
                    speed,
                    raw_bearing,
                });
                return;
            }
        };

        let dt_s = ((now - base.timestamp_ms).max(0) as f64) / 1000.0;
        if dt_s < self.thresholds.min_dt_s {
            return;
        }

        if speed > self.thresholds.min_speed_for_events_mps {
            let a_long = (speed - base.speed) / dt_s;
            let accel = self.thresholds.acceleration.classify(a_long);
            self.record(EventCategory::Acceleration, now, accel, a_long, events);
            let brake = self.thresholds.braking.classify(-a_long);
            self.record(EventCategory::Braking, now, brake, a_long, events);

            let yaw_rate = wrap_degrees(raw_bearing - base.raw_bearing).to_radians() / dt_s;
            let a_lat = (speed * yaw_rate).abs();
            if a_lat > self.cornering_peak.lateral_accel {
                self.cornering_peak = CorneringPeak {
                    lateral_accel: a_lat,
                    speed_mps: speed,
                    yaw_rate,
                };
            }
            let corner = self.thresholds.cornering.classify(a_lat);
            self.record(EventCategory::Cornering, now, corner, a_lat, events);
        }

        self.derivative_base = Some(DerivativeBase {
            timestamp_ms: now,
            speed,
            raw_bearing,
        });
    }

    fn record(
        &mut self,
        category: EventCategory,
        now: i64,
        severity: Severity,
        value: f64,
        events: &mut Vec<ClassifiedEvent>,
    ) {
        if severity == Severity::None {
            return;
        }
        let slot = Self::slot(category);
        let outcome = apply_grouping(
            &mut self.groups[slot],
            self.counters.category_mut(category),
            now,
            severity,
            self.thresholds.grouping_window_ms,
            self.thresholds.severity_reset_ms,
        );
        if outcome.changes_counts() {
            debug!(
                "{} {} at {} ({:?}, value {:.2})",
                category.as_str(),
                severity.as_str(),
                now,
                outcome,
                value
            );
        }
        events.push(ClassifiedEvent {
            category,
            severity,
            outcome,
            value,
        });
    }

    pub fn on_touch(&mut self, timestamp_ms: i64) {
        self.distraction.on_touch(timestamp_ms);
    }

    /// Evaluate a phone context tick, adding one second per qualifying tick
    pub fn on_phone_context(&mut self, now_ms: i64, speed_mps: f64, ctx: PhoneContext) -> DistractionTick {
        let tick = self.distraction.on_context(now_ms, speed_mps, ctx);
        if tick.handled {
            self.counters.handled_seconds += 1.0;
        }
        if tick.screen_on_moving {
            self.counters.screen_on_moving_seconds += 1.0;
        }
        tick
    }

    fn slot(category: EventCategory) -> usize {
        match category {
            EventCategory::Speeding => 0,
            EventCategory::Acceleration => 1,
            EventCategory::Braking => 2,
            EventCategory::Cornering => 3,
        }
    }
}

//! Trip scoring
//!
//! Absolute (not distance-normalized) severity-weighted penalties, a
//! long-trip duration penalty, a phone-handling penalty and a night
//! multiplier, mapped into a 0-100 score and a 0-5 star rating.

use crate::config::ScoringPolicy;
use crate::types::{EventCategory, EventCounters, SeverityCounts};
use serde::{Deserialize, Serialize};

/// Outcome of scoring one finished trip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    pub stars: u8,
    pub valid: bool,
}

/// Breakdown of the raw penalty before the night factor
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PenaltyBreakdown {
    pub events: f64,
    pub duration: f64,
    pub distraction: f64,
}

impl PenaltyBreakdown {
    pub fn total(&self) -> f64 {
        self.events + self.duration + self.distraction
    }
}

/// Stateless scorer over a [`ScoringPolicy`]
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    policy: ScoringPolicy,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(&ScoringPolicy::default())
    }
}

impl ScoringEngine {
    pub fn new(policy: &ScoringPolicy) -> Self {
        Self {
            policy: policy.clone(),
        }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Trips shorter or closer than the gate are GPS noise
    pub fn is_valid(&self, duration_min: f64, distance_km: f64) -> bool {
        duration_min >= self.policy.min_valid_duration_min
            && distance_km >= self.policy.min_valid_distance_km
    }

    /// Score a finished trip. Invalid trips score 0.
    pub fn score(&self, counters: &EventCounters, duration_min: f64, distance_km: f64) -> ScoreResult {
        if !self.is_valid(duration_min, distance_km) {
            return ScoreResult {
                score: 0.0,
                stars: 0,
                valid: false,
            };
        }

        let night_factor = if counters.night_seconds > 0.0 {
            self.policy.night_factor
        } else {
            1.0
        };
        let penalty = self.penalties(counters, duration_min).total();
        let score = (100.0 - penalty * night_factor).clamp(0.0, 100.0);

        ScoreResult {
            score,
            stars: Self::stars(score),
            valid: true,
        }
    }

    /// Running score for an in-progress trip (no gate, no night factor)
    pub fn live_score(&self, counters: &EventCounters, duration_min: f64) -> f64 {
        (100.0 - self.penalties(counters, duration_min).total()).clamp(0.0, 100.0)
    }

    pub fn penalties(&self, counters: &EventCounters, duration_min: f64) -> PenaltyBreakdown {
        let events = EventCategory::ALL
            .iter()
            .map(|c| self.category_penalty(counters.category(*c)))
            .sum();
        let duration = ((duration_min - self.policy.long_trip_threshold_min)
            / self.policy.long_trip_step_min)
            .max(0.0);
        let distraction =
            self.policy.distraction_penalty_per_min * (counters.handled_seconds / 60.0);

        PenaltyBreakdown {
            events,
            duration,
            distraction,
        }
    }

    fn category_penalty(&self, counts: &SeverityCounts) -> f64 {
        self.policy.minor_weight * counts.minor as f64
            + self.policy.mid_weight * counts.mid as f64
            + self.policy.major_weight * counts.major as f64
    }

    /// `round(score / 20)` clamped to 0..=5
    pub fn stars(score: f64) -> u8 {
        if !score.is_finite() {
            return 0;
        }
        (score / 20.0).round().clamp(0.0, 5.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use pretty_assertions::assert_eq;

    fn engine() -> ScoringEngine {
        ScoringEngine::default()
    }

    #[test]
    fn test_clean_trip_scores_full() {
        let result = engine().score(&EventCounters::default(), 20.0, 10.0);
        assert_eq!(
            result,
            ScoreResult {
                score: 100.0,
                stars: 5,
                valid: true
            }
        );
    }

    #[test]
    fn test_validity_gate_boundaries() {
        let e = engine();
        assert!(e.is_valid(2.0, 0.8));
        assert!(!e.is_valid(1.99, 0.8));
        assert!(!e.is_valid(2.0, 0.79));

        let mut counters = EventCounters::default();
        counters.braking.major = 1;
        let gated = e.score(&counters, 1.99, 5.0);
        assert!(!gated.valid);
        assert_eq!(gated.score, 0.0);
        assert_eq!(gated.stars, 0);

        let ok = e.score(&counters, 2.0, 0.8);
        assert!(ok.valid);
        assert_eq!(ok.score, 55.0);
    }

    #[test]
    fn test_weights_and_stars() {
        let mut counters = EventCounters::default();
        counters.speeding.minor = 1;
        counters.cornering.mid = 1;
        let result = engine().score(&counters, 30.0, 12.0);
        // 100 - 10 - 25
        assert_eq!(result.score, 65.0);
        assert_eq!(result.stars, 3);
    }

    #[test]
    fn test_duration_and_distraction_penalties() {
        let mut counters = EventCounters::default();
        counters.handled_seconds = 120.0;
        let result = engine().score(&counters, 150.0, 100.0);
        // (150 - 90) / 30 = 2, 5 * 120 / 60 = 10
        assert!((result.score - 88.0).abs() < 1e-9);
        assert_eq!(result.stars, 4);
    }

    #[test]
    fn test_night_factor() {
        let mut counters = EventCounters::default();
        counters.acceleration.mid = 2;
        counters.night_seconds = 1.0;
        let result = engine().score(&counters, 30.0, 12.0);
        // 50 * 1.2
        assert!((result.score - 40.0).abs() < 1e-9);
        assert_eq!(result.stars, 2);

        // Night alone costs nothing on a clean trip
        let mut clean = EventCounters::default();
        clean.night_seconds = 600.0;
        assert_eq!(engine().score(&clean, 30.0, 12.0).score, 100.0);
    }

    #[test]
    fn test_adding_events_never_raises_score() {
        let e = engine();
        let mut counters = EventCounters::default();
        let mut previous = e.score(&counters, 45.0, 30.0).score;

        for step in 0..40 {
            let category = EventCategory::ALL[step % 4];
            let severity = Severity::from_level((step % 3) as u8 + 1);
            counters.category_mut(category).increment(severity);

            let score = e.score(&counters, 45.0, 30.0).score;
            assert!(score <= previous);
            assert!((0.0..=100.0).contains(&score));
            previous = score;
        }
        assert_eq!(previous, 0.0);
    }

    #[test]
    fn test_live_score_ignores_gate_and_night() {
        let mut counters = EventCounters::default();
        counters.braking.minor = 1;
        counters.night_seconds = 100.0;
        assert_eq!(engine().live_score(&counters, 0.5), 90.0);
    }

    #[test]
    fn test_stars_rounding() {
        assert_eq!(ScoringEngine::stars(100.0), 5);
        assert_eq!(ScoringEngine::stars(89.9), 4);
        assert_eq!(ScoringEngine::stars(90.0), 5);
        assert_eq!(ScoringEngine::stars(9.9), 0);
        assert_eq!(ScoringEngine::stars(10.0), 1);
        assert_eq!(ScoringEngine::stars(0.0), 0);
        assert_eq!(ScoringEngine::stars(f64::NAN), 0);
    }
}

//! Low-pass filtering of GNSS speed and bearing
//!
//! Single-pole exponential smoothing, `filtered = a * raw + (1 - a) * prev`.
//! Bearing is smoothed on the circle: the shortest signed difference is
//! scaled and added, then the result is wrapped back into (-180, 180].

use crate::config::FilterConfig;
use crate::geo::wrap_degrees;
use serde::{Deserialize, Serialize};

/// Filter memory for one trip
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub filtered_speed: f64,
    /// Degrees in (-180, 180]
    pub filtered_bearing: f64,
    pub initialized: bool,
}

/// Exponential smoother for speed and bearing
#[derive(Debug, Clone)]
pub struct SignalFilter {
    alpha_speed: f64,
    alpha_bearing: f64,
    state: FilterState,
}

impl SignalFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            alpha_speed: config.alpha_speed,
            alpha_bearing: config.alpha_bearing,
            state: FilterState::default(),
        }
    }

    pub fn reset(&mut self) {
        self.state = FilterState::default();
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Feed one raw reading and return `(filtered_speed, filtered_bearing)`.
    ///
    /// The first reading seeds the filter. Non-finite input leaves the state
    /// untouched and returns `None`.
    pub fn update(&mut self, raw_speed: f64, raw_bearing: f64) -> Option<(f64, f64)> {
        if !raw_speed.is_finite() || !raw_bearing.is_finite() {
            return None;
        }
        let speed = raw_speed.max(0.0);
        let bearing = wrap_degrees(raw_bearing);

        if !self.state.initialized {
            self.state = FilterState {
                filtered_speed: speed,
                filtered_bearing: bearing,
                initialized: true,
            };
        } else {
            let s = &mut self.state;
            s.filtered_speed = self.alpha_speed * speed + (1.0 - self.alpha_speed) * s.filtered_speed;
            let diff = wrap_degrees(bearing - s.filtered_bearing);
            s.filtered_bearing = wrap_degrees(s.filtered_bearing + self.alpha_bearing * diff);
        }

        Some((self.state.filtered_speed, self.state.filtered_bearing))
    }

    /// Filtered bearing mapped to compass range [0, 360)
    pub fn compass_bearing(&self) -> f64 {
        self.state.filtered_bearing.rem_euclid(360.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> SignalFilter {
        SignalFilter::new(&FilterConfig::default())
    }

    #[test]
    fn test_first_sample_initializes_without_smoothing() {
        let mut f = filter();
        let (speed, bearing) = f.update(15.0, 90.0).unwrap();
        assert_eq!(speed, 15.0);
        assert_eq!(bearing, 90.0);
        assert!(f.state().initialized);
    }

    #[test]
    fn test_speed_smoothing() {
        let mut f = filter();
        f.update(10.0, 0.0);
        let (speed, _) = f.update(20.0, 0.0).unwrap();
        // 0.2 * 20 + 0.8 * 10
        assert!((speed - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_wraps_across_north() {
        let mut f = filter();
        f.update(10.0, 359.0);
        for raw in [1.0, 359.0, 1.0, 0.5, 359.5] {
            f.update(10.0, raw);
            let compass = f.compass_bearing();
            // Must stay near north, never swinging through south
            let off_north = compass.min(360.0 - compass);
            assert!(off_north < 2.0, "bearing drifted to {}", compass);
        }
    }

    #[test]
    fn test_bearing_step_across_boundary() {
        let mut f = filter();
        f.update(10.0, 350.0);
        let (_, bearing) = f.update(10.0, 10.0).unwrap();
        // Shortest path is +20 degrees; 30% of it is +6 from -10
        assert!((bearing - (-4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_nan_does_not_poison_state() {
        let mut f = filter();
        f.update(10.0, 45.0);
        assert!(f.update(f64::NAN, 45.0).is_none());
        assert!(f.update(10.0, f64::INFINITY).is_none());

        let (speed, bearing) = f.update(10.0, 45.0).unwrap();
        assert!(speed.is_finite());
        assert!((bearing - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let mut f = filter();
        f.update(10.0, 45.0);
        f.reset();
        assert!(!f.state().initialized);
        let (speed, _) = f.update(30.0, 0.0).unwrap();
        assert_eq!(speed, 30.0);
    }
}

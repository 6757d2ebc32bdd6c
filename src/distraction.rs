//! Phone handling detection
//!
//! The host reports touch events as they happen and polls phone context
//! (screen, keyguard) about once per second. A tick counts as one second of
//! handling only when the vehicle is moving, the screen is on, the device is
//! unlocked and enough touches fall inside the trailing window.

use crate::config::DistractionConfig;
use crate::types::PhoneContext;
use std::collections::VecDeque;

/// Result of evaluating one context tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistractionTick {
    /// Counts toward penalized handling time
    pub handled: bool,
    /// Screen on while moving (tracked only)
    pub screen_on_moving: bool,
}

/// Rolling touch window
#[derive(Debug, Clone)]
pub struct DistractionTracker {
    config: DistractionConfig,
    touches: VecDeque<i64>,
}

impl DistractionTracker {
    pub fn new(config: &DistractionConfig) -> Self {
        Self {
            config: config.clone(),
            touches: VecDeque::new(),
        }
    }

    pub fn reset(&mut self) {
        self.touches.clear();
    }

    /// Record a touch at `timestamp_ms`
    pub fn on_touch(&mut self, timestamp_ms: i64) {
        self.touches.push_back(timestamp_ms);
        self.prune(timestamp_ms);
    }

    /// Touches inside `[now - window, now]`
    pub fn recent_touches(&self, now_ms: i64) -> usize {
        self.touches
            .iter()
            .filter(|t| **t <= now_ms && now_ms - **t <= self.config.touch_window_ms)
            .count()
    }

    /// Evaluate one context tick
    pub fn on_context(&mut self, now_ms: i64, speed_mps: f64, ctx: PhoneContext) -> DistractionTick {
        self.prune(now_ms);

        let moving = speed_mps.is_finite() && speed_mps > self.config.moving_speed_mps;
        let unlocked = !ctx.locked;

        let handled = moving
            && ctx.screen_on
            && unlocked
            && self.recent_touches(now_ms) >= self.config.min_touches;

        DistractionTick {
            handled,
            screen_on_moving: moving && ctx.screen_on,
        }
    }

    fn prune(&mut self, now_ms: i64) {
        let horizon = now_ms - self.config.touch_window_ms;
        self.touches.retain(|t| *t >= horizon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNLOCKED_ON: PhoneContext = PhoneContext {
        screen_on: true,
        locked: false,
    };

    fn tracker() -> DistractionTracker {
        DistractionTracker::new(&DistractionConfig::default())
    }

    #[test]
    fn test_two_touches_while_moving_counts() {
        let mut t = tracker();
        t.on_touch(1_000);
        t.on_touch(2_000);

        let tick = t.on_context(3_000, 10.0, UNLOCKED_ON);
        assert!(tick.handled);
        assert!(tick.screen_on_moving);
    }

    #[test]
    fn test_single_touch_is_not_handling() {
        let mut t = tracker();
        t.on_touch(1_000);
        assert!(!t.on_context(2_000, 10.0, UNLOCKED_ON).handled);
    }

    #[test]
    fn test_touches_expire_after_window() {
        let mut t = tracker();
        t.on_touch(1_000);
        t.on_touch(2_000);
        // 2_000 is still inside, 1_000 is 6 s old
        assert!(!t.on_context(7_000, 10.0, UNLOCKED_ON).handled);
        assert_eq!(t.recent_touches(7_000), 1);
    }

    #[test]
    fn test_requires_moving_screen_and_unlocked() {
        let mut t = tracker();
        t.on_touch(1_000);
        t.on_touch(1_500);

        // Slow
        let tick = t.on_context(2_000, 3.0, UNLOCKED_ON);
        assert!(!tick.handled);
        assert!(!tick.screen_on_moving);

        // Locked
        let locked = PhoneContext {
            screen_on: true,
            locked: true,
        };
        let tick = t.on_context(2_000, 10.0, locked);
        assert!(!tick.handled);
        assert!(tick.screen_on_moving);

        // Screen off
        let off = PhoneContext {
            screen_on: false,
            locked: false,
        };
        assert_eq!(t.on_context(2_000, 10.0, off), DistractionTick::default());
    }
}

use crate::config::{FRAME_DROP_TOLERANCE, FrameDropConfig};

/// Detects sustained frame drops from per-refresh timestamps
///
/// The governor only observes. Once `threshold` consecutive late ticks have been seen
/// after the grace period it reports a fallback exactly once, until [`reset`] starts a
/// new session.
///
/// [`reset`]: FrameDropGovernor::reset
#[derive(Debug, Clone)]
pub struct FrameDropGovernor {
    enabled: bool,
    threshold: u32,
    target_interval_ms: f64,
    grace_period_ms: f64,
    consecutive_drops: u32,
    last_tick: Option<f64>,
    session_start: Option<f64>,
    tripped: bool,
}

impl FrameDropGovernor {
    pub fn new(config: &FrameDropConfig) -> Self {
        Self {
            enabled: config.enabled,
            threshold: config.threshold.max(1),
            target_interval_ms: config.target_interval_ms(),
            grace_period_ms: config.grace_period_ms,
            consecutive_drops: 0,
            last_tick: None,
            session_start: None,
            tripped: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn consecutive_drops(&self) -> u32 {
        self.consecutive_drops
    }

    /// Starts a new detection session at `now` (milliseconds)
    pub fn reset(&mut self, now: f64) {
        self.consecutive_drops = 0;
        self.last_tick = None;
        self.session_start = Some(now);
        self.tripped = false;
    }

    /// Feeds one refresh timestamp; returns `true` when the fallback must fire
    pub fn tick(&mut self, now: f64) -> bool {
        if !self.enabled || self.tripped {
            return false;
        }

        let start = *self.session_start.get_or_insert(now);
        let previous = self.last_tick.replace(now);
        if now - start < self.grace_period_ms {
            return false;
        }

        let Some(previous) = previous else {
            return false;
        };

        if now - previous > self.target_interval_ms * FRAME_DROP_TOLERANCE {
            self.consecutive_drops += 1;
        } else {
            self.consecutive_drops = 0;
        }

        if self.consecutive_drops >= self.threshold {
            tracing::debug!(drops = self.consecutive_drops, "frame drop threshold reached");
            self.tripped = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor(threshold: u32) -> FrameDropGovernor {
        let mut governor = FrameDropGovernor::new(&FrameDropConfig {
            enabled: true,
            threshold,
            target_fps: 60.0,
            grace_period_ms: 3000.0,
        });
        governor.reset(0.0);
        governor
    }

    #[test]
    fn samples_inside_grace_period_are_ignored() {
        let mut governor = governor(2);
        for t in [0.0, 500.0, 1000.0, 2000.0, 2999.0] {
            assert!(!governor.tick(t));
        }
        assert_eq!(governor.consecutive_drops(), 0);
    }

    #[test]
    fn trips_once_after_consecutive_drops() {
        let mut governor = governor(5);
        let mut now = 3000.0;
        governor.tick(now);

        let mut fired = 0;
        for _ in 0..8 {
            now += 30.0;
            if governor.tick(now) {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn on_time_frame_resets_counter() {
        let mut governor = governor(3);
        let mut now = 3000.0;
        governor.tick(now);
        for step in [30.0, 30.0, 16.0, 30.0, 30.0] {
            now += step;
            assert!(!governor.tick(now));
        }
        assert_eq!(governor.consecutive_drops(), 2);
    }

    #[test]
    fn tolerance_boundary_is_exclusive() {
        let mut governor = governor(1);
        governor.tick(3000.0);
        assert!(!governor.tick(3025.0));
        assert!(governor.tick(3051.0));
    }

    #[test]
    fn disabled_never_fires() {
        let mut governor = FrameDropGovernor::new(&FrameDropConfig {
            enabled: false,
            ..FrameDropConfig::default()
        });
        assert!((0..1000).all(|i| !governor.tick(i as f64 * 100.0)));
    }

    #[test]
    fn reset_rearms() {
        let mut governor = governor(1);
        governor.tick(3000.0);
        assert!(governor.tick(3100.0));
        assert!(!governor.tick(3200.0));

        governor.reset(10_000.0);
        governor.tick(13_000.0);
        assert!(governor.tick(13_100.0));
    }
}

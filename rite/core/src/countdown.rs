//! Exhibit countdown
//!
//! How long a composition stays on display before the surface starts urging
//! destruction. Display only: expiry never triggers a transition by itself.
//! Callers pass the current instant, so the countdown follows tokio's clock
//! (and its paused clock in tests).

use std::time::Duration;

use tokio::time::Instant;

/// Default display time of a composition
pub const DEFAULT_COUNTDOWN: Duration = Duration::from_secs(90);

/// A running countdown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    started: Instant,
    duration: Duration,
}

impl Countdown {
    /// Start counting down from `now`
    #[must_use]
    pub fn start(duration: Duration, now: Instant) -> Self {
        Self {
            started: now,
            duration,
        }
    }

    /// Total duration
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whole seconds left, never negative
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.started).as_secs();
        Duration::from_secs(self.duration.as_secs().saturating_sub(elapsed))
    }

    /// Remaining time as `mm:ss`
    #[must_use]
    pub fn display(&self, now: Instant) -> String {
        format_mm_ss(self.remaining(now))
    }

    /// Whether the time is up
    #[must_use]
    pub fn expired(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }
}

/// Format whole seconds as zero-padded `mm:ss`
#[must_use]
pub fn format_mm_ss(time: Duration) -> String {
    let secs = time.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_counts_down_in_whole_seconds() {
        let t0 = Instant::now();
        let c = Countdown::start(DEFAULT_COUNTDOWN, t0);
        assert_eq!(c.display(t0), "01:30");
        assert_eq!(c.display(t0 + Duration::from_millis(999)), "01:30");
        assert_eq!(c.display(t0 + Duration::from_secs(1)), "01:29");
        assert_eq!(c.display(t0 + Duration::from_secs(61)), "00:29");
    }

    #[test]
    fn test_expiry_clamps_at_zero() {
        let t0 = Instant::now();
        let c = Countdown::start(Duration::from_secs(5), t0);
        assert!(!c.expired(t0 + Duration::from_secs(4)));
        assert!(c.expired(t0 + Duration::from_secs(5)));
        assert_eq!(c.display(t0 + Duration::from_secs(600)), "00:00");
    }

    #[test]
    fn test_earlier_instant_reads_full_time() {
        let t0 = Instant::now();
        let c = Countdown::start(Duration::from_secs(10), t0 + Duration::from_secs(3));
        assert_eq!(c.remaining(t0), Duration::from_secs(10));
    }

    #[test]
    fn test_format_long_durations() {
        assert_eq!(format_mm_ss(Duration::from_secs(3599)), "59:59");
        assert_eq!(format_mm_ss(Duration::from_secs(6000)), "100:00");
    }
}

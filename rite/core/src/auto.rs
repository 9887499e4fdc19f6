//! Auto Rite
//!
//! Unattended operation for installations: a fixed-length cycle split into
//! phases by fraction of the cycle elapsed.
//!
//! | Fraction | Phase |
//! |---|---|
//! | `< 0.55` | Create |
//! | `< 0.80` | Destroy |
//! | otherwise | After |
//!
//! [`AutoRite::step`] turns elapsed time into the [`RiteEvent`]s a surface
//! would have sent, so the rite itself needs no special mode.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::events::RiteEvent;

/// Default length of one unattended cycle
pub const DEFAULT_AUTO_CYCLE: Duration = Duration::from_secs(32);

/// End of the create phase, as a fraction of the cycle
pub const CREATE_UNTIL: f64 = 0.55;

/// End of the destroy phase, as a fraction of the cycle
pub const DESTROY_UNTIL: f64 = 0.8;

/// Phase of an unattended cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoPhase {
    /// Composition on display
    Create,
    /// Destruction running
    Destroy,
    /// Residue on display
    After,
}

/// Schedule of unattended cycles
#[derive(Clone, Debug)]
pub struct AutoRite {
    cycle: Duration,
    last: Option<(u128, AutoPhase)>,
}

impl AutoRite {
    /// Schedule with the given cycle length (zero is treated as one second)
    #[must_use]
    pub fn new(cycle: Duration) -> Self {
        let cycle = if cycle.is_zero() {
            Duration::from_secs(1)
        } else {
            cycle
        };
        Self { cycle, last: None }
    }

    /// Cycle length
    #[must_use]
    pub fn cycle(&self) -> Duration {
        self.cycle
    }

    /// Completed cycles before `elapsed`
    #[must_use]
    pub fn cycle_index(&self, elapsed: Duration) -> u128 {
        elapsed.as_nanos() / self.cycle.as_nanos()
    }

    /// Phase at `elapsed` since the schedule started
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn phase_at(&self, elapsed: Duration) -> AutoPhase {
        let into = elapsed.as_nanos() % self.cycle.as_nanos();
        let p = into as f64 / self.cycle.as_nanos() as f64;
        if p < CREATE_UNTIL {
            AutoPhase::Create
        } else if p < DESTROY_UNTIL {
            AutoPhase::Destroy
        } else {
            AutoPhase::After
        }
    }

    /// Events needed to catch up with `elapsed`
    ///
    /// Empty while the phase is unchanged. Entering After emits nothing: the
    /// residue arrives when the destruction completes. A new cycle
    /// regenerates from the old one before creating, destroying first if the
    /// old one never got that far.
    pub fn step(&mut self, elapsed: Duration) -> Vec<RiteEvent> {
        let now = (self.cycle_index(elapsed), self.phase_at(elapsed));
        let mut events = Vec::new();

        match self.last {
            Some(last) if last == now => return events,
            Some((index, phase)) if index == now.0 => {
                if phase == AutoPhase::Create && now.1 != AutoPhase::Create {
                    events.push(RiteEvent::Destroy);
                }
            }
            last => {
                if let Some((_, phase)) = last {
                    if phase == AutoPhase::Create {
                        events.push(RiteEvent::Destroy);
                    }
                    events.push(RiteEvent::Regenerate);
                }
                events.push(RiteEvent::Create);
                if now.1 != AutoPhase::Create {
                    events.push(RiteEvent::Destroy);
                }
            }
        }

        self.last = Some(now);
        events
    }
}

impl Default for AutoRite {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_CYCLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_phase_boundaries() {
        let auto = AutoRite::default();
        assert_eq!(auto.phase_at(ms(0)), AutoPhase::Create);
        assert_eq!(auto.phase_at(ms(17_599)), AutoPhase::Create);
        assert_eq!(auto.phase_at(ms(17_600)), AutoPhase::Destroy);
        assert_eq!(auto.phase_at(ms(25_599)), AutoPhase::Destroy);
        assert_eq!(auto.phase_at(ms(25_600)), AutoPhase::After);
        assert_eq!(auto.phase_at(ms(31_999)), AutoPhase::After);
        assert_eq!(auto.phase_at(ms(32_000)), AutoPhase::Create);
    }

    #[test]
    fn test_one_full_cycle_of_events() {
        let mut auto = AutoRite::default();
        assert_eq!(auto.step(ms(0)), vec![RiteEvent::Create]);
        assert!(auto.step(ms(5_000)).is_empty());
        assert_eq!(auto.step(ms(18_000)), vec![RiteEvent::Destroy]);
        assert!(auto.step(ms(26_000)).is_empty());
        assert_eq!(
            auto.step(ms(32_100)),
            vec![RiteEvent::Regenerate, RiteEvent::Create]
        );
    }

    #[test]
    fn test_skipped_phases_are_caught_up() {
        let mut auto = AutoRite::default();
        assert_eq!(
            auto.step(ms(20_000)),
            vec![RiteEvent::Create, RiteEvent::Destroy]
        );

        let mut slow = AutoRite::default();
        slow.step(ms(1_000));
        assert_eq!(
            slow.step(ms(40_000)),
            vec![RiteEvent::Destroy, RiteEvent::Regenerate, RiteEvent::Create]
        );
    }

    #[test]
    fn test_zero_cycle_is_clamped() {
        let auto = AutoRite::new(Duration::ZERO);
        assert_eq!(auto.cycle(), Duration::from_secs(1));
        assert_eq!(auto.cycle_index(ms(2_500)), 2);
    }
}

//! Fault injection for exercising delivery semantics.
//!
//! Both knobs are orthogonal to correctness and fully bypassable: a drop
//! rate of 0.0 and a withhold count of 0 make them no-ops.

use std::sync::atomic::{AtomicU32, Ordering};

use rand::Rng;

/// Drops a configurable fraction of inbound datagrams before any
/// processing, so the request is never seen at all.
#[derive(Debug)]
pub struct LossSimulator {
    drop_rate: f64,
}

impl LossSimulator {
    pub fn new(drop_rate: f64) -> Self {
        Self {
            drop_rate: drop_rate.clamp(0.0, 1.0),
        }
    }

    pub fn should_drop(&self) -> bool {
        self.drop_rate > 0.0 && rand::thread_rng().gen::<f64>() < self.drop_rate
    }
}

/// Suppresses N consecutive outbound responses after successful
/// processing, then lets one through and re-arms. Exercises client-side
/// retry without touching the inbound path.
#[derive(Debug)]
pub struct ResponseWithholder {
    configured: u32,
    remaining: AtomicU32,
}

impl ResponseWithholder {
    pub fn new(count: u32) -> Self {
        Self {
            configured: count,
            remaining: AtomicU32::new(count),
        }
    }

    /// True when this response must be withheld.
    pub fn should_withhold(&self) -> bool {
        if self.configured == 0 {
            return false;
        }
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |remaining| {
                Some(if remaining > 0 {
                    remaining - 1
                } else {
                    self.configured
                })
            })
            .unwrap_or(0);
        previous > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_never_drops() {
        let sim = LossSimulator::new(0.0);
        assert!((0..1000).all(|_| !sim.should_drop()));
    }

    #[test]
    fn full_rate_always_drops() {
        let sim = LossSimulator::new(1.0);
        assert!((0..1000).all(|_| sim.should_drop()));
    }

    #[test]
    fn rate_is_clamped() {
        assert!(LossSimulator::new(7.5).should_drop());
        assert!(!LossSimulator::new(-1.0).should_drop());
    }

    #[test]
    fn withholder_disabled_at_zero() {
        let withholder = ResponseWithholder::new(0);
        assert!((0..10).all(|_| !withholder.should_withhold()));
    }

    #[test]
    fn withholds_n_then_releases_one() {
        let withholder = ResponseWithholder::new(2);
        assert!(withholder.should_withhold());
        assert!(withholder.should_withhold());
        assert!(!withholder.should_withhold());
        // Re-armed for the next round.
        assert!(withholder.should_withhold());
        assert!(withholder.should_withhold());
        assert!(!withholder.should_withhold());
    }
}

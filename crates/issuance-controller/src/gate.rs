//! Delay gate — minimum interval between successful executions.

use issuance_core::{IssuanceError, IssuanceResult};

/// Tracks the last successful execution second.
///
/// The timestamp only moves forward: a clock reading behind it counts as
/// zero elapsed time and leaves it untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayGate {
    previous_adjustment_second: u64,
}

impl DelayGate {
    pub fn new(previous_adjustment_second: u64) -> Self {
        Self {
            previous_adjustment_second,
        }
    }

    pub fn previous_adjustment_second(&self) -> u64 {
        self.previous_adjustment_second
    }

    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.previous_adjustment_second)
    }

    /// Elapsed seconds, or `DelayNotPassed` if fewer than `delay`.
    pub fn check(&self, now: u64, delay: u64) -> IssuanceResult<u64> {
        let elapsed = self.elapsed(now);
        if elapsed < delay {
            return Err(IssuanceError::DelayNotPassed {
                elapsed,
                required: delay,
            });
        }
        Ok(elapsed)
    }

    /// Record a successful execution at `now`.
    pub fn advance(&mut self, now: u64) {
        self.previous_adjustment_second = self.previous_adjustment_second.max(now);
    }
}

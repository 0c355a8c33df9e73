//! Rate limiter for the rate-capped convergence model.

use crate::fixed::SECONDS_IN_YEAR;
use crate::types::RatioReading;

/// Clamps the ideal per-second convergence rate to a configured maximum.
///
/// The ideal rate closes the current gap over one convergence horizon
/// (`SECONDS_IN_YEAR`). The cap is a hard ceiling, not an average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiter {
    pub max_adjustment_per_second: u128,
}

impl RateLimiter {
    pub fn new(max_adjustment_per_second: u128) -> Self {
        Self {
            max_adjustment_per_second,
        }
    }

    /// `|current_ratio - EXTRA_PRECISION| / SECONDS_IN_YEAR`.
    pub fn ideal_rate(reading: &RatioReading) -> u128 {
        reading.distance_from_target() / u128::from(SECONDS_IN_YEAR)
    }

    /// `min(ideal_rate, max_adjustment_per_second)`.
    pub fn effective_rate(&self, reading: &RatioReading) -> u128 {
        Self::ideal_rate(reading).min(self.max_adjustment_per_second)
    }

    /// Whether the cap, rather than the gap, decides the rate.
    pub fn is_limiting(&self, reading: &RatioReading) -> bool {
        Self::ideal_rate(reading) > self.max_adjustment_per_second
    }
}

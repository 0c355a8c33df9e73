//! Convergence models — how much to mint or burn for the elapsed time.
//!
//! A model returns the raw magnitude of the adjustment; the direction comes
//! from the ratio reading and the overshoot guard clamps the result
//! afterwards. Models are selected by configuration through
//! [`ConvergenceStrategy`].

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::error::IssuanceResult;
use crate::fixed::{self, mul3_div_saturating, mul_div_floor, EXTRA_PRECISION, RATIO_PRECISION};
use crate::rate::RateLimiter;
use crate::types::{Direction, PoolSnapshot, RatioReading};

/// Computes the raw adjustment magnitude for one execution.
pub trait ConvergenceModel {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn compute_adjustment(
        &self,
        snapshot: &PoolSnapshot,
        reading: &RatioReading,
        target_ratio: u128,
        elapsed_seconds: u64,
    ) -> IssuanceResult<u128>;

    /// Whether the amount already accounts for the supply moving with the
    /// mint or burn. Such models are clamped against the settled target.
    fn tracks_supply(&self) -> bool {
        false
    }
}

/// Which convergence model the controller runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ConvergenceStrategy {
    RateCapped(RateCapped),
    RecoveryTime(RecoveryTime),
}

impl ConvergenceModel for ConvergenceStrategy {
    fn name(&self) -> &'static str {
        match self {
            Self::RateCapped(m) => m.name(),
            Self::RecoveryTime(m) => m.name(),
        }
    }

    fn tracks_supply(&self) -> bool {
        match self {
            Self::RateCapped(m) => m.tracks_supply(),
            Self::RecoveryTime(m) => m.tracks_supply(),
        }
    }

    fn compute_adjustment(
        &self,
        snapshot: &PoolSnapshot,
        reading: &RatioReading,
        target_ratio: u128,
        elapsed_seconds: u64,
    ) -> IssuanceResult<u128> {
        match self {
            Self::RateCapped(m) => {
                m.compute_adjustment(snapshot, reading, target_ratio, elapsed_seconds)
            }
            Self::RecoveryTime(m) => {
                m.compute_adjustment(snapshot, reading, target_ratio, elapsed_seconds)
            }
        }
    }
}

// ── Rate capped ────────────────────────────────────────────────────

/// Linear model: `rate × elapsed × supply / EXTRA_PRECISION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCapped {
    /// Ceiling on the per-second rate, scaled by `EXTRA_PRECISION`.
    #[serde(with = "fixed::ratio_str")]
    pub max_adjustment_per_second: u128,
}

impl ConvergenceModel for RateCapped {
    fn name(&self) -> &'static str {
        "rate_capped"
    }

    fn compute_adjustment(
        &self,
        snapshot: &PoolSnapshot,
        reading: &RatioReading,
        _target_ratio: u128,
        elapsed_seconds: u64,
    ) -> IssuanceResult<u128> {
        let rate = RateLimiter::new(self.max_adjustment_per_second).effective_rate(reading);
        mul3_div_saturating(
            rate,
            u128::from(elapsed_seconds),
            snapshot.token_total_supply,
            EXTRA_PRECISION,
        )
    }
}

// ── Recovery time ──────────────────────────────────────────────────

/// Closed-form model that lands on the target after `recovery_time`.
///
/// With `r` the pool's share of supply, `t` the target and `T` the recovery
/// time, the share follows a parabola in elapsed time `τ`:
///
/// ```text
/// burn:  r(τ) = r + (1-t)·τ²/T² - 2·τ·√((1-t)(r-t))/T
/// mint:  r(τ) = r + 2·τ·√(t(t-r))/T - t·τ²/T²
/// ```
///
/// Both reach `t` at their vertex, no later than `T`; past the vertex the
/// share stays at `t`. The amount accounts for the supply moving with the
/// mint or burn: `x = |balance - r(τ)·supply| / (1 - r(τ))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryTime {
    /// Seconds to fully close the current gap.
    pub recovery_time: u64,
}

impl ConvergenceModel for RecoveryTime {
    fn name(&self) -> &'static str {
        "recovery_time"
    }

    fn tracks_supply(&self) -> bool {
        true
    }

    fn compute_adjustment(
        &self,
        snapshot: &PoolSnapshot,
        reading: &RatioReading,
        target_ratio: u128,
        elapsed_seconds: u64,
    ) -> IssuanceResult<u128> {
        let balance = snapshot.common_pool_balance;
        let supply = snapshot.token_total_supply;
        let share = mul_div_floor(balance, RATIO_PRECISION, supply)?;

        let p = U256::from(RATIO_PRECISION);
        let t = U256::from(target_ratio);
        let r = U256::from(share);
        let tau = U256::from(elapsed_seconds);
        let recovery = U256::from(self.recovery_time);
        let tau_sq = tau * tau;
        let recovery_sq = recovery * recovery;

        match reading.direction {
            Direction::Burn => {
                let a = p.saturating_sub(t);
                let b = r.saturating_sub(t);
                if b.is_zero() {
                    return Ok(0);
                }
                let next = if a * tau_sq >= b * recovery_sq {
                    t
                } else {
                    let rise = a * tau_sq / recovery_sq;
                    let fall = U256::from(2u8) * tau * (a * b).integer_sqrt() / recovery;
                    (r + rise).saturating_sub(fall).max(t)
                };
                if next >= p {
                    return Ok(0);
                }
                let numerator = (U256::from(balance) * p).saturating_sub(next * U256::from(supply));
                Ok(fixed::saturate(numerator / (p - next)))
            }
            Direction::Mint => {
                let b = t.saturating_sub(r);
                if b.is_zero() {
                    return Ok(0);
                }
                let next = if t * tau_sq >= b * recovery_sq {
                    t
                } else {
                    let rise = U256::from(2u8) * tau * (t * b).integer_sqrt() / recovery;
                    let fall = t * tau_sq / recovery_sq;
                    (r + rise).saturating_sub(fall).min(t)
                };
                if next >= p {
                    // A 100% target cannot be reached by minting; fall back
                    // to the pre-adjustment gap, which the guard allows.
                    let target_amount = mul_div_floor(supply, target_ratio, RATIO_PRECISION)?;
                    return Ok(target_amount.saturating_sub(balance));
                }
                let numerator = (next * U256::from(supply)).saturating_sub(U256::from(balance) * p);
                Ok(fixed::saturate(numerator / (p - next)))
            }
        }
    }
}

//! Ratio calculator — where the pool sits relative to its target.

use crate::error::{IssuanceError, IssuanceResult};
use crate::fixed::{mul_div_floor, EXTRA_PRECISION, RATIO_PRECISION};
use crate::types::{Direction, PoolSnapshot, RatioReading};

/// Computes `current_ratio` and the adjustment direction.
///
/// The balance is scaled up by `EXTRA_PRECISION` before dividing by the
/// supply, and the result scaled by `RATIO_PRECISION` before dividing by
/// the target, so neither division truncates the useful digits away.
#[derive(Debug, Clone, Copy)]
pub struct RatioCalculator;

impl RatioCalculator {
    pub fn read(snapshot: &PoolSnapshot, target_ratio: u128) -> IssuanceResult<RatioReading> {
        if snapshot.token_total_supply == 0 {
            return Err(IssuanceError::DivideByZero);
        }

        let balance_to_supply = mul_div_floor(
            snapshot.common_pool_balance,
            EXTRA_PRECISION,
            snapshot.token_total_supply,
        )?;

        // A zero target puts any positive balance above it.
        let current_ratio = if target_ratio == 0 {
            EXTRA_PRECISION
                .checked_add(balance_to_supply)
                .ok_or(IssuanceError::ArithmeticOverflow("current_ratio"))?
        } else {
            mul_div_floor(balance_to_supply, RATIO_PRECISION, target_ratio)?
        };

        let direction = if current_ratio > EXTRA_PRECISION {
            Direction::Burn
        } else {
            Direction::Mint
        };

        Ok(RatioReading {
            balance_to_supply,
            current_ratio,
            direction,
        })
    }
}

//! Overshoot guard — a single step never crosses the target balance.

use primitive_types::U256;

use crate::error::IssuanceResult;
use crate::fixed::{self, mul_div_floor, RATIO_PRECISION};
use crate::types::{Direction, PoolSnapshot};

/// Clamps a raw adjustment against `target_amount = supply × target_ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OvershootGuard {
    pub target_amount: u128,
}

impl OvershootGuard {
    pub fn new(snapshot: &PoolSnapshot, target_ratio: u128) -> IssuanceResult<Self> {
        let target_amount =
            mul_div_floor(snapshot.token_total_supply, target_ratio, RATIO_PRECISION)?;
        Ok(Self { target_amount })
    }

    /// Target balance once the supply has moved with the adjustment itself.
    ///
    /// Burning `x` also shrinks supply by `x`, so the balance that sits at
    /// `target_ratio` afterwards is `B - x` with `x = (B·P - t·S) / (P - t)`;
    /// minting mirrors it. With `target_ratio >= 100%` no such balance
    /// exists and the pre-adjustment target is used.
    pub fn settled(
        snapshot: &PoolSnapshot,
        target_ratio: u128,
        direction: Direction,
    ) -> IssuanceResult<Self> {
        if target_ratio >= RATIO_PRECISION {
            return Self::new(snapshot, target_ratio);
        }
        let balance = snapshot.common_pool_balance;
        let held = U256::from(balance) * U256::from(RATIO_PRECISION);
        let wanted = U256::from(target_ratio) * U256::from(snapshot.token_total_supply);
        let free = U256::from(RATIO_PRECISION - target_ratio);

        let target_amount = match direction {
            Direction::Burn if held > wanted => {
                balance.saturating_sub(fixed::saturate((held - wanted) / free))
            }
            Direction::Mint if wanted > held => {
                balance.saturating_add(fixed::saturate((wanted - held) / free))
            }
            _ => balance,
        };
        Ok(Self { target_amount })
    }

    /// Largest adjustment allowed in `direction` from `balance`.
    pub fn headroom(&self, balance: u128, direction: Direction) -> u128 {
        match direction {
            Direction::Burn => balance.saturating_sub(self.target_amount),
            Direction::Mint => self.target_amount.saturating_sub(balance),
        }
    }

    /// `min(raw_amount, headroom)`.
    pub fn clamp(&self, balance: u128, direction: Direction, raw_amount: u128) -> u128 {
        raw_amount.min(self.headroom(balance, direction))
    }
}

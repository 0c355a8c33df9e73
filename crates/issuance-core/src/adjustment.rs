//! One adjustment, computed end to end without touching the ledger.

use tracing::debug;

use crate::convergence::ConvergenceModel;
use crate::error::{IssuanceError, IssuanceResult};
use crate::overshoot::OvershootGuard;
use crate::ratio::RatioCalculator;
use crate::types::{
    AdjustmentRecord, Direction, IssuanceConfig, PoolSnapshot, RatioReading, TransactionId,
};

/// The computed adjustment for a snapshot and elapsed time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentPlan {
    pub snapshot: PoolSnapshot,
    pub reading: RatioReading,
    pub elapsed_seconds: u64,
    /// Model output before the overshoot guard.
    pub raw_amount: u128,
    /// Amount to mint or burn; `<= raw_amount`, may be zero.
    pub amount: u128,
    pub target_amount: u128,
}

impl AdjustmentPlan {
    pub fn direction(&self) -> Direction {
        self.reading.direction
    }

    pub fn is_noop(&self) -> bool {
        self.amount == 0
    }

    /// Pool balance once the mint or burn has been applied.
    pub fn balance_after(&self) -> u128 {
        match self.direction() {
            Direction::Mint => self.snapshot.common_pool_balance + self.amount,
            Direction::Burn => self.snapshot.common_pool_balance - self.amount,
        }
    }

    /// Total supply once the mint or burn has been applied.
    pub fn total_supply_after(&self) -> u128 {
        match self.direction() {
            Direction::Mint => self.snapshot.token_total_supply.saturating_add(self.amount),
            Direction::Burn => self.snapshot.token_total_supply.saturating_sub(self.amount),
        }
    }

    /// Positive for mints, negative for burns.
    pub fn signed_delta(&self) -> IssuanceResult<i128> {
        let magnitude = i128::try_from(self.amount)
            .map_err(|_| IssuanceError::ArithmeticOverflow("signed_delta"))?;
        Ok(match self.direction() {
            Direction::Mint => magnitude,
            Direction::Burn => -magnitude,
        })
    }

    pub fn into_record(
        self,
        timestamp: u64,
        bridge_transaction_id: Option<TransactionId>,
    ) -> AdjustmentRecord {
        AdjustmentRecord {
            timestamp,
            elapsed_seconds: self.elapsed_seconds,
            direction: self.direction(),
            amount: self.amount,
            current_ratio: self.reading.current_ratio,
            target_amount: self.target_amount,
            balance_before: self.snapshot.common_pool_balance,
            balance_after: self.balance_after(),
            total_supply_after: self.total_supply_after(),
            bridge_transaction_id,
        }
    }
}

/// Run ratio → convergence → overshoot for one snapshot.
///
/// Pure: the same inputs always produce the same plan.
pub fn plan_adjustment(
    snapshot: &PoolSnapshot,
    config: &IssuanceConfig,
    elapsed_seconds: u64,
) -> IssuanceResult<AdjustmentPlan> {
    if snapshot.token_total_supply == 0 {
        return Err(IssuanceError::DivideByZero);
    }
    if snapshot.common_pool_balance > snapshot.token_total_supply {
        return Err(IssuanceError::InvalidConfig(format!(
            "pool balance {} exceeds total supply {}",
            snapshot.common_pool_balance, snapshot.token_total_supply
        )));
    }

    let reading = RatioCalculator::read(snapshot, config.target_ratio)?;
    let raw_amount = config.convergence.compute_adjustment(
        snapshot,
        &reading,
        config.target_ratio,
        elapsed_seconds,
    )?;
    let guard = if config.convergence.tracks_supply() {
        OvershootGuard::settled(snapshot, config.target_ratio, reading.direction)?
    } else {
        OvershootGuard::new(snapshot, config.target_ratio)?
    };
    let amount = guard.clamp(snapshot.common_pool_balance, reading.direction, raw_amount);

    debug!(
        model = config.convergence.name(),
        direction = %reading.direction,
        current_ratio = reading.current_ratio,
        elapsed_seconds,
        raw_amount,
        amount,
        target_amount = guard.target_amount,
        "adjustment planned"
    );

    Ok(AdjustmentPlan {
        snapshot: *snapshot,
        reading,
        elapsed_seconds,
        raw_amount,
        amount,
        target_amount: guard.target_amount,
    })
}

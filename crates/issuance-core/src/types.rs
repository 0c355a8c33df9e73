//! Domain types for the issuance controller.
//!
//! Config and state are plain serializable values: the controller owns
//! them, the state store persists them as JSON checkpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::convergence::ConvergenceStrategy;
use crate::error::{IssuanceError, IssuanceResult};
use crate::fixed::{amount_str, ratio_str};

/// Ledger account identifier (pool owner, controller, settings callers).
pub type AccountId = String;

/// Identifier of the counterpart domain adjustments are bridged to.
pub type BridgeDestination = String;

/// Opaque identifier returned by a bridge transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capabilities checked by the authorization collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    UpdateSettings,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::UpdateSettings => f.write_str("update settings"),
        }
    }
}

// ── Computation ────────────────────────────────────────────────────

/// Which way the pool has to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Mint,
    Burn,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Mint => f.write_str("mint"),
            Direction::Burn => f.write_str("burn"),
        }
    }
}

/// Balance and supply read once at the start of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    #[serde(with = "amount_str")]
    pub common_pool_balance: u128,
    #[serde(with = "amount_str")]
    pub token_total_supply: u128,
}

impl PoolSnapshot {
    pub fn new(common_pool_balance: u128, token_total_supply: u128) -> Self {
        Self {
            common_pool_balance,
            token_total_supply,
        }
    }
}

/// Output of the ratio calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioReading {
    /// `balance / supply`, scaled by `EXTRA_PRECISION`.
    pub balance_to_supply: u128,
    /// Position relative to target; `EXTRA_PRECISION` means on target.
    pub current_ratio: u128,
    pub direction: Direction,
}

impl RatioReading {
    /// `|current_ratio - EXTRA_PRECISION|`.
    pub fn distance_from_target(&self) -> u128 {
        self.current_ratio.abs_diff(crate::fixed::EXTRA_PRECISION)
    }
}

// ── Config and state ───────────────────────────────────────────────

/// Controller settings. Mutated only through authorized updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceConfig {
    /// Fraction of total supply the pool should hold, scaled by `RATIO_PRECISION`.
    #[serde(with = "ratio_str")]
    pub target_ratio: u128,
    pub convergence: ConvergenceStrategy,
    /// Minimum seconds between two successful executions.
    #[serde(default)]
    pub execute_adjustment_delay: u64,
    #[serde(default)]
    pub bridge_destination: Option<BridgeDestination>,
}

/// Mutable execution state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentState {
    /// Unix seconds of the last successful execution. Never decreases.
    pub previous_adjustment_second: u64,
    pub recent_bridge_transaction_id: Option<TransactionId>,
}

/// Config and state together, as persisted by the state store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerCheckpoint {
    pub config: IssuanceConfig,
    pub state: AdjustmentState,
}

// ── Records ────────────────────────────────────────────────────────

/// Observability record emitted for every successful execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentRecord {
    pub timestamp: u64,
    pub elapsed_seconds: u64,
    pub direction: Direction,
    #[serde(with = "amount_str")]
    pub amount: u128,
    #[serde(with = "ratio_str")]
    pub current_ratio: u128,
    #[serde(with = "amount_str")]
    pub target_amount: u128,
    #[serde(with = "amount_str")]
    pub balance_before: u128,
    #[serde(with = "amount_str")]
    pub balance_after: u128,
    #[serde(with = "amount_str")]
    pub total_supply_after: u128,
    pub bridge_transaction_id: Option<TransactionId>,
}

impl AdjustmentRecord {
    /// Positive for mints, negative for burns.
    pub fn signed_delta(&self) -> IssuanceResult<i128> {
        let magnitude = i128::try_from(self.amount)
            .map_err(|_| IssuanceError::ArithmeticOverflow("signed_delta"))?;
        Ok(match self.direction {
            Direction::Mint => magnitude,
            Direction::Burn => -magnitude,
        })
    }
}

//! issuance.toml configuration parser.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::convergence::{ConvergenceStrategy, RateCapped};
use crate::error::{IssuanceError, IssuanceResult};
use crate::fixed::{amount_str, ratio_str, RATIO_PRECISION};
use crate::types::{AccountId, IssuanceConfig, PoolSnapshot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuanceFile {
    pub controller: ControllerSection,
    pub pool: Option<PoolSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerSection {
    #[serde(with = "ratio_str")]
    pub target_ratio: u128,
    #[serde(default)]
    pub execute_adjustment_delay: u64,
    pub bridge_destination: Option<String>,
    pub convergence: ConvergenceStrategy,
}

/// Seed values for simulations against an in-memory ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSection {
    #[serde(default = "default_pool_account")]
    pub account: AccountId,
    #[serde(with = "amount_str")]
    pub total_supply: u128,
    #[serde(with = "amount_str")]
    pub balance: u128,
}

fn default_pool_account() -> AccountId {
    "common-pool".to_string()
}

impl PoolSection {
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot::new(self.balance, self.total_supply)
    }
}

impl IssuanceFile {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: IssuanceFile = toml::from_str(&content)?;
        file.validate()?;
        Ok(file)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the invariants the controller would otherwise reject at init.
    pub fn validate(&self) -> IssuanceResult<()> {
        validate_target_ratio(self.controller.target_ratio)?;
        if let Some(pool) = &self.pool
            && pool.balance > pool.total_supply
        {
            return Err(IssuanceError::InvalidConfig(format!(
                "pool balance {} exceeds total supply {}",
                pool.balance, pool.total_supply
            )));
        }
        Ok(())
    }

    pub fn issuance_config(&self) -> IssuanceConfig {
        IssuanceConfig {
            target_ratio: self.controller.target_ratio,
            convergence: self.controller.convergence.clone(),
            execute_adjustment_delay: self.controller.execute_adjustment_delay,
            bridge_destination: self.controller.bridge_destination.clone(),
        }
    }

    /// A starter config: 20% target, one-year ideal horizon, no cap pressure.
    pub fn scaffold() -> Self {
        IssuanceFile {
            controller: ControllerSection {
                target_ratio: RATIO_PRECISION / 5,
                execute_adjustment_delay: 3600,
                bridge_destination: None,
                convergence: ConvergenceStrategy::RateCapped(RateCapped {
                    max_adjustment_per_second: RATIO_PRECISION / 1000,
                }),
            },
            pool: Some(PoolSection {
                account: default_pool_account(),
                total_supply: 100 * RATIO_PRECISION,
                balance: 30 * RATIO_PRECISION,
            }),
        }
    }
}

/// `0 <= target_ratio <= RATIO_PRECISION`.
pub fn validate_target_ratio(target_ratio: u128) -> IssuanceResult<()> {
    if target_ratio > RATIO_PRECISION {
        return Err(IssuanceError::TargetRatioTooHigh {
            ratio: target_ratio,
        });
    }
    Ok(())
}

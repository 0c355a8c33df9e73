pub mod history;
pub mod init;
pub mod preview;
pub mod simulate;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use issuance_controller::{
    AllowList, Collaborators, IssuanceController, ManualClock, MemoryToken, NoopTransport,
    StaticFundsManager,
};
use issuance_core::fixed::{format_ratio, format_units};
use issuance_core::{AdjustmentRecord, IssuanceFile};

/// Holders of everything outside the pool in a simulated ledger.
const HOLDERS: &str = "holders";

/// A controller wired to an in-memory ledger seeded from `[pool]`.
pub(crate) struct Sandbox {
    pub token: Arc<MemoryToken>,
    pub clock: ManualClock,
    pub controller: Arc<IssuanceController>,
    pub pool_account: String,
}

impl Sandbox {
    pub fn load(config_path: &str, start: u64) -> anyhow::Result<Self> {
        let file = IssuanceFile::from_file(Path::new(config_path))
            .with_context(|| format!("failed to load {config_path}"))?;
        Self::from_file(&file, start)
    }

    pub fn from_file(file: &IssuanceFile, start: u64) -> anyhow::Result<Self> {
        file.validate()?;
        let pool = file
            .pool
            .as_ref()
            .context("a [pool] section is required to seed the in-memory ledger")?;

        let token = Arc::new(
            MemoryToken::new()
                .with_balance(pool.account.clone(), pool.balance)
                .with_balance(HOLDERS, pool.total_supply - pool.balance),
        );
        let clock = ManualClock::new(start);
        let collaborators = Collaborators {
            ledger: token.clone(),
            token_manager: token.clone(),
            funds_manager: Arc::new(StaticFundsManager::new(pool.account.clone())),
            authorizer: Arc::new(AllowList::new()),
            clock: Arc::new(clock.clone()),
            bridge: Some(Arc::new(NoopTransport)),
        };
        let controller = IssuanceController::initialize(file.issuance_config(), collaborators)?;

        Ok(Self {
            token,
            clock,
            controller: Arc::new(controller),
            pool_account: pool.account.clone(),
        })
    }
}

/// One line per record; token amounts shown in whole units.
pub(crate) fn format_record(record: &AdjustmentRecord) -> String {
    let mut line = format!(
        "{:>12}  {:<4}  amount {:>24}  pool {:>24}  supply {:>24}  ratio {}",
        record.timestamp,
        record.direction,
        format_units(record.amount),
        format_units(record.balance_after),
        format_units(record.total_supply_after),
        format_ratio(record.current_ratio),
    );
    if let Some(id) = &record.bridge_transaction_id {
        line.push_str(&format!("  bridge {id}"));
    }
    line
}

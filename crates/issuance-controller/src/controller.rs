//! Issuance controller — one execution end to end, plus settings.
//!
//! `execute_adjustment` reads the pool, plans the adjustment with
//! `issuance-core`, mints into or burns from the pool and notifies the
//! bridge. Either every step succeeds and the new state is committed, or the
//! call returns an error and nothing observable has changed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use issuance_core::config::validate_target_ratio;
use issuance_core::{
    plan_adjustment, AccountId, AdjustmentPlan, AdjustmentRecord, AdjustmentState, Capability,
    ControllerCheckpoint, ConvergenceModel, ConvergenceStrategy, Direction, IssuanceConfig,
    IssuanceError, IssuanceResult, PoolSnapshot, RateCapped, RecoveryTime, TransactionId,
};

use crate::bridge::{BridgeMessage, BridgeNotifier, BridgeTransport};
use crate::collaborators::{Authorizer, Clock, FundsManager, TokenLedger, TokenManager};
use crate::gate::DelayGate;

/// Everything the controller talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub ledger: Arc<dyn TokenLedger>,
    pub token_manager: Arc<dyn TokenManager>,
    pub funds_manager: Arc<dyn FundsManager>,
    pub authorizer: Arc<dyn Authorizer>,
    pub clock: Arc<dyn Clock>,
    pub bridge: Option<Arc<dyn BridgeTransport>>,
}

struct Inner {
    config: IssuanceConfig,
    gate: DelayGate,
    recent_bridge_transaction_id: Option<TransactionId>,
    funds_manager: Arc<dyn FundsManager>,
}

/// Supply adjustment controller.
///
/// Config and state sit behind a mutex that is released before any
/// collaborator is called. Concurrent or reentrant executions are rejected
/// with [`IssuanceError::ExecutionInProgress`].
pub struct IssuanceController {
    inner: Mutex<Inner>,
    ledger: Arc<dyn TokenLedger>,
    token_manager: Arc<dyn TokenManager>,
    authorizer: Arc<dyn Authorizer>,
    clock: Arc<dyn Clock>,
    bridge: BridgeNotifier,
    executing: AtomicBool,
}

/// Holds the execution flag; clears it on drop.
struct ExecutionGuard<'a>(&'a AtomicBool);

impl<'a> ExecutionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> IssuanceResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| IssuanceError::ExecutionInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl IssuanceController {
    /// Create a controller whose delay gate starts at the clock's current time.
    pub fn initialize(config: IssuanceConfig, collaborators: Collaborators) -> IssuanceResult<Self> {
        let state = AdjustmentState {
            previous_adjustment_second: collaborators.clock.now(),
            recent_bridge_transaction_id: None,
        };
        Self::restore(ControllerCheckpoint { config, state }, collaborators)
    }

    /// Rebuild a controller from a persisted checkpoint.
    pub fn restore(
        checkpoint: ControllerCheckpoint,
        collaborators: Collaborators,
    ) -> IssuanceResult<Self> {
        let ControllerCheckpoint { config, state } = checkpoint;
        validate_target_ratio(config.target_ratio)?;

        let bridge = BridgeNotifier::new(collaborators.bridge);
        if let Some(destination) = &config.bridge_destination
            && !bridge.has_transport()
        {
            return Err(IssuanceError::InvalidConfig(format!(
                "bridge destination {destination} configured without a transport"
            )));
        }

        info!(
            target_ratio = config.target_ratio,
            model = config.convergence.name(),
            delay = config.execute_adjustment_delay,
            previous_adjustment_second = state.previous_adjustment_second,
            "issuance controller initialized"
        );

        Ok(Self {
            inner: Mutex::new(Inner {
                config,
                gate: DelayGate::new(state.previous_adjustment_second),
                recent_bridge_transaction_id: state.recent_bridge_transaction_id,
                funds_manager: collaborators.funds_manager,
            }),
            ledger: collaborators.ledger,
            token_manager: collaborators.token_manager,
            authorizer: collaborators.authorizer,
            clock: collaborators.clock,
            bridge,
            executing: AtomicBool::new(false),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Execution ──────────────────────────────────────────────────

    /// Mint or burn towards the target ratio for the time since the last run.
    pub fn execute_adjustment(&self) -> IssuanceResult<AdjustmentRecord> {
        let _guard = ExecutionGuard::acquire(&self.executing).inspect_err(|_| {
            warn!("adjustment rejected: another execution is in flight");
        })?;

        let (config, gate, funds_manager) = {
            let inner = self.lock();
            (inner.config.clone(), inner.gate, inner.funds_manager.clone())
        };
        let now = self.clock.now();
        let pool = funds_manager.funds_owner();

        let snapshot = self.snapshot(&pool)?;
        if snapshot.token_total_supply == 0 {
            warn!(%pool, "adjustment rejected: token total supply is zero");
            return Err(IssuanceError::DivideByZero);
        }
        let elapsed = gate
            .check(now, config.execute_adjustment_delay)
            .inspect_err(|e| warn!(%pool, error = %e, "adjustment rejected"))?;

        let plan = plan_adjustment(&snapshot, &config, elapsed)?;
        self.apply(&pool, plan.direction(), plan.amount)?;

        let transaction_id = match self.notify_bridge(config.bridge_destination.as_deref(), &plan, now) {
            Ok(id) => id,
            Err(e) => {
                self.compensate(&pool, plan.direction(), plan.amount);
                return Err(e);
            }
        };

        {
            let mut inner = self.lock();
            inner.gate.advance(now);
            if transaction_id.is_some() {
                inner.recent_bridge_transaction_id = transaction_id.clone();
            }
        }

        let record = plan.into_record(now, transaction_id);
        info!(
            %pool,
            direction = %record.direction,
            amount = record.amount,
            balance_after = record.balance_after,
            total_supply_after = record.total_supply_after,
            current_ratio = record.current_ratio,
            elapsed = record.elapsed_seconds,
            bridge_transaction_id = ?record.bridge_transaction_id,
            "adjustment executed"
        );
        Ok(record)
    }

    /// The adjustment an execution would make right now, ignoring the delay gate.
    pub fn preview_adjustment(&self) -> IssuanceResult<AdjustmentPlan> {
        let (config, gate, funds_manager) = {
            let inner = self.lock();
            (inner.config.clone(), inner.gate, inner.funds_manager.clone())
        };
        let snapshot = self.snapshot(&funds_manager.funds_owner())?;
        plan_adjustment(&snapshot, &config, gate.elapsed(self.clock.now()))
    }

    fn snapshot(&self, pool: &str) -> IssuanceResult<PoolSnapshot> {
        let balance = self.ledger.balance_of(pool)?;
        let supply = self.ledger.total_supply()?;
        debug!(%pool, balance, supply, "pool snapshot");
        Ok(PoolSnapshot::new(balance, supply))
    }

    fn apply(&self, pool: &str, direction: Direction, amount: u128) -> IssuanceResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let result = match direction {
            Direction::Mint => self.token_manager.mint(pool, amount),
            Direction::Burn => self.token_manager.burn(pool, amount),
        };
        result.map_err(|e| {
            warn!(%pool, %direction, amount, error = %e, "token manager call failed");
            IssuanceError::from(e)
        })
    }

    fn notify_bridge(
        &self,
        destination: Option<&str>,
        plan: &AdjustmentPlan,
        now: u64,
    ) -> IssuanceResult<Option<TransactionId>> {
        let Some(destination) = destination else {
            return Ok(None);
        };
        let message = BridgeMessage {
            destination: destination.to_string(),
            delta: plan.signed_delta()?,
            pool_balance: plan.balance_after(),
            total_supply: plan.total_supply_after(),
            timestamp: now,
        };
        self.bridge.notify(Some(destination), &message)
    }

    /// Undo an applied mint or burn after a later step failed.
    fn compensate(&self, pool: &str, direction: Direction, amount: u128) {
        if amount == 0 {
            return;
        }
        let reverse = match direction {
            Direction::Mint => Direction::Burn,
            Direction::Burn => Direction::Mint,
        };
        match self.apply(pool, reverse, amount) {
            Ok(()) => warn!(%pool, %reverse, amount, "adjustment reverted"),
            Err(e) => error!(%pool, %reverse, amount, error = %e, "failed to revert adjustment"),
        }
    }

    // ── Settings ───────────────────────────────────────────────────

    fn update_settings(
        &self,
        caller: &str,
        setting: &'static str,
        apply: impl FnOnce(&mut Inner),
    ) -> IssuanceResult<()> {
        self.authorizer
            .require_capability(caller, Capability::UpdateSettings)
            .inspect_err(|e| warn!(%caller, setting, error = %e, "settings update rejected"))?;
        let mut inner = self.lock();
        apply(&mut *inner);
        drop(inner);
        info!(%caller, setting, "settings updated");
        Ok(())
    }

    pub fn update_target_ratio(&self, caller: &str, target_ratio: u128) -> IssuanceResult<()> {
        validate_target_ratio(target_ratio)?;
        self.update_settings(caller, "target_ratio", |inner| {
            inner.config.target_ratio = target_ratio;
        })
    }

    /// Set the rate cap. Switches a recovery-time controller to the rate-capped model.
    pub fn update_max_adjustment_per_second(
        &self,
        caller: &str,
        max_adjustment_per_second: u128,
    ) -> IssuanceResult<()> {
        self.update_settings(caller, "max_adjustment_per_second", |inner| {
            inner.config.convergence = ConvergenceStrategy::RateCapped(RateCapped {
                max_adjustment_per_second,
            });
        })
    }

    /// Set the recovery time. Switches a rate-capped controller to the recovery-time model.
    pub fn update_recovery_time(&self, caller: &str, recovery_time: u64) -> IssuanceResult<()> {
        self.update_settings(caller, "recovery_time", |inner| {
            inner.config.convergence =
                ConvergenceStrategy::RecoveryTime(RecoveryTime { recovery_time });
        })
    }

    pub fn update_execute_adjustment_delay(&self, caller: &str, delay: u64) -> IssuanceResult<()> {
        self.update_settings(caller, "execute_adjustment_delay", |inner| {
            inner.config.execute_adjustment_delay = delay;
        })
    }

    pub fn update_funds_manager(
        &self,
        caller: &str,
        funds_manager: Arc<dyn FundsManager>,
    ) -> IssuanceResult<()> {
        self.update_settings(caller, "funds_manager", |inner| {
            inner.funds_manager = funds_manager;
        })
    }

    /// `None` turns bridging off.
    pub fn update_bridge_destination(
        &self,
        caller: &str,
        destination: Option<String>,
    ) -> IssuanceResult<()> {
        if let Some(destination) = &destination
            && !self.bridge.has_transport()
        {
            return Err(IssuanceError::InvalidConfig(format!(
                "bridge destination {destination} configured without a transport"
            )));
        }
        self.update_settings(caller, "bridge_destination", |inner| {
            inner.config.bridge_destination = destination;
        })
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn config(&self) -> IssuanceConfig {
        self.lock().config.clone()
    }

    pub fn target_ratio(&self) -> u128 {
        self.lock().config.target_ratio
    }

    pub fn convergence(&self) -> ConvergenceStrategy {
        self.lock().config.convergence.clone()
    }

    /// `None` while the recovery-time model is active.
    pub fn max_adjustment_per_second(&self) -> Option<u128> {
        match self.lock().config.convergence {
            ConvergenceStrategy::RateCapped(m) => Some(m.max_adjustment_per_second),
            ConvergenceStrategy::RecoveryTime(_) => None,
        }
    }

    /// `None` while the rate-capped model is active.
    pub fn recovery_time(&self) -> Option<u64> {
        match self.lock().config.convergence {
            ConvergenceStrategy::RecoveryTime(m) => Some(m.recovery_time),
            ConvergenceStrategy::RateCapped(_) => None,
        }
    }

    pub fn execute_adjustment_delay(&self) -> u64 {
        self.lock().config.execute_adjustment_delay
    }

    pub fn bridge_destination(&self) -> Option<String> {
        self.lock().config.bridge_destination.clone()
    }

    pub fn funds_owner(&self) -> AccountId {
        let funds_manager = self.lock().funds_manager.clone();
        funds_manager.funds_owner()
    }

    pub fn previous_adjustment_second(&self) -> u64 {
        self.lock().gate.previous_adjustment_second()
    }

    pub fn recent_bridge_transaction_id(&self) -> Option<TransactionId> {
        self.lock().recent_bridge_transaction_id.clone()
    }

    pub fn state(&self) -> AdjustmentState {
        let inner = self.lock();
        AdjustmentState {
            previous_adjustment_second: inner.gate.previous_adjustment_second(),
            recent_bridge_transaction_id: inner.recent_bridge_transaction_id.clone(),
        }
    }

    pub fn checkpoint(&self) -> ControllerCheckpoint {
        ControllerCheckpoint {
            config: self.config(),
            state: self.state(),
        }
    }
}

//! Periodic runner — executes adjustments on an interval.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info};

use issuance_core::{AdjustmentRecord, IssuanceError};
use issuance_state::{StateError, StateStore};

use crate::controller::IssuanceController;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Issuance(#[from] IssuanceError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Drives a shared controller and persists what it does.
pub struct AdjustmentScheduler {
    controller: Arc<IssuanceController>,
    store: Option<StateStore>,
    name: String,
}

impl AdjustmentScheduler {
    pub fn new(controller: Arc<IssuanceController>) -> Self {
        Self {
            controller,
            store: None,
            name: "default".to_string(),
        }
    }

    /// Persist records and checkpoints under `name` after each execution.
    pub fn with_store(mut self, store: StateStore, name: impl Into<String>) -> Self {
        self.store = Some(store);
        self.name = name.into();
        self
    }

    pub fn controller(&self) -> &Arc<IssuanceController> {
        &self.controller
    }

    /// One execution attempt. `Ok(None)` while the delay has not passed.
    pub fn tick(&self) -> Result<Option<AdjustmentRecord>, SchedulerError> {
        let record = match self.controller.execute_adjustment() {
            Ok(record) => record,
            Err(IssuanceError::DelayNotPassed { elapsed, required }) => {
                debug!(elapsed, required, "adjustment not due yet");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(store) = &self.store {
            store.put_adjustment(&record)?;
            store.put_checkpoint(&self.name, &self.controller.checkpoint())?;
        }
        Ok(Some(record))
    }

    /// Run the scheduler loop until `shutdown` changes.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(
            name = %self.name,
            interval_secs = interval.as_secs(),
            "adjustment scheduler started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    if let Err(e) = self.tick() {
                        error!(name = %self.name, error = %e, "scheduled adjustment failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!(name = %self.name, "adjustment scheduler shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{AllowList, ManualClock, StaticFundsManager};
    use crate::controller::Collaborators;
    use crate::memory::MemoryToken;
    use issuance_core::{ConvergenceStrategy, IssuanceConfig, RecoveryTime, RATIO_PRECISION};

    const E18: u128 = 1_000_000_000_000_000_000;

    fn test_controller(clock: &ManualClock, delay: u64) -> Arc<IssuanceController> {
        let token = Arc::new(
            MemoryToken::new()
                .with_balance("common-pool", 30 * E18)
                .with_balance("holders", 70 * E18),
        );
        let collaborators = Collaborators {
            ledger: token.clone(),
            token_manager: token,
            funds_manager: Arc::new(StaticFundsManager::new("common-pool")),
            authorizer: Arc::new(AllowList::new()),
            clock: Arc::new(clock.clone()),
            bridge: None,
        };
        let config = IssuanceConfig {
            target_ratio: RATIO_PRECISION / 5,
            convergence: ConvergenceStrategy::RecoveryTime(RecoveryTime {
                recovery_time: 31_536_000,
            }),
            execute_adjustment_delay: delay,
            bridge_destination: None,
        };
        Arc::new(IssuanceController::initialize(config, collaborators).unwrap())
    }

    #[test]
    fn tick_skips_while_delay_pending() {
        let clock = ManualClock::new(1_000);
        let scheduler = AdjustmentScheduler::new(test_controller(&clock, 3_600));
        assert!(scheduler.tick().unwrap().is_none());

        clock.advance(3_600);
        let record = scheduler.tick().unwrap().unwrap();
        assert_eq!(record.elapsed_seconds, 3_600);
    }

    #[test]
    fn tick_persists_record_and_checkpoint() {
        let clock = ManualClock::new(1_000);
        let store = StateStore::open_in_memory().unwrap();
        let scheduler =
            AdjustmentScheduler::new(test_controller(&clock, 0)).with_store(store.clone(), "pool-a");

        clock.advance(10 * 86_400);
        let record = scheduler.tick().unwrap().unwrap();

        assert_eq!(store.latest_adjustment().unwrap(), Some(record));
        let checkpoint = store.get_checkpoint("pool-a").unwrap().unwrap();
        assert_eq!(checkpoint.state.previous_adjustment_second, 1_000 + 10 * 86_400);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let clock = ManualClock::new(1_000);
        let store = StateStore::open_in_memory().unwrap();
        let scheduler = Arc::new(
            AdjustmentScheduler::new(test_controller(&clock, 0)).with_store(store.clone(), "default"),
        );
        let (tx, rx) = watch::channel(false);

        let runner = scheduler.clone();
        let handle = tokio::spawn(async move {
            runner.run(Duration::from_millis(10), rx).await;
        });

        tokio::time::sleep(Duration::from_millis(80)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(!store.list_adjustments(100).unwrap().is_empty());
    }
}

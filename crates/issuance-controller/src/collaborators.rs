//! Collaborator interfaces consumed by the controller.
//!
//! The controller never owns balances, permissions or time. It talks to
//! these traits, all of which must be `Send + Sync` so a controller can be
//! shared with the scheduler task.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use issuance_core::{AccountId, Capability, CollaboratorError, IssuanceError, IssuanceResult};

/// Read side of the token: balances and supply.
pub trait TokenLedger: Send + Sync {
    fn balance_of(&self, account: &str) -> Result<u128, CollaboratorError>;
    fn total_supply(&self) -> Result<u128, CollaboratorError>;
}

/// Write side of the token. Fails if the controller lacks mint/burn rights.
pub trait TokenManager: Send + Sync {
    fn mint(&self, to: &str, amount: u128) -> Result<(), CollaboratorError>;
    fn burn(&self, from: &str, amount: u128) -> Result<(), CollaboratorError>;
}

/// Custody of the pooled asset.
pub trait FundsManager: Send + Sync {
    /// Account that holds the common pool balance.
    fn funds_owner(&self) -> AccountId;
}

/// Capability check for settings updates.
pub trait Authorizer: Send + Sync {
    fn require_capability(&self, caller: &str, capability: Capability) -> IssuanceResult<()>;
}

/// Source of unix-second timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

// ── Clocks ─────────────────────────────────────────────────────────

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }

    pub fn set(&self, timestamp: u64) {
        self.now.store(timestamp, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// ── Funds and permissions ──────────────────────────────────────────

/// Funds manager whose pool lives in a fixed account.
#[derive(Debug, Clone)]
pub struct StaticFundsManager {
    owner: AccountId,
}

impl StaticFundsManager {
    pub fn new(owner: impl Into<AccountId>) -> Self {
        Self {
            owner: owner.into(),
        }
    }
}

impl FundsManager for StaticFundsManager {
    fn funds_owner(&self) -> AccountId {
        self.owner.clone()
    }
}

/// Explicit grants of `(caller, capability)` pairs; revocable at runtime.
#[derive(Debug, Default)]
pub struct AllowList {
    grants: RwLock<HashSet<(AccountId, Capability)>>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, caller: impl Into<AccountId>, capability: Capability) {
        self.grants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((caller.into(), capability));
    }

    pub fn revoke(&self, caller: &str, capability: Capability) {
        self.grants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(caller.to_string(), capability));
    }
}

impl Authorizer for AllowList {
    fn require_capability(&self, caller: &str, capability: Capability) -> IssuanceResult<()> {
        let granted = self
            .grants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(caller.to_string(), capability));
        if granted {
            Ok(())
        } else {
            Err(IssuanceError::AuthorizationFailed {
                caller: caller.to_string(),
                capability,
            })
        }
    }
}

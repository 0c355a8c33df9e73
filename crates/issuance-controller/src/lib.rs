//! issuance-controller — executes supply adjustments against a ledger.
//!
//! The controller owns the issuance config and adjustment state, reads a
//! pool snapshot from the token ledger, plans the adjustment with
//! `issuance-core`, and applies it through the token manager. Everything
//! external is an injected collaborator:
//!
//! - **`collaborators`** — ledger, token manager, funds manager,
//!   authorizer and clock traits, plus simple implementations
//! - **`memory`** — in-memory token for simulations and tests
//! - **`gate`** — minimum interval between executions
//! - **`bridge`** — notifies a counterpart domain of each adjustment
//! - **`controller`** — the orchestration and settings operations
//! - **`scheduler`** — periodic runner that persists every record

pub mod bridge;
pub mod collaborators;
pub mod controller;
pub mod gate;
pub mod memory;
pub mod scheduler;

pub use bridge::{BridgeMessage, BridgeNotifier, BridgeTransport, NoopTransport, RecordingTransport};
pub use collaborators::{
    AllowList, Authorizer, Clock, FundsManager, ManualClock, StaticFundsManager, SystemClock,
    TokenLedger, TokenManager,
};
pub use controller::{Collaborators, IssuanceController};
pub use gate::DelayGate;
pub use memory::MemoryToken;
pub use scheduler::{AdjustmentScheduler, SchedulerError};

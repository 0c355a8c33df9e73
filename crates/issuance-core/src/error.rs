//! Error types for the issuance controller.

use thiserror::Error;

use crate::types::{AccountId, Capability};

/// Result type alias for issuance operations.
pub type IssuanceResult<T> = Result<T, IssuanceError>;

/// Errors raised by configuration, computation and execution.
///
/// Every variant is raised before any mutation takes place; a caller that
/// sees one of these can assume the controller and the pool are unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssuanceError {
    #[error("target ratio {ratio} exceeds ratio precision")]
    TargetRatioTooHigh { ratio: u128 },

    #[error("division by zero: token total supply is zero")]
    DivideByZero,

    #[error("adjustment delay not passed: {elapsed}s elapsed, {required}s required")]
    DelayNotPassed { elapsed: u64, required: u64 },

    #[error("{caller} is not allowed to {capability}")]
    AuthorizationFailed {
        caller: AccountId,
        capability: Capability,
    },

    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    #[error("an adjustment is already executing")]
    ExecutionInProgress,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("bridge notification failed: {0}")]
    Bridge(String),
}

/// Failures reported by the external ledger, token manager or transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("insufficient balance in {account}: need {needed}, have {available}")]
    InsufficientBalance {
        account: AccountId,
        needed: u128,
        available: u128,
    },

    #[error("token manager rejected {0}")]
    Rejected(String),

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

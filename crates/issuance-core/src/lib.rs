//! issuance-core — the pure half of the dynamic issuance controller.
//!
//! Everything in this crate is deterministic integer arithmetic over a
//! [`PoolSnapshot`]: no clocks, no ledgers, no side effects. The controller
//! crate wires these pieces to the outside world.
//!
//! # Adjustment pipeline
//!
//! ```text
//! snapshot ──► RatioCalculator ──► ConvergenceModel ──► OvershootGuard
//!              (direction,         (raw amount for       (never cross
//!               current ratio)      elapsed seconds)      the target)
//! ```
//!
//! `current_ratio` is expressed relative to [`EXTRA_PRECISION`]: exactly
//! `EXTRA_PRECISION` means the pool holds `target_ratio` of total supply.
//! Two convergence models are available and selected through
//! [`ConvergenceStrategy`]:
//!
//! - **rate_capped** — `min(gap / 1 year, max_adjustment_per_second)`
//!   applied linearly over the elapsed time.
//! - **recovery_time** — closed-form trajectory that reaches the target
//!   after at most `recovery_time` seconds regardless of call cadence.

pub mod adjustment;
pub mod config;
pub mod convergence;
pub mod error;
pub mod fixed;
pub mod overshoot;
pub mod rate;
pub mod ratio;
pub mod types;

pub use adjustment::{plan_adjustment, AdjustmentPlan};
pub use config::IssuanceFile;
pub use convergence::{ConvergenceModel, ConvergenceStrategy, RateCapped, RecoveryTime};
pub use error::{CollaboratorError, IssuanceError, IssuanceResult};
pub use fixed::{EXTRA_PRECISION, RATIO_PRECISION, SECONDS_IN_YEAR};
pub use overshoot::OvershootGuard;
pub use rate::RateLimiter;
pub use ratio::RatioCalculator;
pub use types::*;

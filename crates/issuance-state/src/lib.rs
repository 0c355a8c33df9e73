//! issuance-state — embedded state store for the issuance controller.
//!
//! Backed by [redb](https://docs.rs/redb), persists the controller
//! checkpoint (config + adjustment state) and the history of executed
//! adjustments.
//!
//! # Architecture
//!
//! Domain types are JSON-serialized into redb's `&[u8]` value columns.
//! Adjustment records are keyed by a monotonically increasing `u64`
//! sequence, so iteration order is execution order.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared with the scheduler task.

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::StateStore;

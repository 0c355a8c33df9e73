//! redb table definitions for the issuance state store.

use redb::TableDefinition;

/// Adjustment records keyed by execution sequence number.
pub const ADJUSTMENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("adjustments");

/// Controller checkpoints keyed by controller name.
pub const CHECKPOINTS: TableDefinition<&str, &[u8]> = TableDefinition::new("checkpoints");

//! StateStore — redb-backed persistence for the issuance controller.
//!
//! Stores controller checkpoints and the append-only adjustment history.
//! Supports both on-disk and in-memory backends (the latter for testing
//! and dry-run simulations).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use issuance_core::{AdjustmentRecord, ControllerCheckpoint};

use crate::error::{StateError, StateResult};
use crate::tables::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store.
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(ADJUSTMENTS).map_err(map_err!(Table))?;
        txn.open_table(CHECKPOINTS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Adjustments ────────────────────────────────────────────────

    /// Append an adjustment record. Returns its sequence number.
    pub fn put_adjustment(&self, record: &AdjustmentRecord) -> StateResult<u64> {
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let seq;
        {
            let mut table = txn.open_table(ADJUSTMENTS).map_err(map_err!(Table))?;
            seq = table
                .last()
                .map_err(map_err!(Read))?
                .map(|(key, _)| key.value() + 1)
                .unwrap_or(0);
            table
                .insert(seq, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(seq, timestamp = record.timestamp, "adjustment stored");
        Ok(seq)
    }

    /// Most recent adjustments first, at most `limit` of them.
    pub fn list_adjustments(&self, limit: usize) -> StateResult<Vec<AdjustmentRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ADJUSTMENTS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))?.rev().take(limit) {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: AdjustmentRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }

    /// The last executed adjustment, if any.
    pub fn latest_adjustment(&self) -> StateResult<Option<AdjustmentRecord>> {
        Ok(self.list_adjustments(1)?.into_iter().next())
    }

    // ── Checkpoints ────────────────────────────────────────────────

    /// Insert or replace the checkpoint for a named controller.
    pub fn put_checkpoint(&self, name: &str, checkpoint: &ControllerCheckpoint) -> StateResult<()> {
        let value = serde_json::to_vec(checkpoint).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(CHECKPOINTS).map_err(map_err!(Table))?;
            table
                .insert(name, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%name, "checkpoint stored");
        Ok(())
    }

    /// Get the checkpoint for a named controller.
    pub fn get_checkpoint(&self, name: &str) -> StateResult<Option<ControllerCheckpoint>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CHECKPOINTS).map_err(map_err!(Table))?;
        match table.get(name).map_err(map_err!(Read))? {
            Some(guard) => {
                let checkpoint: ControllerCheckpoint =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(checkpoint))
            }
            None => Ok(None),
        }
    }
}

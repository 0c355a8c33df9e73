//! Bridge notification for cross-domain supply adjustments.
//!
//! After a mint or burn, the signed delta is encoded as JSON and handed to a
//! [`BridgeTransport`]. The transport returns an opaque transaction id that
//! the controller keeps as `recent_bridge_transaction_id`.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use issuance_core::{BridgeDestination, CollaboratorError, IssuanceError, IssuanceResult, TransactionId};

/// Wire format of a bridged adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeMessage {
    pub destination: BridgeDestination,
    /// Positive for mints, negative for burns.
    #[serde(with = "delta_str")]
    pub delta: i128,
    #[serde(with = "issuance_core::fixed::amount_str")]
    pub pool_balance: u128,
    #[serde(with = "issuance_core::fixed::amount_str")]
    pub total_supply: u128,
    pub timestamp: u64,
}

impl BridgeMessage {
    pub fn encode(&self) -> IssuanceResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| IssuanceError::Bridge(e.to_string()))
    }
}

mod delta_str {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Delivers encoded messages to another domain.
pub trait BridgeTransport: Send + Sync {
    fn send(&self, destination: &str, payload: &[u8]) -> Result<TransactionId, CollaboratorError>;
}

/// Optional transport plus the send policy around it.
#[derive(Clone, Default)]
pub struct BridgeNotifier {
    transport: Option<Arc<dyn BridgeTransport>>,
}

impl BridgeNotifier {
    pub fn new(transport: Option<Arc<dyn BridgeTransport>>) -> Self {
        Self { transport }
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    /// Send `message` when a destination is configured and the delta is non-zero.
    pub fn notify(
        &self,
        destination: Option<&str>,
        message: &BridgeMessage,
    ) -> IssuanceResult<Option<TransactionId>> {
        let Some(destination) = destination else {
            return Ok(None);
        };
        if message.delta == 0 {
            debug!(%destination, "zero delta, bridge skipped");
            return Ok(None);
        }
        let transport = self.transport.as_ref().ok_or_else(|| {
            IssuanceError::InvalidConfig(format!(
                "bridge destination {destination} configured without a transport"
            ))
        })?;

        let payload = message.encode()?;
        match transport.send(destination, &payload) {
            Ok(id) => {
                debug!(%destination, delta = message.delta, transaction_id = %id, "bridge notified");
                Ok(Some(id))
            }
            Err(e) => {
                warn!(%destination, delta = message.delta, error = %e, "bridge send failed");
                Err(IssuanceError::Bridge(e.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for BridgeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeNotifier")
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

// ── Transports ─────────────────────────────────────────────────────

/// Accepts everything; the transaction id is the hex sha256 of the payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransport;

impl BridgeTransport for NoopTransport {
    fn send(&self, destination: &str, payload: &[u8]) -> Result<TransactionId, CollaboratorError> {
        let mut hasher = Sha256::new();
        hasher.update(destination.as_bytes());
        hasher.update(payload);
        Ok(TransactionId(hex::encode(hasher.finalize())))
    }
}

/// Keeps every sent message in memory. Can be switched to fail.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    inner: Mutex<Recording>,
}

#[derive(Debug, Default)]
struct Recording {
    sent: Vec<BridgeMessage>,
    failing: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).failing = failing;
    }

    pub fn sent(&self) -> Vec<BridgeMessage> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sent
            .clone()
    }
}

impl BridgeTransport for RecordingTransport {
    fn send(&self, destination: &str, payload: &[u8]) -> Result<TransactionId, CollaboratorError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.failing {
            return Err(CollaboratorError::Unavailable(format!(
                "transport to {destination} is down"
            )));
        }
        let message: BridgeMessage = serde_json::from_slice(payload)
            .map_err(|e| CollaboratorError::Rejected(format!("malformed bridge payload: {e}")))?;
        inner.sent.push(message);
        Ok(TransactionId(format!("{destination}-{}", inner.sent.len())))
    }
}

//! PIN / passphrase challenge bridging between the device and the host.
//!
//! Every challenge gets its own correlation id and one-shot reply channel, so
//! concurrent prompts can never receive each other's answers and each one is
//! resolved exactly once.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::device::{ChallengeReply, PinKind};
use crate::core::errors::{Result, WalletError};

pub const PIN_REQUEST_EVENT: &str = "TREZOR_PIN_REQUEST";
pub const PIN_RESPONSE_EVENT: &str = "ON_PIN";
pub const PASSPHRASE_REQUEST_EVENT: &str = "TREZOR_PASSPHRASE_REQUEST";
pub const PASSPHRASE_RESPONSE_EVENT: &str = "ON_PASSPHRASE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeKind {
    Pin(PinKind),
    Passphrase,
}

impl ChallengeKind {
    pub fn request_event(&self) -> &'static str {
        match self {
            ChallengeKind::Pin(_) => PIN_REQUEST_EVENT,
            ChallengeKind::Passphrase => PASSPHRASE_REQUEST_EVENT,
        }
    }

    pub fn response_event(&self) -> &'static str {
        match self {
            ChallengeKind::Pin(_) => PIN_RESPONSE_EVENT,
            ChallengeKind::Passphrase => PASSPHRASE_RESPONSE_EVENT,
        }
    }
}

/// Prompt delivered to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRequest {
    pub id: u64,
    pub kind: ChallengeKind,
}

struct BridgeInner {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, ChallengeReply>>,
    host: mpsc::UnboundedSender<ChallengeRequest>,
}

/// Cloneable handle shared by the session manager and the host.
#[derive(Clone)]
pub struct ChallengeBridge {
    inner: Arc<BridgeInner>,
}

impl ChallengeBridge {
    /// Returns the bridge and the receiver the host listens on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChallengeRequest>) {
        let (host, requests) = mpsc::unbounded_channel();
        let bridge = Self {
            inner: Arc::new(BridgeInner {
                next_id: AtomicU64::new(1),
                pending: Mutex::new(HashMap::new()),
                host,
            }),
        };
        (bridge, requests)
    }

    /// Registers the device's reply channel, then notifies the host.
    pub fn forward(&self, kind: ChallengeKind, reply: ChallengeReply) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.pending.lock().insert(id, reply);

        info!(id, event = kind.request_event(), "forwarding device challenge to host");
        if self.inner.host.send(ChallengeRequest { id, kind }).is_err() {
            warn!(id, "no host is listening for challenges");
            if let Some(reply) = self.inner.pending.lock().remove(&id) {
                let _ = reply.send(Err(WalletError::ChallengeError(
                    "no host is listening for challenges".to_string(),
                )));
            }
        }
        id
    }

    /// Delivers the host's `(error, value)` answer for challenge `id`.
    pub fn answer(&self, id: u64, answer: std::result::Result<String, WalletError>) -> Result<()> {
        let reply = self
            .inner
            .pending
            .lock()
            .remove(&id)
            .ok_or_else(|| WalletError::ChallengeError(format!("no pending challenge with id {}", id)))?;

        debug!(id, accepted = answer.is_ok(), "host answered challenge");
        reply
            .send(answer)
            .map_err(|_| WalletError::ChallengeError(format!("device stopped waiting for challenge {}", id)))
    }

    /// Fails every outstanding challenge, e.g. after the device went away.
    pub fn abandon_all(&self, reason: &str) -> usize {
        let drained: Vec<_> = self.inner.pending.lock().drain().collect();
        let count = drained.len();
        for (id, reply) in drained {
            debug!(id, reason, "abandoning challenge");
            let _ = reply.send(Err(WalletError::ChallengeError(reason.to_string())));
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.inner.pending.lock().len()
    }
}

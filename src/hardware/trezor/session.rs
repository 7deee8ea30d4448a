//! Trezor 会话管理
//!
//! Owns the single live device session. Callers go through [`SessionManager::acquire`],
//! which hands back the held session when there is one and otherwise takes the
//! device over and registers the event reactions that keep the state honest.

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

use super::challenge::{ChallengeBridge, ChallengeKind};
use super::device::{
    AcquiredDevice, ChallengeReply, DeviceEventHandler, DeviceList, PinKind, TrezorDevice, TrezorSession,
};
use crate::core::errors::{Result, WalletError};

/// A live session plus the acquisition it came from.
#[derive(Clone)]
pub struct SessionHandle {
    generation: u64,
    session: Arc<dyn TrezorSession>,
}

impl SessionHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn session(&self) -> &dyn TrezorSession {
        self.session.as_ref()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle").field("generation", &self.generation).finish()
    }
}

#[derive(Default)]
struct SessionState {
    device: Option<Arc<dyn TrezorDevice>>,
    session: Option<SessionHandle>,
    generation: u64,
}

pub struct SessionManager {
    device_list: Arc<dyn DeviceList>,
    bridge: ChallengeBridge,
    state: Arc<Mutex<SessionState>>,
    // serializes acquisition so concurrent callers share one session
    acquire_lock: tokio::sync::Mutex<()>,
}

impl SessionManager {
    pub fn new(device_list: Arc<dyn DeviceList>, bridge: ChallengeBridge) -> Self {
        Self {
            device_list,
            bridge,
            state: Arc::new(Mutex::new(SessionState::default())),
            acquire_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the held session or acquires a new one.
    ///
    /// May wait indefinitely while the user enters a PIN or passphrase.
    pub async fn acquire(&self) -> Result<SessionHandle> {
        if !self.device_list.has_transport() {
            warn!("no Trezor transport available");
            return Err(WalletError::BridgeUnavailable);
        }

        if let Some(handle) = self.current() {
            debug!(generation = handle.generation, "reusing held session");
            return Ok(handle);
        }

        let _guard = self.acquire_lock.lock().await;
        if let Some(handle) = self.current() {
            debug!(generation = handle.generation, "session acquired by a concurrent caller");
            return Ok(handle);
        }

        let previous = self.state.lock().device.clone();
        if let Some(device) = previous {
            info!("stealing device back from its current session");
            device.steal().await?;
        }

        let AcquiredDevice { device, session } = self.device_list.acquire_first_device().await?;

        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.generation
        };
        device.subscribe(Arc::new(SessionEvents {
            state: Arc::downgrade(&self.state),
            generation,
            bridge: self.bridge.clone(),
        }));

        let handle = SessionHandle { generation, session };
        {
            let mut state = self.state.lock();
            state.device = Some(device);
            state.session = Some(handle.clone());
        }
        info!(generation, "acquired Trezor session");
        Ok(handle)
    }

    pub fn current(&self) -> Option<SessionHandle> {
        self.state.lock().session.clone()
    }

    pub fn has_device(&self) -> bool {
        self.state.lock().device.is_some()
    }

    /// Drops the held session if it is still the one `handle` refers to.
    ///
    /// The device reference is kept, so the next acquisition steals it back.
    /// Challenges raised on the dropped session are failed.
    pub fn invalidate(&self, handle: &SessionHandle) -> bool {
        let invalidated = {
            let mut state = self.state.lock();
            match &state.session {
                Some(current) if current.generation == handle.generation => {
                    state.session = None;
                    true
                }
                _ => false,
            }
        };

        if invalidated {
            let abandoned = self.bridge.abandon_all("session invalidated");
            info!(generation = handle.generation, abandoned, "session invalidated");
        } else {
            debug!(generation = handle.generation, "stale handle, nothing to invalidate");
        }
        invalidated
    }

    pub fn bridge(&self) -> &ChallengeBridge {
        &self.bridge
    }
}

/// Event reactions registered for one acquisition.
struct SessionEvents {
    state: Weak<Mutex<SessionState>>,
    generation: u64,
    bridge: ChallengeBridge,
}

impl SessionEvents {
    /// Runs `f` only while this acquisition is still the current one.
    fn with_current_state(&self, f: impl FnOnce(&mut SessionState)) -> bool {
        let Some(state) = self.state.upgrade() else {
            return false;
        };
        let mut state = state.lock();
        if state.generation != self.generation {
            debug!(generation = self.generation, "ignoring event from a superseded device");
            return false;
        }
        f(&mut state);
        true
    }
}

impl DeviceEventHandler for SessionEvents {
    fn on_disconnect(&self) {
        if self.with_current_state(|state| {
            state.device = None;
            state.session = None;
        }) {
            info!(generation = self.generation, "device disconnected");
            self.bridge.abandon_all("device disconnected");
        }
    }

    fn on_changed_sessions(&self, is_used: bool, is_used_here: bool) {
        if is_used && is_used_here {
            return;
        }
        if self.with_current_state(|state| state.session = None) {
            info!(is_used, is_used_here, "session taken over, dropping it");
        }
    }

    fn on_pin(&self, kind: PinKind, reply: ChallengeReply) {
        self.bridge.forward(ChallengeKind::Pin(kind), reply);
    }

    fn on_passphrase(&self, reply: ChallengeReply) {
        self.bridge.forward(ChallengeKind::Passphrase, reply);
    }
}

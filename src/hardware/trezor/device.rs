//! Trezor 设备接口
//!
//! The transport stack (bridge discovery, wire protocol, the device's own
//! signing) sits behind these traits. Implementations report device events
//! through a [`DeviceEventHandler`] registered with [`TrezorDevice::subscribe`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::core::bip44::DerivationPath;
use crate::core::errors::{Result, WalletError};
use crate::core::transaction::{DeviceSignature, MessageSignature, NormalizedTransaction};

/// Which PIN matrix the device is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinKind {
    Current,
    NewFirst,
    NewSecond,
}

impl PinKind {
    /// Maps `PinMatrixRequestType` values.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Current),
            2 => Some(Self::NewFirst),
            3 => Some(Self::NewSecond),
            _ => None,
        }
    }
}

/// Channel the device waits on for a PIN or passphrase.
pub type ChallengeReply = oneshot::Sender<std::result::Result<String, WalletError>>;

/// `node` part of a `PublicKey` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdNode {
    pub chain_code: String,
    pub public_key: String,
}

/// Response of the typed `GetPublicKey` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyMessage {
    pub node: HdNode,
    #[serde(default)]
    pub xpub: Option<String>,
}

/// Reactions to events a device emits while it is held.
pub trait DeviceEventHandler: Send + Sync {
    fn on_disconnect(&self);

    fn on_changed_sessions(&self, is_used: bool, is_used_here: bool);

    fn on_pin(&self, kind: PinKind, reply: ChallengeReply);

    fn on_passphrase(&self, reply: ChallengeReply);
}

/// An acquired session on one physical device.
#[async_trait]
pub trait TrezorSession: Send + Sync {
    async fn sign_eth_tx(
        &self,
        path: &DerivationPath,
        tx: &NormalizedTransaction,
        network_id: u64,
    ) -> Result<DeviceSignature>;

    async fn sign_eth_message(&self, path: &DerivationPath, message: &str) -> Result<MessageSignature>;

    async fn get_public_key(&self, address_n: &[u32]) -> Result<PublicKeyMessage>;
}

#[async_trait]
pub trait TrezorDevice: Send + Sync {
    /// Takes the device back from whichever session currently holds it.
    async fn steal(&self) -> Result<()>;

    fn subscribe(&self, handler: Arc<dyn DeviceEventHandler>);
}

pub struct AcquiredDevice {
    pub device: Arc<dyn TrezorDevice>,
    pub session: Arc<dyn TrezorSession>,
}

/// Device discovery / acquisition.
#[async_trait]
pub trait DeviceList: Send + Sync {
    /// False when no bridge or transport could be reached.
    fn has_transport(&self) -> bool;

    async fn acquire_first_device(&self) -> Result<AcquiredDevice>;
}

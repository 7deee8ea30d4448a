// tests/util.rs
// In-memory Trezor stand-in shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use trezor_eth_wallet::core::bip44::{DerivationPath, ExtendedPublicKey, ACCOUNT_PREFIX};
use trezor_eth_wallet::core::transaction::{DeviceSignature, MessageSignature, NormalizedTransaction};
use trezor_eth_wallet::hardware::trezor::device::{HdNode, PublicKeyMessage};
use trezor_eth_wallet::hardware::trezor::{
    AcquiredDevice, DeviceEventHandler, DeviceList, PinKind, TrezorDevice, TrezorSession,
};
use trezor_eth_wallet::{Result, WalletError};

/// Public key of scalar 0x0101..01, chain code 0x0202..02
pub const ROOT_PUBLIC_KEY: &str = "031b84c5567b126440995d3ed5aaba0565d71e1834604819ff9c17f5e9d5dd078f";
pub const ROOT_CHAIN_CODE: &str = "0202020202020202020202020202020202020202020202020202020202020202";

pub const ACCOUNT_0: &str = "0x592c1173a1f2bb4a86c13ec3b3fd5c2d2fb42851";
pub const ACCOUNT_1: &str = "0xbe187e44aaf14163980a1a38e80493d9fdcbbbc7";
pub const ACCOUNT_5: &str = "0x25debfedb5cc270e1025dee80a9d92ae2b92ce8f";
pub const ACCOUNT_6: &str = "0x6217e658cbc0143f6d7d34200523d6c640b20f65";
pub const ACCOUNT_7: &str = "0x5c9fa61e57810d5a68bc1d62f5bec2b152c1ad29";

pub fn root_node() -> ExtendedPublicKey {
    ExtendedPublicKey::from_hex(ROOT_PUBLIC_KEY, ROOT_CHAIN_CODE).unwrap()
}

/// What the stub asks of the host before answering a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Challenge {
    None,
    Pin,
    Passphrase,
}

#[derive(Debug, Clone)]
pub struct SignedCall {
    pub path: DerivationPath,
    pub tx: NormalizedTransaction,
    pub network_id: u64,
}

/// Behaviour shared by every session the stub hands out.
pub struct StubBehaviour {
    pub signature: Mutex<DeviceSignature>,
    pub sign_delay: Mutex<Option<Duration>>,
    pub challenge: Mutex<Challenge>,
    pub public_key_override: Mutex<Option<String>>,
    pub fail_with: Mutex<Option<WalletError>>,
    pub signed: Mutex<Vec<SignedCall>>,
}

impl Default for StubBehaviour {
    fn default() -> Self {
        Self {
            signature: Mutex::new(DeviceSignature { v: 28, r: "11".into(), s: "22".into() }),
            sign_delay: Mutex::new(None),
            challenge: Mutex::new(Challenge::None),
            public_key_override: Mutex::new(None),
            fail_with: Mutex::new(None),
            signed: Mutex::new(Vec::new()),
        }
    }
}

#[derive(Default)]
pub struct StubDevice {
    pub steals: AtomicUsize,
    handler: Mutex<Option<Arc<dyn DeviceEventHandler>>>,
}

impl StubDevice {
    pub fn handler(&self) -> Arc<dyn DeviceEventHandler> {
        self.handler.lock().clone().expect("device has no subscriber")
    }
}

#[async_trait]
impl TrezorDevice for StubDevice {
    async fn steal(&self) -> Result<()> {
        self.steals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(&self, handler: Arc<dyn DeviceEventHandler>) {
        *self.handler.lock() = Some(handler);
    }
}

pub struct StubSession {
    device: Arc<StubDevice>,
    behaviour: Arc<StubBehaviour>,
}

impl StubSession {
    async fn run_challenge(&self) -> Result<()> {
        let challenge = *self.behaviour.challenge.lock();
        let (reply, answer) = oneshot::channel();
        match challenge {
            Challenge::None => return Ok(()),
            Challenge::Pin => self.device.handler().on_pin(PinKind::Current, reply),
            Challenge::Passphrase => self.device.handler().on_passphrase(reply),
        }
        match answer.await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(WalletError::DeviceError("challenge dropped".into())),
        }
    }

    fn injected_failure(&self) -> Result<()> {
        match self.behaviour.fail_with.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TrezorSession for StubSession {
    async fn sign_eth_tx(
        &self,
        path: &DerivationPath,
        tx: &NormalizedTransaction,
        network_id: u64,
    ) -> Result<DeviceSignature> {
        self.run_challenge().await?;
        self.injected_failure()?;
        let delay = *self.behaviour.sign_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.behaviour.signed.lock().push(SignedCall { path: *path, tx: tx.clone(), network_id });
        Ok(self.behaviour.signature.lock().clone())
    }

    async fn sign_eth_message(&self, path: &DerivationPath, message: &str) -> Result<MessageSignature> {
        self.run_challenge().await?;
        self.injected_failure()?;
        let address = root_node().derive_child(path.address_index())?.ethereum_address();
        Ok(MessageSignature { address, signature: format!("0x{}", hex::encode(message.as_bytes())) })
    }

    async fn get_public_key(&self, address_n: &[u32]) -> Result<PublicKeyMessage> {
        self.run_challenge().await?;
        self.injected_failure()?;
        let override_key = self.behaviour.public_key_override.lock().clone();
        let node = if address_n == ACCOUNT_PREFIX.as_slice() {
            HdNode {
                chain_code: ROOT_CHAIN_CODE.to_string(),
                public_key: override_key.unwrap_or_else(|| ROOT_PUBLIC_KEY.to_string()),
            }
        } else if address_n.len() == 4 && address_n[..3] == ACCOUNT_PREFIX {
            let child = root_node().derive_child(address_n[3])?;
            HdNode { chain_code: hex::encode(child.chain_code()), public_key: child.compressed_hex() }
        } else {
            return Err(WalletError::DeviceError(format!("unexpected path {:?}", address_n)));
        };
        Ok(PublicKeyMessage { node, xpub: None })
    }
}

pub struct StubDeviceList {
    pub transport: AtomicBool,
    pub acquisitions: AtomicUsize,
    pub devices: Mutex<Vec<Arc<StubDevice>>>,
    pub behaviour: Arc<StubBehaviour>,
}

impl StubDeviceList {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            transport: AtomicBool::new(true),
            acquisitions: AtomicUsize::new(0),
            devices: Mutex::new(Vec::new()),
            behaviour: Arc::new(StubBehaviour::default()),
        })
    }

    pub fn without_transport() -> Arc<Self> {
        let list = Self::new();
        list.transport.store(false, Ordering::SeqCst);
        list
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn device(&self, i: usize) -> Arc<StubDevice> {
        self.devices.lock()[i].clone()
    }
}

#[async_trait]
impl DeviceList for StubDeviceList {
    fn has_transport(&self) -> bool {
        self.transport.load(Ordering::SeqCst)
    }

    async fn acquire_first_device(&self) -> Result<AcquiredDevice> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        let device = Arc::new(StubDevice::default());
        self.devices.lock().push(device.clone());
        let session = Arc::new(StubSession { device: device.clone(), behaviour: self.behaviour.clone() });
        Ok(AcquiredDevice { device, session })
    }
}

/// Runs a callback-style wallet call and returns what the callback received.
macro_rules! callback_result {
    ($wallet:expr, $method:ident ( $($arg:expr),* )) => {{
        let mut slot = None;
        $wallet.$method($($arg,)* |result| slot = Some(result)).await;
        slot.expect("callback was not invoked")
    }};
}

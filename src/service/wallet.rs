//! Callback façade handed to web3-style hosts.
//!
//! Every operation reports through a single callback taking a `Result`: the
//! host gets either the value or the error, never both and never neither.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::core::config::WalletConfig;
use crate::core::errors::Result;
use crate::core::registry::{AccountRecord, AccountRegistry};
use crate::core::signing::SigningOrchestrator;
use crate::core::transaction::{MessageSignature, TransactionRequest};
use crate::hardware::trezor::{ChallengeBridge, ChallengeRequest, DeviceList, SessionManager};

/// Trezor-backed wallet service.
pub struct TrezorWallet {
    config: WalletConfig,
    sessions: Arc<SessionManager>,
    registry: Arc<AccountRegistry>,
    orchestrator: SigningOrchestrator,
}

impl TrezorWallet {
    /// Builds the wallet and returns the receiver on which the host gets
    /// PIN / passphrase prompts.
    pub fn new(config: WalletConfig, device_list: Arc<dyn DeviceList>) -> (Self, mpsc::UnboundedReceiver<ChallengeRequest>) {
        let (bridge, challenges) = ChallengeBridge::new();
        let sessions = Arc::new(SessionManager::new(device_list, bridge));
        let registry = Arc::new(AccountRegistry::new());
        let orchestrator = SigningOrchestrator::new(sessions.clone(), registry.clone(), config.network_id);

        info!(network_id = config.network_id, "Trezor wallet ready");
        (Self { config, sessions, registry, orchestrator }, challenges)
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// Where the host answers challenges it received.
    pub fn challenges(&self) -> &ChallengeBridge {
        self.sessions.bridge()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn accounts(&self) -> Vec<AccountRecord> {
        self.registry.records()
    }

    pub fn orchestrator(&self) -> &SigningOrchestrator {
        &self.orchestrator
    }

    pub async fn discover_accounts<F>(&self, offset: u32, quantity: u32, callback: F)
    where
        F: FnOnce(Result<Vec<String>>),
    {
        let result = self
            .orchestrator
            .discover_accounts(offset, quantity)
            .await
            .map(|batch| batch.into_iter().map(|record| record.address).collect());
        deliver("discoverAccounts", result, callback);
    }

    /// Discovery with the configured offset and quantity.
    pub async fn get_accounts<F>(&self, callback: F)
    where
        F: FnOnce(Result<Vec<String>>),
    {
        self.discover_accounts(self.config.accounts_offset, self.config.accounts_quantity, callback)
            .await;
    }

    pub async fn sign_transaction<F>(&self, tx: &TransactionRequest, callback: F)
    where
        F: FnOnce(Result<String>),
    {
        let result = self.orchestrator.sign_transaction(tx).await;
        deliver("signTransaction", result, callback);
    }

    pub async fn sign_personal_message<F>(&self, address: &str, message: &str, callback: F)
    where
        F: FnOnce(Result<MessageSignature>),
    {
        let result = self.orchestrator.sign_personal_message(address, message).await;
        deliver("signPersonalMessage", result, callback);
    }

    pub async fn get_public_key<F>(&self, address: &str, callback: F)
    where
        F: FnOnce(Result<String>),
    {
        let result = self.orchestrator.get_public_key(address).await;
        deliver("getPublicKey", result, callback);
    }
}

fn deliver<T, F>(operation: &str, result: Result<T>, callback: F)
where
    F: FnOnce(Result<T>),
{
    if let Err(err) = &result {
        error!(operation, error = %err, "wallet operation failed");
    }
    callback(result);
}

/// Wallet factory; a missing network id means mainnet.
pub fn create_wallet(
    network_id: Option<u64>,
    accounts_offset: Option<u32>,
    accounts_quantity: Option<u32>,
    device_list: Arc<dyn DeviceList>,
) -> (TrezorWallet, mpsc::UnboundedReceiver<ChallengeRequest>) {
    let defaults = WalletConfig::default();
    let config = WalletConfig::new(
        network_id,
        accounts_offset.unwrap_or(defaults.accounts_offset),
        accounts_quantity.unwrap_or(defaults.accounts_quantity),
    );
    TrezorWallet::new(config, device_list)
}

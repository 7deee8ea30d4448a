//! Signing orchestration
//!
//! Resolves accounts through the registry, obtains a session, runs the device
//! request under a deadline and turns the device's answer into something the
//! host can broadcast.

use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::bip44::{DerivationPath, ExtendedPublicKey, ACCOUNT_PREFIX};
use crate::core::errors::{Result, WalletError};
use crate::core::registry::{AccountRecord, AccountRegistry};
use crate::core::transaction::{serialize_signed, MessageSignature, TransactionRequest};
use crate::hardware::trezor::{SessionHandle, SessionManager};
use crate::tools::async_support::{AsyncExecutor, TimeoutConfig};
use crate::tools::hex::add_hex_prefix;

pub struct SigningOrchestrator {
    sessions: Arc<SessionManager>,
    registry: Arc<AccountRegistry>,
    network_id: u64,
}

impl SigningOrchestrator {
    pub fn new(sessions: Arc<SessionManager>, registry: Arc<AccountRegistry>, network_id: u64) -> Self {
        Self { sessions, registry, network_id }
    }

    pub fn network_id(&self) -> u64 {
        self.network_id
    }

    /// Fetches the account-level xpub once and derives `quantity` addresses
    /// starting at `offset`, replacing the registry's previous batch.
    pub async fn discover_accounts(&self, offset: u32, quantity: u32) -> Result<Vec<AccountRecord>> {
        let handle = self.sessions.acquire().await?;
        // unbounded: the device may be waiting on PIN / passphrase entry
        let message = handle.session().get_public_key(&ACCOUNT_PREFIX).await?;

        let root = ExtendedPublicKey::from_hex(&message.node.public_key, &message.node.chain_code)?;
        let batch = self.registry.discover(&root, offset, quantity)?;
        info!(offset, quantity, "account discovery finished");
        Ok(batch)
    }

    /// Signs a legacy transaction and returns the `0x`-prefixed raw bytes.
    pub async fn sign_transaction(&self, tx: &TransactionRequest) -> Result<String> {
        let path = self.registry.path_for(&tx.from)?;
        let formatted = tx.formatted()?;
        let normalized = formatted.normalized();

        let handle = self.sessions.acquire().await?;
        info!(from = %tx.from, %path, network_id = self.network_id, "requesting transaction signature");
        let signature = self
            .device_request(
                &handle,
                "signEthTx",
                handle.session().sign_eth_tx(&path, &normalized, self.network_id),
            )
            .await?;

        let raw = serialize_signed(&formatted, &signature)?;
        Ok(add_hex_prefix(&hex::encode(raw)))
    }

    pub async fn sign_personal_message(&self, address: &str, message: &str) -> Result<MessageSignature> {
        let path = self.registry.path_for(address)?;
        let handle = self.sessions.acquire().await?;
        info!(%address, %path, "requesting personal message signature");
        self.device_request(&handle, "signEthMessage", handle.session().sign_eth_message(&path, message))
            .await
    }

    /// Raw public key (hex, as reported by the device) for `address`.
    pub async fn get_public_key(&self, address: &str) -> Result<String> {
        let path: DerivationPath = self.registry.path_for(address)?;
        let handle = self.sessions.acquire().await?;
        let message = self
            .device_request(&handle, "getPublicKey", handle.session().get_public_key(path.components()))
            .await?;
        Ok(message.node.public_key)
    }

    /// Bounded wait on a device request; a timeout drops the session so the
    /// next call reconnects.
    async fn device_request<T, F>(&self, handle: &SessionHandle, operation: &str, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let config = TimeoutConfig::device_request(operation);
        match AsyncExecutor::execute_with_timeout(request, &config).await {
            Err(err @ WalletError::TimeoutError(_)) => {
                warn!(operation, generation = handle.generation(), "invalidating session after timeout");
                self.sessions.invalidate(handle);
                Err(err)
            }
            other => other,
        }
    }
}

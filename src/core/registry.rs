//! Derivation index registry
//!
//! Maps addresses produced by the latest account discovery back to their
//! address index. Each discovery replaces the previous batch wholesale.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::bip44::{DerivationPath, ExtendedPublicKey};
use crate::core::errors::{Result, WalletError};

/// One discovered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub index: u32,
    /// Lowercase, `0x`-prefixed.
    pub address: String,
}

#[derive(Debug, Default)]
pub struct AccountRegistry {
    records: RwLock<Vec<AccountRecord>>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives `quantity` accounts starting at `offset` below `root`.
    pub fn derive_batch(root: &ExtendedPublicKey, offset: u32, quantity: u32) -> Result<Vec<AccountRecord>> {
        let mut batch = Vec::with_capacity(quantity as usize);
        for i in 0..quantity {
            let index = offset.checked_add(i).ok_or_else(|| {
                WalletError::KeyDerivationError(format!("account index overflow at offset {} + {}", offset, i))
            })?;
            let address = root.derive_child(index)?.ethereum_address();
            debug!(index, %address, "derived account");
            batch.push(AccountRecord { index, address });
        }
        Ok(batch)
    }

    /// Derives a fresh batch and installs it in place of the previous one.
    ///
    /// The registry is untouched if derivation fails.
    pub fn discover(&self, root: &ExtendedPublicKey, offset: u32, quantity: u32) -> Result<Vec<AccountRecord>> {
        let batch = Self::derive_batch(root, offset, quantity)?;
        self.replace(batch.clone());
        Ok(batch)
    }

    pub fn replace(&self, batch: Vec<AccountRecord>) {
        info!(accounts = batch.len(), "replacing discovery batch");
        *self.records.write() = batch;
    }

    /// Exact-match reverse lookup of an address.
    pub fn lookup(&self, address: &str) -> Result<u32> {
        self.records
            .read()
            .iter()
            .find(|record| record.address == address)
            .map(|record| record.index)
            .ok_or_else(|| WalletError::UnknownAccount(address.to_string()))
    }

    pub fn path_for(&self, address: &str) -> Result<DerivationPath> {
        DerivationPath::for_index(self.lookup(address)?)
    }

    pub fn records(&self) -> Vec<AccountRecord> {
        self.records.read().clone()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.records.read().iter().map(|record| record.address.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

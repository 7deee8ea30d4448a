use serde::{Deserialize, Serialize};
use std::env;

use crate::core::errors::{Result, WalletError};

pub const ENV_NETWORK_ID: &str = "TREZOR_NETWORK_ID";
pub const ENV_ACCOUNTS_OFFSET: &str = "TREZOR_ACCOUNTS_OFFSET";
pub const ENV_ACCOUNTS_QUANTITY: &str = "TREZOR_ACCOUNTS_QUANTITY";

/// wallet配置
///
/// Only these three options are recognized; unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalletConfig {
    /// Network (chain) id handed to the device when signing.
    #[serde(default = "WalletConfig::default_network_id")]
    pub network_id: u64,

    /// First address index produced by account discovery.
    #[serde(default = "WalletConfig::default_accounts_offset")]
    pub accounts_offset: u32,

    /// Number of accounts produced by account discovery.
    #[serde(default = "WalletConfig::default_accounts_quantity")]
    pub accounts_quantity: u32,
}

impl WalletConfig {
    fn default_network_id() -> u64 { 1 }
    fn default_accounts_offset() -> u32 { 0 }
    fn default_accounts_quantity() -> u32 { 6 }

    pub fn new(network_id: Option<u64>, accounts_offset: u32, accounts_quantity: u32) -> Self {
        Self {
            network_id: network_id.unwrap_or_else(Self::default_network_id),
            accounts_offset,
            accounts_quantity,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads `TREZOR_NETWORK_ID`, `TREZOR_ACCOUNTS_OFFSET` and
    /// `TREZOR_ACCOUNTS_QUANTITY`, falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            network_id: env_or(ENV_NETWORK_ID, Self::default_network_id())?,
            accounts_offset: env_or(ENV_ACCOUNTS_OFFSET, Self::default_accounts_offset())?,
            accounts_quantity: env_or(ENV_ACCOUNTS_QUANTITY, Self::default_accounts_quantity())?,
        })
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network_id: Self::default_network_id(),
            accounts_offset: Self::default_accounts_offset(),
            accounts_quantity: Self::default_accounts_quantity(),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| WalletError::ConfigError(format!("{} is not a valid number: {}", key, raw))),
        Err(_) => Ok(default),
    }
}

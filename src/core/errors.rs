use thiserror::Error;

/// Errors surfaced by discovery, session handling and signing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No Trezor bridge / transport is reachable.
    #[error("TREZOR_BRIDGE_NOT_FOUND")]
    BridgeUnavailable,

    /// Address is not part of the most recent discovery batch.
    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    /// A device request outlived its deadline.
    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// Anything reported by the transport or the device itself.
    #[error("Device error: {0}")]
    DeviceError(String),

    /// The host rejected or abandoned a PIN/passphrase prompt.
    #[error("Challenge error: {0}")]
    ChallengeError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Key derivation error: {0}")]
    KeyDerivationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, WalletError>;

impl WalletError {
    /// 判断是否为关键error
    pub fn is_critical(&self) -> bool {
        matches!(self, WalletError::BridgeUnavailable | WalletError::KeyDerivationError(_))
    }

    /// 判断是否为可重试error
    ///
    /// A timed out signing request invalidates the session, so retrying
    /// re-acquires (and may re-authenticate) the device.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WalletError::TimeoutError(_) | WalletError::DeviceError(_))
    }
}

impl From<hex::FromHexError> for WalletError {
    fn from(err: hex::FromHexError) -> Self {
        WalletError::InvalidInput(err.to_string())
    }
}

impl From<toml::de::Error> for WalletError {
    fn from(err: toml::de::Error) -> Self {
        WalletError::ConfigError(err.to_string())
    }
}

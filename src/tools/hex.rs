//! Canonical hex encoding of transaction fields.
//!
//! The device expects every field as lowercase hex without a `0x` prefix and
//! with an even number of nibbles; the host usually hands us `0x`-prefixed
//! strings or plain numbers.

use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::errors::{Result, WalletError};

pub const HEX_PREFIX: &str = "0x";

/// A transaction field as supplied by the host: hex text or a plain number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(u64),
    Text(String),
}

impl FieldValue {
    /// Canonical device encoding of this field.
    pub fn normalized(&self) -> String {
        match self {
            FieldValue::Text(s) => normalize_hex(s),
            FieldValue::Number(n) => normalize_hex(&format!("{:x}", n)),
        }
    }

    /// Wire form: text gets exactly one `0x`, numbers pass through untouched.
    pub fn to_wire(&self) -> FieldValue {
        match self {
            FieldValue::Text(s) => FieldValue::Text(add_hex_prefix(s)),
            FieldValue::Number(n) => FieldValue::Number(*n),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Number(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Adds a single `0x` unless one is already there.
pub fn add_hex_prefix(value: &str) -> String {
    if value.starts_with(HEX_PREFIX) {
        value.to_string()
    } else {
        format!("{}{}", HEX_PREFIX, value)
    }
}

pub fn strip_hex_prefix(value: &str) -> &str {
    value.strip_prefix(HEX_PREFIX).unwrap_or(value)
}

/// Lowercase, unprefixed, left-padded to an even length.
pub fn normalize_hex(value: &str) -> String {
    let stripped = strip_hex_prefix(value).to_lowercase();
    if stripped.len() % 2 != 0 {
        format!("0{}", stripped)
    } else {
        stripped
    }
}

/// Re-encodes a numeric quantity (decimal text, `0x` text or a number) as
/// unprefixed hex. Gas limits arrive this way from web3 clients.
pub fn reencode_quantity(value: &FieldValue) -> Result<String> {
    let parsed = match value {
        FieldValue::Number(n) => U256::from(*n),
        FieldValue::Text(s) => {
            let s = s.trim();
            match s.strip_prefix(HEX_PREFIX).or_else(|| s.strip_prefix("0X")) {
                Some(hex) => U256::from_str_radix(hex, 16).map_err(|e| {
                    WalletError::InvalidInput(format!("invalid hex quantity '{}': {}", s, e))
                })?,
                None => U256::from_dec_str(s).map_err(|e| {
                    WalletError::InvalidInput(format!("invalid decimal quantity '{}': {}", s, e))
                })?,
            }
        }
    };
    Ok(format!("{:x}", parsed))
}

/// Parses a hex quantity (prefixed or not) into an integer; empty means zero.
pub fn parse_quantity(value: &str) -> Result<U256> {
    let hex = normalize_hex(value);
    if hex.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(&hex, 16)
        .map_err(|e| WalletError::InvalidInput(format!("invalid hex quantity '{}': {}", value, e)))
}

pub fn decode_bytes(value: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(normalize_hex(value))?)
}

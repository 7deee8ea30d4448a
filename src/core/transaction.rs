//! Transaction shapes flowing between the host, the device and the signed
//! output.
//!
//! Three copies of a request exist during signing: the caller's original
//! (never mutated), a *formatted* copy whose gas limit was re-encoded as hex,
//! and a *normalized* copy of the formatted one that the device receives.
//! The signed transaction is assembled from the formatted copy.

use ethers::types::{Address, U256};
use ethers::utils::rlp::RlpStream;
use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, WalletError};
use crate::tools::hex::{decode_bytes, parse_quantity, reencode_quantity, FieldValue};

fn empty_data() -> FieldValue {
    FieldValue::Text("0x".to_string())
}

fn zero_value() -> FieldValue {
    FieldValue::Text("0x0".to_string())
}

/// Legacy transaction as handed over by a web3 client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: String,
    pub nonce: FieldValue,
    pub gas_price: FieldValue,
    #[serde(alias = "gas")]
    pub gas_limit: FieldValue,
    #[serde(default = "empty_data")]
    pub to: FieldValue,
    #[serde(default = "zero_value")]
    pub value: FieldValue,
    #[serde(default = "empty_data", alias = "input")]
    pub data: FieldValue,
}

impl TransactionRequest {
    /// Copy with the gas limit re-encoded from its numeric form to hex.
    ///
    /// Rejects a recipient that is neither empty nor 20 bytes.
    pub fn formatted(&self) -> Result<TransactionRequest> {
        check_recipient(&decode_bytes(&self.to.normalized())?)?;
        let mut formatted = self.clone();
        formatted.gas_limit = FieldValue::Text(reencode_quantity(&self.gas_limit)?);
        Ok(formatted)
    }

    /// Every field in canonical device encoding.
    pub fn normalized(&self) -> NormalizedTransaction {
        NormalizedTransaction {
            from: FieldValue::Text(self.from.clone()).normalized(),
            nonce: self.nonce.normalized(),
            gas_price: self.gas_price.normalized(),
            gas_limit: self.gas_limit.normalized(),
            to: self.to.normalized(),
            value: self.value.normalized(),
            data: self.data.normalized(),
        }
    }
}

/// Fields exactly as the device's `signEthTx` expects them: lowercase,
/// unprefixed, even-length hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTransaction {
    pub from: String,
    pub nonce: String,
    pub gas_price: String,
    pub gas_limit: String,
    pub to: String,
    pub value: String,
    pub data: String,
}

/// Partial signature returned by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSignature {
    pub v: u64,
    pub r: String,
    pub s: String,
}

/// Result of `signEthMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSignature {
    pub address: String,
    pub signature: String,
}

/// RLP-serializes `[nonce, gasPrice, gasLimit, to, value, data, v, r, s]`.
pub fn serialize_signed(formatted: &TransactionRequest, signature: &DeviceSignature) -> Result<Vec<u8>> {
    let nonce = quantity(&formatted.nonce)?;
    let gas_price = quantity(&formatted.gas_price)?;
    let gas_limit = quantity(&formatted.gas_limit)?;
    let value = quantity(&formatted.value)?;
    let to = decode_bytes(&formatted.to.normalized())?;
    let data = decode_bytes(&formatted.data.normalized())?;

    // v comes from the raw number, r/s from the device's hex strings
    let v = U256::from(signature.v);
    let r = parse_quantity(&signature.r)?;
    let s = parse_quantity(&signature.s)?;

    let mut stream = RlpStream::new_list(9);
    stream.append(&nonce);
    stream.append(&gas_price);
    stream.append(&gas_limit);
    check_recipient(&to)?;
    if to.is_empty() {
        stream.append_empty_data();
    } else {
        stream.append(&Address::from_slice(&to));
    }
    stream.append(&value);
    stream.append(&data.as_slice());
    stream.append(&v);
    stream.append(&r);
    stream.append(&s);

    Ok(stream.out().to_vec())
}

/// Empty means contract creation.
fn check_recipient(to: &[u8]) -> Result<()> {
    match to.len() {
        0 | 20 => Ok(()),
        n => Err(WalletError::InvalidInput(format!("recipient must be 20 bytes, got {}", n))),
    }
}

fn quantity(field: &FieldValue) -> Result<U256> {
    match field {
        FieldValue::Number(n) => Ok(U256::from(*n)),
        FieldValue::Text(s) => parse_quantity(s),
    }
}

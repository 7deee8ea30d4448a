//! BIP44 paths and public-only BIP32 derivation
//!
//! Trezor accounts use the four component path `m/44'/60'/0'/index`: the
//! first three components are hardened and fixed, the address index is the
//! only variable part. The device exports the public key and chain code of
//! the hardened prefix once, and every address below it is derived here
//! without touching private key material.

use hmac::{Hmac, Mac};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, ProjectivePoint, PublicKey, Scalar};
use sha2::Sha512;
use sha3::{Digest, Keccak256};
use std::fmt;

use crate::core::errors::{Result, WalletError};

type HmacSha512 = Hmac<Sha512>;

pub const HARDENED_OFFSET: u32 = 0x8000_0000;
pub const PURPOSE: u32 = 44;
pub const ETHEREUM_COIN_TYPE: u32 = 60;
pub const DEFAULT_ACCOUNT: u32 = 0;

/// Hardened `m/44'/60'/0'` prefix the device exports its xpub for.
pub const ACCOUNT_PREFIX: [u32; 3] = [
    PURPOSE | HARDENED_OFFSET,
    ETHEREUM_COIN_TYPE | HARDENED_OFFSET,
    DEFAULT_ACCOUNT | HARDENED_OFFSET,
];

/// Full derivation path of one account: the fixed prefix plus an address index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    components: [u32; 4],
}

impl DerivationPath {
    pub fn for_index(index: u32) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(WalletError::KeyDerivationError(format!(
                "address index {} must not be hardened",
                index
            )));
        }
        let [purpose, coin_type, account] = ACCOUNT_PREFIX;
        Ok(Self { components: [purpose, coin_type, account, index] })
    }

    pub fn address_index(&self) -> u32 {
        self.components[3]
    }

    pub fn components(&self) -> &[u32] {
        &self.components
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for component in self.components {
            if component >= HARDENED_OFFSET {
                write!(f, "/{}'", component - HARDENED_OFFSET)?;
            } else {
                write!(f, "/{}", component)?;
            }
        }
        Ok(())
    }
}

/// Public key plus chain code: enough to derive non-hardened children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    public_key: PublicKey,
    chain_code: [u8; 32],
}

impl ExtendedPublicKey {
    pub fn new(public_key: PublicKey, chain_code: [u8; 32]) -> Self {
        Self { public_key, chain_code }
    }

    /// Builds the node from the hex strings the device reports
    /// (SEC1 public key, compressed or not, and a 32 byte chain code).
    pub fn from_hex(public_key: &str, chain_code: &str) -> Result<Self> {
        let key_bytes = hex::decode(public_key.trim_start_matches("0x")).map_err(|e| {
            WalletError::KeyDerivationError(format!("public key is not hex: {}", e))
        })?;
        let public_key = PublicKey::from_sec1_bytes(&key_bytes).map_err(|_| {
            WalletError::KeyDerivationError("public key is not a valid secp256k1 point".to_string())
        })?;

        let code_bytes = hex::decode(chain_code.trim_start_matches("0x")).map_err(|e| {
            WalletError::KeyDerivationError(format!("chain code is not hex: {}", e))
        })?;
        let chain_code: [u8; 32] = code_bytes.as_slice().try_into().map_err(|_| {
            WalletError::KeyDerivationError(format!(
                "chain code must be 32 bytes, got {}",
                code_bytes.len()
            ))
        })?;

        Ok(Self::new(public_key, chain_code))
    }

    /// CKDpub: non-hardened child derivation.
    pub fn derive_child(&self, index: u32) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(WalletError::KeyDerivationError(format!(
                "cannot derive hardened index {} from a public key",
                index
            )));
        }

        // HMAC-SHA512(chain_code, serP(K) || ser32(i))
        let mut mac = HmacSha512::new_from_slice(&self.chain_code)
            .map_err(|e| WalletError::KeyDerivationError(format!("HMAC initialization failed: {}", e)))?;
        mac.update(self.public_key.to_encoded_point(true).as_bytes());
        mac.update(&index.to_be_bytes());
        let result = mac.finalize().into_bytes();
        let (il, ir) = result.split_at(32);

        let tweak = Option::<Scalar>::from(Scalar::from_repr(*FieldBytes::from_slice(il)))
            .ok_or_else(|| WalletError::KeyDerivationError(format!("invalid tweak for index {}", index)))?;
        let point = ProjectivePoint::GENERATOR * tweak + self.public_key.to_projective();
        let public_key = PublicKey::from_affine(point.to_affine())
            .map_err(|_| WalletError::KeyDerivationError(format!("index {} derives the identity", index)))?;

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(ir);

        Ok(Self { public_key, chain_code })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn compressed_hex(&self) -> String {
        hex::encode(self.public_key.to_encoded_point(true).as_bytes())
    }

    pub fn ethereum_address(&self) -> String {
        public_key_to_address(&self.public_key)
    }
}

/// Ethereum address = keccak256(uncompressed pubkey without prefix)[12..]
pub fn public_key_to_address(public_key: &PublicKey) -> String {
    let encoded = public_key.to_encoded_point(false);
    let hash = Keccak256::digest(&encoded.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

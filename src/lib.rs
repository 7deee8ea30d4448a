// src/lib.rs
//! Ethereum accounts and signatures from a Trezor without exposing keys.
//!
//! The host discovers accounts, signs transactions and personal messages
//! through [`service::TrezorWallet`]; PIN and passphrase prompts come back to
//! it as [`hardware::trezor::ChallengeRequest`]s.

pub mod core;
pub mod hardware;
pub mod service;
pub mod tools;

pub use crate::core::config::WalletConfig;
pub use crate::core::errors::{Result, WalletError};
pub use crate::core::registry::AccountRecord;
pub use crate::core::transaction::TransactionRequest;
pub use crate::service::{create_wallet, TrezorWallet};

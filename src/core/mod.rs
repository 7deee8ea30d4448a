pub mod bip44;
pub mod config;
pub mod errors;
pub mod registry;
pub mod signing;
pub mod transaction;

pub use errors::{Result, WalletError};

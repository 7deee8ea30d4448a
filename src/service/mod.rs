pub mod wallet;

pub use wallet::{create_wallet, TrezorWallet};

//! 硬件wallet集成模块

pub mod trezor;

pub use trezor::{SessionManager, TrezorSession};

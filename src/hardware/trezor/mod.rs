//! Trezor 硬件wallet集成
//!
//! - device: collaborator traits for the transport stack
//! - challenge: PIN / passphrase bridging to the host
//! - session: single live session ownership

pub mod challenge;
pub mod device;
pub mod session;

pub use challenge::{ChallengeBridge, ChallengeKind, ChallengeRequest};
pub use device::{AcquiredDevice, DeviceEventHandler, DeviceList, PinKind, TrezorDevice, TrezorSession};
pub use session::{SessionHandle, SessionManager};

// src/tools/async_support.rs
//! Bounded waits for device requests.

use crate::core::errors::{Result, WalletError};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Wall-clock bound applied to every request sent to a held device session.
pub const DEVICE_REQUEST_TIMEOUT: Duration = Duration::from_millis(30_000);

/// 超时配置
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub duration: Duration,
    pub operation_name: String,
}

impl TimeoutConfig {
    pub fn new(duration: Duration, operation_name: impl Into<String>) -> Self {
        Self { duration, operation_name: operation_name.into() }
    }

    /// 标准超时：30 秒
    pub fn device_request(operation_name: impl Into<String>) -> Self {
        Self::new(DEVICE_REQUEST_TIMEOUT, operation_name)
    }
}

pub struct AsyncExecutor;

impl AsyncExecutor {
    /// Races `future` against the configured deadline.
    ///
    /// On expiry the future is dropped, which is the only cancellation signal
    /// the device layer gets; whatever it produces afterwards is discarded.
    pub async fn execute_with_timeout<F, T>(future: F, config: &TimeoutConfig) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match timeout(config.duration, future).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation = %config.operation_name, "device request timed out after {:?}", config.duration);
                Err(WalletError::TimeoutError(format!(
                    "Operation '{}' timed out after {:?}",
                    config.operation_name, config.duration
                )))
            }
        }
    }
}

pub mod async_support;
pub mod hex;
pub mod logging;

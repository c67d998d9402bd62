//! Core data types for DeFi protocol monitoring.

pub mod alert;
pub mod fmt;
pub mod protocol;
pub mod snapshot;

pub use alert::*;
pub use protocol::*;
pub use snapshot::*;

/// Current time as milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

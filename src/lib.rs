//! BLUB Station: XBee cellular radio stack
//!
//! Talks to a Digi XBee modem in API mode over a serial link. The stack
//! frames and deframes the byte stream, brings the modem into API mode,
//! polls modem and network status, keeps one outbound socket open and
//! carries an MQTT engine's traffic over that socket. Everything runs from a
//! single cooperative tick loop driven by [`station::Station::tick`].
pub mod core;
pub mod monitor;
pub mod mqtt;
pub mod protocol;
pub mod radio;
pub mod socket;
pub mod station;
pub mod util;

// Re-export commonly used items
pub use core::{Config, Error, Result};
pub use station::{LogDisplay, NullDisplay, Station, StatusDisplay};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

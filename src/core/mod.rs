//! Core types and traits for the BLUB station radio stack
//!
//! This module contains the fundamental building blocks used throughout the library.

pub mod error;
pub mod types;
pub mod serde;

pub use self::error::{Error, Result};
pub use self::types::{
    Config,
    MonitorConfig,
    MqttConfig,
    SerialConfig,
    SocketConfig,
    StationConfig,
    TransportProtocol,
};

/// Largest frame payload (excluding type byte), big enough for a 1500 byte packet
pub const MAX_PAYLOAD: usize = 1536;

/// Bytes a frame adds around its payload: delimiter, length (x2), type, checksum
pub const FRAME_OVERHEAD: usize = 5;

/// Start delimiter that opens every API frame
pub const START_DELIMITER: u8 = 0x7E;

/// Longest access point name the modem accepts
pub const MAX_APN_LEN: usize = 49;

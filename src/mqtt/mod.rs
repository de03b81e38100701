//! MQTT over a modem socket
//!
//! Adapts an external MQTT engine's send/receive calls onto socket frames.

pub mod adapter;
pub mod engine;

pub use self::adapter::{MqttAdapter, PublishCallback, SEND_FRAME_ID};
pub use self::engine::{MqttEngine, MqttTransport, PublishedMessage};

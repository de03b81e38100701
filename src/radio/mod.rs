//! Radio transport
//!
//! Owns the serial byte stream to the modem, brings the modem into API mode,
//! turns inbound bytes into frames and drains queued outbound frames.

pub mod clock;
pub mod ring;
pub mod serial;
pub mod transport;

pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::ring::RingBuffer;
pub use self::serial::{HostSerial, SerialLink};
pub use self::transport::{LinkState, NullRadio, XBeeRadio, API_BAUD, BUFFER_CAPACITY, COMMAND_BAUD};

use crate::protocol::Frame;

/// A frame-level radio link
pub trait Radio {
    /// Advances the link and returns the next complete inbound frame, if any
    fn poll(&mut self) -> Option<Frame>;

    /// Queues a frame for sending; frames that do not fit are logged and dropped
    fn enqueue(&mut self, frame: &Frame);

    /// Outbound bytes that can be queued right now, including frame overhead
    fn outgoing_space(&self) -> usize;

    /// True once frames can flow and all queued output has been written
    fn is_ready(&self) -> bool;

    /// Short link state name for status displays
    fn state_text(&self) -> &'static str;
}

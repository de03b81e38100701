//! Socket keeper
//!
//! Maintains one outbound modem socket through the extended socket frames.

pub mod keeper;

pub use self::keeper::{SocketKeeper, SocketPhase, CREATE_FRAME_ID, REQUEST_FRAME_ID};

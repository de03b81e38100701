//! Modem status monitor
//!
//! Polls the modem with AT commands on a fixed table and keeps a snapshot of
//! its identity, registration and signal state.

pub mod cyclic;
pub mod status;
pub mod status_monitor;

pub use self::cyclic::{Cyclic, Query};
pub use self::status::{AssociationStatus, CarrierProfile, Status, Technology};
pub use self::status_monitor::{StatusMonitor, POLL_ID_BASE};

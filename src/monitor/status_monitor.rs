use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::core::{Error, MonitorConfig, Result, MAX_APN_LEN};
use crate::protocol::{
    wire_size_of, AtCommand, AtCommandResponse, AtStatus, Frame, ModemStatus, ModemStatusCode,
};
use crate::radio::Clock;
use crate::util::{command_text, truncate_text};
use super::cyclic::{Cyclic, Query};
use super::status::{AssociationStatus, CarrierProfile, Status};

/// Frame id of the first poll slot; slot `i` polls with `POLL_ID_BASE + i`
pub const POLL_ID_BASE: u8 = 128;

/// Configuration writes are not acknowledged; the value is re-polled instead
const WRITE_FRAME_ID: u8 = 0;

const CARRIER_SLOT: usize = 0;
const APN_SLOT: usize = 1;

/// Keeps a refreshed snapshot of modem identity and network status.
///
/// Each slot of a fixed poll table is re-sent `poll_interval` after it was
/// last sent. Identity facts stop polling once read; a modem status event
/// makes every slot due again.
pub struct StatusMonitor {
    clock: Rc<dyn Clock>,
    poll_interval: u64,
    cyclics: Vec<Cyclic>,
    status: Status,
    pending_carrier: Option<CarrierProfile>,
    pending_apn: Option<String>,
}

impl StatusMonitor {
    pub fn new(config: &MonitorConfig, clock: Rc<dyn Clock>) -> Result<Self> {
        if config.poll_interval.is_zero() {
            return Err(Error::config("Status poll interval must be positive"));
        }

        let mut monitor = StatusMonitor {
            clock,
            poll_interval: duration_millis(config.poll_interval),
            cyclics: Query::ALL.iter().copied().map(Cyclic::new).collect(),
            status: Status::default(),
            pending_carrier: None,
            pending_apn: None,
        };

        if let Some(profile) = config.carrier_profile {
            monitor.configure_carrier(CarrierProfile::from_raw(profile));
        }
        if let Some(apn) = &config.apn {
            if apn.is_empty() || apn.len() > MAX_APN_LEN {
                return Err(Error::config(format!("Bad APN length: {}", apn.len())));
            }
            monitor.configure_apn(apn);
        }
        Ok(monitor)
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn cyclics(&self) -> &[Cyclic] {
        &self.cyclics
    }

    /// Queues a carrier profile write (`ATCP`)
    pub fn configure_carrier(&mut self, profile: CarrierProfile) {
        self.pending_carrier = Some(profile);
    }

    /// Queues an access point name write (`ATAN`), truncated to what the modem accepts
    pub fn configure_apn(&mut self, apn: &str) {
        let kept = truncate_text(apn, MAX_APN_LEN);
        if kept.len() < apn.len() {
            warn!(apn, max = MAX_APN_LEN, "APN too long, truncating");
        }
        self.pending_apn = Some(kept.to_string());
    }

    pub fn on_incoming(&mut self, frame: &Frame) {
        if let Some((response, value)) = frame.decode_as::<AtCommandResponse>() {
            self.on_response(&response, value);
            return;
        }

        if let Some((modem, _)) = frame.decode_as::<ModemStatus>() {
            info!(status = %modem.status, "Modem status");

            // Update immediately, then re-poll for the full status
            match modem.status {
                ModemStatusCode::PowerUp | ModemStatusCode::WatchdogReset => {
                    self.status.assoc_status = AssociationStatus::Initializing;
                }
                ModemStatusCode::Registered => {
                    self.status.assoc_status = AssociationStatus::Connected;
                }
                ModemStatusCode::Unregistered => {
                    self.status.assoc_status = AssociationStatus::Registering;
                }
                ModemStatusCode::UpdateApplying => {
                    self.status.assoc_status = AssociationStatus::FirmwareUpdate;
                }
                _ => {}
            }

            for cyclic in &mut self.cyclics {
                cyclic.next_due = cyclic.next_due.saturating_sub(self.poll_interval);
            }
        }
    }

    fn on_response(&mut self, response: &AtCommandResponse, value: &[u8]) {
        let index = match response.frame_id.checked_sub(POLL_ID_BASE) {
            Some(index) if usize::from(index) < self.cyclics.len() => usize::from(index),
            _ => return,
        };

        let cyclic = &mut self.cyclics[index];
        if !cyclic.enabled {
            trace!(command = %command_text(response.command), "Reply for settled query");
            return;
        }

        if response.command != cyclic.query.command() {
            warn!(
                expected = %command_text(cyclic.query.command()),
                got = %command_text(response.command),
                "AT reply for wrong command"
            );
            return;
        }

        if response.status != AtStatus::Ok {
            warn!(
                command = %command_text(response.command),
                status = %response.status,
                "AT command failed"
            );
            return;
        }

        let now = self.clock.now_millis();
        if cyclic.query.apply(&mut self.status, value, now) {
            cyclic.enabled = false;
        }
    }

    /// Builds the next configuration write or status poll, if one is due
    /// and fits in `space` bytes.
    pub fn maybe_make_outgoing(&mut self, space: usize, out: &mut Frame) -> bool {
        if space < wire_size_of::<AtCommand>(1) {
            return false;
        }

        let now = self.clock.now_millis();
        if let Some(profile) = self.pending_carrier.take() {
            debug!(profile = %profile, "Setting carrier profile");
            let header = AtCommand {
                frame_id: WRITE_FRAME_ID,
                command: Query::CarrierProfile.command(),
            };
            out.setup_as(&header, 1)[0] = profile.raw();
            self.force_poll(CARRIER_SLOT);
            return true;
        }

        if let Some(apn) = self.pending_apn.take() {
            if space < wire_size_of::<AtCommand>(apn.len()) {
                self.pending_apn = Some(apn);
                return false;
            }

            debug!(apn = %apn, "Requesting APN");
            let header = AtCommand {
                frame_id: WRITE_FRAME_ID,
                command: Query::RequestedApn.command(),
            };
            out.setup_as(&header, apn.len()).copy_from_slice(apn.as_bytes());
            self.force_poll(APN_SLOT);
            return true;
        }

        // Most overdue first; ties go to the earliest slot
        let next = self
            .cyclics
            .iter()
            .enumerate()
            .filter(|(_, cyclic)| cyclic.enabled && cyclic.next_due <= now)
            .min_by_key(|&(index, cyclic)| (cyclic.next_due, index))
            .map(|(index, _)| index);

        let Some(index) = next else {
            return false;
        };

        let cyclic = &mut self.cyclics[index];
        let header = AtCommand {
            frame_id: POLL_ID_BASE + index as u8,
            command: cyclic.query.command(),
        };
        out.setup_as(&header, 0);
        cyclic.next_due = now + self.poll_interval;
        trace!(command = %command_text(header.command), "Polling");
        true
    }

    /// Makes `slot` the most overdue entry so its value is read back next
    fn force_poll(&mut self, slot: usize) {
        let cyclic = &mut self.cyclics[slot];
        cyclic.next_due = 0;
        cyclic.enabled = true;
    }
}

fn duration_millis(duration: Duration) -> u64 {
    duration.as_millis().min(u128::from(u64::MAX)) as u64
}

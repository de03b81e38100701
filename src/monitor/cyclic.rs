use std::net::Ipv4Addr;

use tracing::{debug, info, warn};

use crate::util::copy_text;
use super::status::{
    AssociationStatus, CarrierProfile, Status, Technology, APN_SIZE, ICCID_SIZE, IMEI_SIZE,
    IMSI_SIZE, OPERATOR_SIZE,
};

/// A status fact polled with one AT command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    CarrierProfile,
    RequestedApn,
    HardwareVersion,
    FirmwareVersion,
    Iccid,
    Imei,
    Imsi,
    Association,
    Operator,
    NetworkTime,
    OperatingApn,
    Technology,
    Quality,
    Power,
    IpAddress,
}

impl Query {
    /// Poll table order; configuration writes rely on the first two slots
    pub const ALL: [Query; 15] = [
        Query::CarrierProfile,
        Query::RequestedApn,
        Query::HardwareVersion,
        Query::FirmwareVersion,
        Query::Iccid,
        Query::Imei,
        Query::Imsi,
        Query::Association,
        Query::Operator,
        Query::NetworkTime,
        Query::OperatingApn,
        Query::Technology,
        Query::Quality,
        Query::Power,
        Query::IpAddress,
    ];

    pub fn command(self) -> [u8; 2] {
        match self {
            Query::CarrierProfile => *b"CP",
            Query::RequestedApn => *b"AN",
            Query::HardwareVersion => *b"HV",
            Query::FirmwareVersion => *b"VR",
            Query::Iccid => *b"S#",
            Query::Imei => *b"IM",
            Query::Imsi => *b"II",
            Query::Association => *b"AI",
            Query::Operator => *b"MN",
            Query::NetworkTime => *b"DT",
            Query::OperatingApn => *b"OA",
            Query::Technology => *b"OT",
            Query::Quality => *b"SQ",
            Query::Power => *b"SW",
            Query::IpAddress => *b"MY",
        }
    }

    /// Stores a successful reply in `status`.
    ///
    /// Returns true when the value is settled for the session and the query
    /// should stop polling.
    pub fn apply(self, status: &mut Status, value: &[u8], now_millis: u64) -> bool {
        match self {
            Query::CarrierProfile => match value {
                [code] => {
                    status.carrier_profile = CarrierProfile::from_raw(*code);
                    debug!(profile = %status.carrier_profile, "Carrier profile");
                    true
                }
                [] => false,
                _ => bad_length("CP", value.len(), 1),
            },

            Query::RequestedApn => {
                status.requested_apn = copy_text(value, APN_SIZE);
                debug!(apn = %status.requested_apn, "Requested APN");
                true
            }

            Query::HardwareVersion => match value {
                &[hi, lo] => {
                    status.hardware_ver = u16::from_be_bytes([hi, lo]);
                    debug!("Hardware version {:04x}", status.hardware_ver);
                    true
                }
                _ => bad_length("HV", value.len(), 2),
            },

            Query::FirmwareVersion => match value {
                &[a, b, c, d] => {
                    status.firmware_ver = u32::from_be_bytes([a, b, c, d]);
                    debug!("Firmware version {:05x}", status.firmware_ver);
                    true
                }
                _ => bad_length("VR", value.len(), 4),
            },

            Query::Iccid => {
                status.iccid = copy_text(value, ICCID_SIZE);
                debug!(iccid = %status.iccid, "ICCID");
                !status.iccid.is_empty()
            }

            Query::Imei => {
                status.imei = copy_text(value, IMEI_SIZE);
                debug!(imei = %status.imei, "IMEI");
                !status.imei.is_empty()
            }

            Query::Imsi => {
                status.imsi = copy_text(value, IMSI_SIZE);
                !status.imsi.is_empty()
            }

            Query::Association => match value {
                [code] => {
                    status.assoc_status = AssociationStatus::from_raw(*code);
                    info!(assoc = %status.assoc_status, "Association status");
                    false
                }
                _ => bad_length("AI", value.len(), 1),
            },

            Query::Operator => {
                status.network_operator = copy_text(value, OPERATOR_SIZE);
                debug!(operator = %status.network_operator, "Network operator");
                false
            }

            Query::NetworkTime => match value {
                &[a, b, c, d] => {
                    status.network_time = u32::from_be_bytes([a, b, c, d]);
                    status.network_time_millis = now_millis;
                    debug!(
                        time = status.network_time,
                        offset = status.network_time_offset(),
                        "Network time"
                    );
                    false
                }
                [] => false,
                _ => bad_length("DT", value.len(), 4),
            },

            Query::OperatingApn => {
                status.operating_apn = copy_text(value, APN_SIZE);
                debug!(apn = %status.operating_apn, "Operating APN");
                false
            }

            Query::Technology => match value {
                &[hi, lo] => {
                    status.technology = Technology::from_raw(u16::from_be_bytes([hi, lo]));
                    debug!(technology = %status.technology, "Technology");
                    false
                }
                [] => false,
                _ => bad_length("OT", value.len(), 2),
            },

            Query::Quality => match value {
                &[hi, lo] => {
                    status.received_quality = f32::from(u16::from_be_bytes([hi, lo])) * -0.1;
                    debug!(quality = status.received_quality, "Signal quality (dB)");
                    false
                }
                [] => false,
                _ => bad_length("SQ", value.len(), 2),
            },

            Query::Power => match value {
                &[hi, lo] => {
                    status.received_power = f32::from(u16::from_be_bytes([hi, lo])) * -0.1;
                    debug!(power = status.received_power, "Signal power (dBm)");
                    false
                }
                [] => false,
                _ => bad_length("SW", value.len(), 2),
            },

            Query::IpAddress => match value {
                &[a, b, c, d] => {
                    status.ip_address = Ipv4Addr::new(a, b, c, d);
                    debug!(ip = %status.ip_address, "IP address");
                    false
                }
                [] => false,
                _ => bad_length("MY", value.len(), 4),
            },
        }
    }
}

fn bad_length(command: &str, size: usize, expected: usize) -> bool {
    warn!(command, size, expected, "Bad reply length");
    false
}

/// One slot of the poll table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cyclic {
    pub query: Query,
    pub enabled: bool,
    /// Clock reading at which the next poll is due
    pub next_due: u64,
}

impl Cyclic {
    pub fn new(query: Query) -> Self {
        Cyclic {
            query,
            enabled: true,
            next_due: 0,
        }
    }
}

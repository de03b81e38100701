use std::net::Ipv4Addr;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::protocol::enums::wire_enum;

/// Field sizes, counting the terminator the modem reserves
pub const ICCID_SIZE: usize = 21;
pub const IMEI_SIZE: usize = 16;
pub const IMSI_SIZE: usize = 16;
pub const OPERATOR_SIZE: usize = 16;
pub const APN_SIZE: usize = 50;

/// Unix time of the modem's `DT` epoch, 2000-01-01T00:00:00Z
const XBEE_EPOCH_UNIX: i64 = 946_684_800;

wire_enum! {
    /// Carrier profile (`ATCP`)
    pub enum CarrierProfile: u8 {
        Autodetect = 0 => "AUTODETECT",
        NoProfile = 1 => "NO_PROFILE",
        Att = 2 => "ATT",
        Verizon = 3 => "VERIZON",
        Australia = 4 => "AUSTRALIA",
        UnknownProfile = 0xFF => "UNKNOWN_PROFILE",
    }
}

wire_enum! {
    /// Cellular association (`ATAI`)
    pub enum AssociationStatus: u8 {
        Connected = 0x00 => "CONNECTED",
        Registering = 0x22 => "REGISTERING",
        Connecting = 0x23 => "CONNECTING",
        NoHardware = 0x24 => "NO_HARDWARE",
        RegistrationDenied = 0x25 => "REGISTRATION_DENIED",
        AirplaneMode = 0x2A => "AIRPLANE_MODE",
        UsbDirectMode = 0x2B => "USB_DIRECT_MODE",
        PowerSaveMode = 0x2C => "POWER_SAVE_MODE",
        CommandedShutdown = 0x2D => "COMMANDED_SHUTDOWN",
        LowVoltageShutdown = 0x2E => "LOW_VOLTAGE_SHUTDOWN",
        BypassMode = 0x2F => "BYPASS_MODE",
        FirmwareUpdate = 0x30 => "FIRMWARE_UPDATE",
        RegulatoryTesting = 0x31 => "REGULATORY_TESTING",
        Initializing = 0xFF => "INITIALIZING",
    }
}

wire_enum! {
    /// Radio access technology (`ATOT`)
    pub enum Technology: u16 {
        Gsm = 0 => "GSM",
        LteM = 8 => "LTE_M",
        NbIot = 9 => "NB_IOT",
        UnknownTech = 0xFFFF => "UNKNOWN_TECH",
    }
}

/// Snapshot of modem identity and network state
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub hardware_ver: u16,
    pub firmware_ver: u32,
    pub iccid: String,
    pub imei: String,
    pub imsi: String,
    pub carrier_profile: CarrierProfile,
    pub assoc_status: AssociationStatus,
    pub network_operator: String,
    pub requested_apn: String,
    pub operating_apn: String,
    /// Seconds since 2000-01-01 UTC, as reported by the network
    pub network_time: u32,
    /// Local clock reading when `network_time` arrived
    pub network_time_millis: u64,
    pub technology: Technology,
    /// Received power (RSRP) in dBm
    pub received_power: f32,
    /// Received quality (RSRQ) in dB
    pub received_quality: f32,
    pub ip_address: Ipv4Addr,
}

impl Default for Status {
    fn default() -> Self {
        Status {
            hardware_ver: 0,
            firmware_ver: 0,
            iccid: String::new(),
            imei: String::new(),
            imsi: String::new(),
            carrier_profile: CarrierProfile::UnknownProfile,
            assoc_status: AssociationStatus::Initializing,
            network_operator: String::new(),
            requested_apn: String::new(),
            operating_apn: String::new(),
            network_time: 0,
            network_time_millis: 0,
            technology: Technology::UnknownTech,
            received_power: 0.0,
            received_quality: 0.0,
            ip_address: Ipv4Addr::UNSPECIFIED,
        }
    }
}

impl Status {
    pub fn carrier_profile_text(&self) -> &'static str {
        match self.carrier_profile {
            CarrierProfile::Unknown(_) => "UNKNOWN_PROFILE",
            profile => profile.text(),
        }
    }

    pub fn assoc_text(&self) -> &'static str {
        match self.assoc_status {
            AssociationStatus::Unknown(_) => "UNKNOWN_ASSOC",
            assoc => assoc.text(),
        }
    }

    pub fn technology_text(&self) -> &'static str {
        match self.technology {
            Technology::Unknown(_) => "UNKNOWN_TECH",
            technology => technology.text(),
        }
    }

    /// Network time as UTC, once the network has reported it
    pub fn network_time_utc(&self) -> Option<DateTime<Utc>> {
        if self.network_time == 0 {
            return None;
        }
        Utc.timestamp_opt(XBEE_EPOCH_UNIX + i64::from(self.network_time), 0)
            .single()
    }

    /// Network time extrapolated to local clock reading `now_millis`
    pub fn network_time_at(&self, now_millis: u64) -> Option<DateTime<Utc>> {
        let base = self.network_time_utc()?;
        let since = now_millis.saturating_sub(self.network_time_millis);
        Some(base + Duration::milliseconds(since as i64))
    }

    /// Network time seconds minus local clock seconds
    pub fn network_time_offset(&self) -> i64 {
        i64::from(self.network_time) - (self.network_time_millis / 1000) as i64
    }
}

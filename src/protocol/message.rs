//! AT command, SMS, IP, modem, relay, firmware and GNSS frame layouts

use std::net::Ipv4Addr;

use bytes::{Buf, BufMut};

use super::enums::{
    AtStatus, DeliveryStatus, FirmwareStatus, GnssCommand, GnssFixStatus, GnssStatus,
    IpProtocol, ModemStatusCode, RelayInterface, TransmitOption,
};
use super::frame::{get_array, get_ipv4, put_ipv4, Payload};

/// Length of the NUL-padded phone number field in SMS frames
pub const PHONE_NUMBER_LEN: usize = 20;

/// Local AT command, applied immediately (0x08); tail is the parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtCommand {
    /// Correlation id, 0 for no response
    pub frame_id: u8,
    pub command: [u8; 2],
}

impl Payload for AtCommand {
    const TYPE: u8 = 0x08;
    const HEADER_SIZE: usize = 3;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        AtCommand {
            frame_id: buf.get_u8(),
            command: get_array(buf),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_slice(&self.command);
    }
}

/// Local AT command, queued until applied (0x09); tail is the parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtCommandQueue {
    pub frame_id: u8,
    pub command: [u8; 2],
}

impl Payload for AtCommandQueue {
    const TYPE: u8 = 0x09;
    const HEADER_SIZE: usize = 3;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        AtCommandQueue {
            frame_id: buf.get_u8(),
            command: get_array(buf),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_slice(&self.command);
    }
}

/// Response to an AT command (0x88); tail is the returned value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtCommandResponse {
    pub frame_id: u8,
    pub command: [u8; 2],
    pub status: AtStatus,
}

impl Payload for AtCommandResponse {
    const TYPE: u8 = 0x88;
    const HEADER_SIZE: usize = 4;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        AtCommandResponse {
            frame_id: buf.get_u8(),
            command: get_array(buf),
            status: AtStatus::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_slice(&self.command);
        buf.put_u8(self.status.raw());
    }
}

/// Outgoing SMS (0x1F); tail is the message text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitSms {
    pub frame_id: u8,
    /// NUL-padded; digits and '+' only
    pub phone_number: [u8; PHONE_NUMBER_LEN],
}

impl Payload for TransmitSms {
    const TYPE: u8 = 0x1F;
    const HEADER_SIZE: usize = 2 + PHONE_NUMBER_LEN;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        let frame_id = buf.get_u8();
        buf.advance(1); // reserved
        TransmitSms {
            frame_id,
            phone_number: get_array(buf),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(0);
        buf.put_slice(&self.phone_number);
    }
}

/// Incoming SMS (0x9F); tail is the message text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveSms {
    pub phone_number: [u8; PHONE_NUMBER_LEN],
}

impl Payload for ReceiveSms {
    const TYPE: u8 = 0x9F;
    const HEADER_SIZE: usize = PHONE_NUMBER_LEN;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        ReceiveSms {
            phone_number: get_array(buf),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&self.phone_number);
    }
}

/// Outgoing IP datagram/stream data (0x20); tail is the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitIp {
    pub frame_id: u8,
    pub dest_ip: Ipv4Addr,
    pub dest_port: u16,
    pub source_port: u16,
    pub protocol: IpProtocol,
    pub options: TransmitOption,
}

impl Payload for TransmitIp {
    const TYPE: u8 = 0x20;
    const HEADER_SIZE: usize = 11;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        TransmitIp {
            frame_id: buf.get_u8(),
            dest_ip: get_ipv4(buf),
            dest_port: buf.get_u16(),
            source_port: buf.get_u16(),
            protocol: IpProtocol::from_raw(buf.get_u8()),
            options: TransmitOption::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        put_ipv4(buf, self.dest_ip);
        buf.put_u16(self.dest_port);
        buf.put_u16(self.source_port);
        buf.put_u8(self.protocol.raw());
        buf.put_u8(self.options.raw());
    }
}

/// Outgoing TLS data using a modem TLS profile (0x23); tail is the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitTls {
    pub frame_id: u8,
    pub dest_ip: Ipv4Addr,
    pub dest_port: u16,
    pub source_port: u16,
    pub tls_profile: u8,
    pub options: TransmitOption,
}

impl Payload for TransmitTls {
    const TYPE: u8 = 0x23;
    const HEADER_SIZE: usize = 11;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        TransmitTls {
            frame_id: buf.get_u8(),
            dest_ip: get_ipv4(buf),
            dest_port: buf.get_u16(),
            source_port: buf.get_u16(),
            tls_profile: buf.get_u8(),
            options: TransmitOption::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        put_ipv4(buf, self.dest_ip);
        buf.put_u16(self.dest_port);
        buf.put_u16(self.source_port);
        buf.put_u8(self.tls_profile);
        buf.put_u8(self.options.raw());
    }
}

/// Incoming IP data (0xB0); tail is the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveIp {
    pub source_ip: Ipv4Addr,
    pub dest_port: u16,
    pub source_port: u16,
    pub protocol: IpProtocol,
}

impl Payload for ReceiveIp {
    const TYPE: u8 = 0xB0;
    const HEADER_SIZE: usize = 10;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        let header = ReceiveIp {
            source_ip: get_ipv4(buf),
            dest_port: buf.get_u16(),
            source_port: buf.get_u16(),
            protocol: IpProtocol::from_raw(buf.get_u8()),
        };
        buf.advance(1); // reserved
        header
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        put_ipv4(buf, self.source_ip);
        buf.put_u16(self.dest_port);
        buf.put_u16(self.source_port);
        buf.put_u8(self.protocol.raw());
        buf.put_u8(0);
    }
}

/// Delivery result for a transmit or socket send (0x89)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitStatus {
    pub frame_id: u8,
    pub status: DeliveryStatus,
}

impl Payload for TransmitStatus {
    const TYPE: u8 = 0x89;
    const HEADER_SIZE: usize = 2;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        TransmitStatus {
            frame_id: buf.get_u8(),
            status: DeliveryStatus::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.status.raw());
    }
}

/// Unsolicited modem event (0x8A)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModemStatus {
    pub status: ModemStatusCode,
}

impl Payload for ModemStatus {
    const TYPE: u8 = 0x8A;
    const HEADER_SIZE: usize = 1;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        ModemStatus {
            status: ModemStatusCode::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.status.raw());
    }
}

/// Data relayed to another modem interface (0x2D); tail is the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayToInterface {
    pub frame_id: u8,
    pub interface: RelayInterface,
}

impl Payload for RelayToInterface {
    const TYPE: u8 = 0x2D;
    const HEADER_SIZE: usize = 2;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        RelayToInterface {
            frame_id: buf.get_u8(),
            interface: RelayInterface::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.interface.raw());
    }
}

/// Data relayed from another modem interface (0xAD); tail is the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayFromInterface {
    pub interface: RelayInterface,
}

impl Payload for RelayFromInterface {
    const TYPE: u8 = 0xAD;
    const HEADER_SIZE: usize = 1;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        RelayFromInterface {
            interface: RelayInterface::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.interface.raw());
    }
}

/// Firmware update block (0x2B); tail is the image chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareUpdate {
    pub id: u8,
    pub component: u8,
    /// Bit set of the `FLAG_*` constants
    pub flags: u8,
}

impl FirmwareUpdate {
    pub const FLAG_INITIAL: u8 = 0x01;
    pub const FLAG_FINAL: u8 = 0x02;
    pub const FLAG_CANCEL: u8 = 0x04;
}

impl Payload for FirmwareUpdate {
    const TYPE: u8 = 0x2B;
    const HEADER_SIZE: usize = 3;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        FirmwareUpdate {
            id: buf.get_u8(),
            component: buf.get_u8(),
            flags: buf.get_u8(),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.id);
        buf.put_u8(self.component);
        buf.put_u8(self.flags);
    }
}

/// Firmware update block result (0xAB)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareUpdateResponse {
    pub id: u8,
    pub status: FirmwareStatus,
}

impl Payload for FirmwareUpdateResponse {
    const TYPE: u8 = 0xAB;
    const HEADER_SIZE: usize = 2;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        FirmwareUpdateResponse {
            id: buf.get_u8(),
            status: FirmwareStatus::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.id);
        buf.put_u8(self.status.raw());
    }
}

/// GNSS control request (0x3D)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GnssRequest {
    pub frame_id: u8,
    pub command: GnssCommand,
    /// One-shot fix timeout in seconds
    pub oneshot_timeout: u16,
}

impl Payload for GnssRequest {
    const TYPE: u8 = 0x3D;
    const HEADER_SIZE: usize = 4;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        GnssRequest {
            frame_id: buf.get_u8(),
            command: GnssCommand::from_raw(buf.get_u8()),
            oneshot_timeout: buf.get_u16(),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.command.raw());
        buf.put_u16(self.oneshot_timeout);
    }
}

/// GNSS control acknowledgement (0xBD)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GnssResponse {
    pub frame_id: u8,
    pub command: GnssCommand,
    pub status: GnssStatus,
}

impl Payload for GnssResponse {
    const TYPE: u8 = 0xBD;
    const HEADER_SIZE: usize = 3;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        GnssResponse {
            frame_id: buf.get_u8(),
            command: GnssCommand::from_raw(buf.get_u8()),
            status: GnssStatus::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.command.raw());
        buf.put_u8(self.status.raw());
    }
}

/// Raw NMEA sentences (0xBE); the whole payload is the tail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GnssNmea;

impl Payload for GnssNmea {
    const TYPE: u8 = 0xBE;
    const HEADER_SIZE: usize = 0;

    fn read_header<B: Buf>(_buf: &mut B) -> Self {
        GnssNmea
    }

    fn write_header<B: BufMut>(&self, _buf: &mut B) {}
}

/// One-shot GNSS fix (0xBF)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GnssOneShot {
    pub status: GnssFixStatus,
    /// Seconds since 2000-01-01 when the fix was taken
    pub lock_time: u32,
    /// Degrees scaled by 1e7
    pub latitude: i32,
    /// Degrees scaled by 1e7
    pub longitude: i32,
    /// Millimeters
    pub altitude: u32,
    pub satellites: u8,
}

impl Payload for GnssOneShot {
    const TYPE: u8 = 0xBF;
    const HEADER_SIZE: usize = 18;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        GnssOneShot {
            status: GnssFixStatus::from_raw(buf.get_u8()),
            lock_time: buf.get_u32(),
            latitude: buf.get_i32(),
            longitude: buf.get_i32(),
            altitude: buf.get_u32(),
            satellites: buf.get_u8(),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.status.raw());
        buf.put_u32(self.lock_time);
        buf.put_i32(self.latitude);
        buf.put_i32(self.longitude);
        buf.put_u32(self.altitude);
        buf.put_u8(self.satellites);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::Frame;

    #[test]
    fn test_transmit_ip_big_endian_layout() {
        let header = TransmitIp {
            frame_id: 1,
            dest_ip: Ipv4Addr::new(52, 1, 2, 3),
            dest_port: 0x075B,
            source_port: 0,
            protocol: IpProtocol::Tcp,
            options: TransmitOption::NoOptions,
        };
        let frame = Frame::from_payload(&header, b"hi");
        assert_eq!(
            frame.payload(),
            &[1, 52, 1, 2, 3, 0x07, 0x5B, 0, 0, 1, 0, b'h', b'i']
        );

        let (decoded, tail) = frame.decode_as::<TransmitIp>().unwrap();
        assert_eq!(decoded, header);
        assert_eq!(tail, b"hi");
    }

    #[test]
    fn test_at_response_tail() {
        let frame = Frame::new(0x88, vec![0x87, b'A', b'I', 0x00, 0x23]);
        let (response, value) = frame.decode_as::<AtCommandResponse>().unwrap();
        assert_eq!(response.frame_id, 0x87);
        assert_eq!(&response.command, b"AI");
        assert_eq!(response.status, AtStatus::Ok);
        assert_eq!(value, &[0x23]);
    }

    #[test]
    fn test_gnss_one_shot_signed_fields() {
        let header = GnssOneShot {
            status: GnssFixStatus::Ok,
            lock_time: 0x2A00_0001,
            latitude: -337_000_000,
            longitude: 1_512_000_000,
            altitude: 42_000,
            satellites: 9,
        };
        let frame = Frame::from_payload(&header, &[]);
        assert_eq!(frame.payload_size(), GnssOneShot::HEADER_SIZE);
        assert_eq!(&frame.payload()[1..5], &[0x2A, 0x00, 0x00, 0x01]);

        let (decoded, _) = frame.decode_as::<GnssOneShot>().unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_sms_skips_reserved_byte() {
        let mut number = [0u8; PHONE_NUMBER_LEN];
        number[..3].copy_from_slice(b"+15");
        let frame = Frame::from_payload(
            &TransmitSms {
                frame_id: 4,
                phone_number: number,
            },
            b"ping",
        );
        assert_eq!(frame.payload()[1], 0);

        let (decoded, text) = frame.decode_as::<TransmitSms>().unwrap();
        assert_eq!(decoded.frame_id, 4);
        assert_eq!(&decoded.phone_number[..3], b"+15");
        assert_eq!(text, b"ping");
    }

    #[test]
    fn test_nmea_is_all_tail() {
        let frame = Frame::new(GnssNmea::TYPE, b"$GPGGA,".to_vec());
        let (_, tail) = frame.decode_as::<GnssNmea>().unwrap();
        assert_eq!(tail, b"$GPGGA,");
    }
}

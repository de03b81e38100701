use std::fmt;
use std::net::Ipv4Addr;

use bytes::{Buf, BufMut};

use crate::core::FRAME_OVERHEAD;
use super::enums::wire_enum;

/// A fixed-layout frame payload header.
///
/// Each layout has a fixed header followed by an optional tail whose length is
/// whatever remains of the frame payload. Multi-byte header fields are
/// big-endian on the wire; `read_header`/`write_header` go through `bytes`'
/// `Buf`/`BufMut` accessors, which convert to and from native order.
pub trait Payload: Sized {
    /// Frame type byte identifying this layout
    const TYPE: u8;

    /// Header size in bytes, not counting the tail
    const HEADER_SIZE: usize;

    /// Reads a header from a buffer holding at least `HEADER_SIZE` bytes
    fn read_header<B: Buf>(buf: &mut B) -> Self;

    /// Writes exactly `HEADER_SIZE` bytes
    fn write_header<B: BufMut>(&self, buf: &mut B);
}

/// Exact on-wire size of a frame with layout `P` and `extra_size` tail bytes
pub const fn wire_size_of<P: Payload>(extra_size: usize) -> usize {
    P::HEADER_SIZE + extra_size + FRAME_OVERHEAD
}

/// Generic, untyped API frame: a type byte and its payload.
///
/// The default frame has type `0x00`, which no registered layout uses, so it
/// decodes as nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    frame_type: u8,
    payload: Vec<u8>,
}

impl Frame {
    /// Creates a frame from a raw type and payload
    pub fn new(frame_type: u8, payload: impl Into<Vec<u8>>) -> Self {
        Frame {
            frame_type,
            payload: payload.into(),
        }
    }

    /// Builds a frame from a header and tail in one step
    pub fn from_payload<P: Payload>(header: &P, tail: &[u8]) -> Self {
        let mut frame = Frame::default();
        frame.setup_as(header, tail.len()).copy_from_slice(tail);
        frame
    }

    pub fn frame_type(&self) -> u8 {
        self.frame_type
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn payload_size(&self) -> usize {
        self.payload.len()
    }

    /// On-wire size including delimiter, length, type and checksum
    pub fn wire_size(&self) -> usize {
        self.payload.len() + FRAME_OVERHEAD
    }

    /// Resets to the empty frame
    pub fn clear(&mut self) {
        self.frame_type = 0;
        self.payload.clear();
    }

    /// Replaces type and payload, reusing the payload allocation
    pub fn set(&mut self, frame_type: u8, payload: &[u8]) {
        self.frame_type = frame_type;
        self.payload.clear();
        self.payload.extend_from_slice(payload);
    }

    /// Decodes the header as layout `P`, returning it with the tail bytes.
    ///
    /// Returns `None` if the type differs or the payload is shorter than the
    /// header; the tail length is `payload_size - P::HEADER_SIZE`.
    pub fn decode_as<P: Payload>(&self) -> Option<(P, &[u8])> {
        if self.frame_type != P::TYPE || self.payload.len() < P::HEADER_SIZE {
            return None;
        }
        let (mut head, tail) = self.payload.split_at(P::HEADER_SIZE);
        Some((P::read_header(&mut head), tail))
    }

    /// Sets this frame up as layout `P` with `extra_size` zeroed tail bytes,
    /// returning the writable tail.
    pub fn setup_as<P: Payload>(&mut self, header: &P, extra_size: usize) -> &mut [u8] {
        self.frame_type = P::TYPE;
        self.payload.clear();
        header.write_header(&mut self.payload);
        debug_assert_eq!(self.payload.len(), P::HEADER_SIZE);
        self.payload.resize(P::HEADER_SIZE + extra_size, 0);
        &mut self.payload[P::HEADER_SIZE..]
    }

    /// Shrinks the payload to `payload_size` bytes (no-op if already shorter)
    pub fn truncate(&mut self, payload_size: usize) {
        self.payload.truncate(payload_size);
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(0x{:02x}) {} bytes",
            FrameType::from_raw(self.frame_type),
            self.frame_type,
            self.payload.len()
        )
    }
}

wire_enum! {
    /// Registry of the frame types this stack knows how to decode
    pub enum FrameType: u8 {
        AtCommand = 0x08 => "AtCommand",
        AtCommandQueue = 0x09 => "AtCommandQueue",
        TransmitSms = 0x1F => "TransmitSms",
        TransmitIp = 0x20 => "TransmitIp",
        TransmitTls = 0x23 => "TransmitTls",
        FirmwareUpdate = 0x2B => "FirmwareUpdate",
        RelayToInterface = 0x2D => "RelayToInterface",
        GnssRequest = 0x3D => "GnssRequest",
        SocketCreate = 0x40 => "SocketCreate",
        SocketOption = 0x41 => "SocketOption",
        SocketConnect = 0x42 => "SocketConnect",
        SocketClose = 0x43 => "SocketClose",
        SocketSend = 0x44 => "SocketSend",
        SocketSendTo = 0x45 => "SocketSendTo",
        SocketBindListen = 0x46 => "SocketBindListen",
        AtCommandResponse = 0x88 => "AtCommandResponse",
        TransmitStatus = 0x89 => "TransmitStatus",
        ModemStatus = 0x8A => "ModemStatus",
        ReceiveSms = 0x9F => "ReceiveSms",
        FirmwareUpdateResponse = 0xAB => "FirmwareUpdateResponse",
        RelayFromInterface = 0xAD => "RelayFromInterface",
        ReceiveIp = 0xB0 => "ReceiveIp",
        GnssResponse = 0xBD => "GnssResponse",
        GnssNmea = 0xBE => "GnssNmea",
        GnssOneShot = 0xBF => "GnssOneShot",
        SocketCreateResponse = 0xC0 => "SocketCreateResponse",
        SocketOptionResponse = 0xC1 => "SocketOptionResponse",
        SocketConnectResponse = 0xC2 => "SocketConnectResponse",
        SocketCloseResponse = 0xC3 => "SocketCloseResponse",
        SocketBindListenResponse = 0xC6 => "SocketBindListenResponse",
        SocketNewClient = 0xCC => "SocketNewClient",
        SocketReceive = 0xCD => "SocketReceive",
        SocketReceiveFrom = 0xCE => "SocketReceiveFrom",
        SocketStatus = 0xCF => "SocketStatus",
    }
}

pub(crate) fn get_array<const N: usize, B: Buf>(buf: &mut B) -> [u8; N] {
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    out
}

pub(crate) fn get_ipv4<B: Buf>(buf: &mut B) -> Ipv4Addr {
    Ipv4Addr::from(buf.get_u32())
}

pub(crate) fn put_ipv4<B: BufMut>(buf: &mut B, addr: Ipv4Addr) {
    buf.put_u32(u32::from(addr));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::{AtCommand, ModemStatus};
    use crate::protocol::enums::ModemStatusCode;

    #[test]
    fn test_decode_requires_matching_type() {
        let frame = Frame::new(0x8A, vec![0x02]);
        let (status, tail) = frame.decode_as::<ModemStatus>().unwrap();
        assert_eq!(status.status, ModemStatusCode::Registered);
        assert!(tail.is_empty());

        assert!(frame.decode_as::<AtCommand>().is_none());
    }

    #[test]
    fn test_decode_requires_full_header() {
        let frame = Frame::new(AtCommand::TYPE, vec![0x01, b'A']);
        assert!(frame.decode_as::<AtCommand>().is_none());

        let frame = Frame::new(AtCommand::TYPE, vec![0x01, b'A', b'I', 7, 8]);
        let (command, tail) = frame.decode_as::<AtCommand>().unwrap();
        assert_eq!(&command.command, b"AI");
        assert_eq!(tail, &[7, 8]);
    }

    #[test]
    fn test_setup_writes_header_and_tail() {
        let mut frame = Frame::default();
        let tail = frame.setup_as(
            &AtCommand {
                frame_id: 0x81,
                command: *b"AN",
            },
            3,
        );
        assert_eq!(tail.len(), 3);
        tail.copy_from_slice(b"apn");

        assert_eq!(frame.frame_type(), 0x08);
        assert_eq!(frame.payload(), &[0x81, b'A', b'N', b'a', b'p', b'n']);
        assert_eq!(frame.wire_size(), wire_size_of::<AtCommand>(3));
    }

    #[test]
    fn test_wire_size_of() {
        assert_eq!(wire_size_of::<AtCommand>(0), 8);
        assert_eq!(wire_size_of::<ModemStatus>(0), 6);
    }

    #[test]
    fn test_empty_frame_decodes_as_nothing() {
        let frame = Frame::default();
        assert!(frame.decode_as::<ModemStatus>().is_none());
        assert_eq!(FrameType::from_raw(frame.frame_type()), FrameType::Unknown(0));
    }

    #[test]
    fn test_display_names_frame_type() {
        let frame = Frame::new(0xCF, vec![3, 0]);
        assert_eq!(frame.to_string(), "SocketStatus(0xcf) 2 bytes");
    }
}

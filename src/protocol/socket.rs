//! Extended socket API frame layouts (0x40-0x46, 0xC0-0xCF)

use std::net::Ipv4Addr;

use bytes::{Buf, BufMut};

use super::enums::{
    AddressType, BindStatus, CloseStatus, ConnectStatus, CreateStatus, IpProtocol,
    OptionStatus, SocketState,
};
use super::frame::{get_ipv4, put_ipv4, Payload};

/// Request a new socket (0x40)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketCreate {
    pub frame_id: u8,
    pub protocol: IpProtocol,
}

impl Payload for SocketCreate {
    const TYPE: u8 = 0x40;
    const HEADER_SIZE: usize = 2;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        SocketCreate {
            frame_id: buf.get_u8(),
            protocol: IpProtocol::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.protocol.raw());
    }
}

/// Socket create result carrying the modem-assigned socket id (0xC0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketCreateResponse {
    pub frame_id: u8,
    pub socket: u8,
    pub status: CreateStatus,
}

impl Payload for SocketCreateResponse {
    const TYPE: u8 = 0xC0;
    const HEADER_SIZE: usize = 3;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        SocketCreateResponse {
            frame_id: buf.get_u8(),
            socket: buf.get_u8(),
            status: CreateStatus::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.socket);
        buf.put_u8(self.status.raw());
    }
}

/// Read (empty tail) or write (value tail) a socket option (0x41)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketOption {
    pub frame_id: u8,
    pub socket: u8,
    pub option: u8,
}

impl SocketOption {
    /// Option id for the TLS profile used by a TLS socket
    pub const TLS_PROFILE: u8 = 0x00;
}

impl Payload for SocketOption {
    const TYPE: u8 = 0x41;
    const HEADER_SIZE: usize = 3;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        SocketOption {
            frame_id: buf.get_u8(),
            socket: buf.get_u8(),
            option: buf.get_u8(),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.socket);
        buf.put_u8(self.option);
    }
}

/// Socket option result; tail is the current value (0xC1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketOptionResponse {
    pub frame_id: u8,
    pub socket: u8,
    pub option: u8,
    pub status: OptionStatus,
}

impl Payload for SocketOptionResponse {
    const TYPE: u8 = 0xC1;
    const HEADER_SIZE: usize = 4;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        SocketOptionResponse {
            frame_id: buf.get_u8(),
            socket: buf.get_u8(),
            option: buf.get_u8(),
            status: OptionStatus::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.socket);
        buf.put_u8(self.option);
        buf.put_u8(self.status.raw());
    }
}

/// Connect a socket; tail is the address, as text or 4 binary bytes (0x42)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketConnect {
    pub frame_id: u8,
    pub socket: u8,
    pub dest_port: u16,
    pub address_type: AddressType,
}

impl Payload for SocketConnect {
    const TYPE: u8 = 0x42;
    const HEADER_SIZE: usize = 5;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        SocketConnect {
            frame_id: buf.get_u8(),
            socket: buf.get_u8(),
            dest_port: buf.get_u16(),
            address_type: AddressType::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.socket);
        buf.put_u16(self.dest_port);
        buf.put_u8(self.address_type.raw());
    }
}

/// Connect request acknowledgement (0xC2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketConnectResponse {
    pub frame_id: u8,
    pub socket: u8,
    pub status: ConnectStatus,
}

impl Payload for SocketConnectResponse {
    const TYPE: u8 = 0xC2;
    const HEADER_SIZE: usize = 3;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        SocketConnectResponse {
            frame_id: buf.get_u8(),
            socket: buf.get_u8(),
            status: ConnectStatus::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.socket);
        buf.put_u8(self.status.raw());
    }
}

/// Close a socket (0x43)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketClose {
    pub frame_id: u8,
    pub socket: u8,
}

impl Payload for SocketClose {
    const TYPE: u8 = 0x43;
    const HEADER_SIZE: usize = 2;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        SocketClose {
            frame_id: buf.get_u8(),
            socket: buf.get_u8(),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.socket);
    }
}

/// Close result (0xC3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketCloseResponse {
    pub frame_id: u8,
    pub socket: u8,
    pub status: CloseStatus,
}

impl Payload for SocketCloseResponse {
    const TYPE: u8 = 0xC3;
    const HEADER_SIZE: usize = 3;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        SocketCloseResponse {
            frame_id: buf.get_u8(),
            socket: buf.get_u8(),
            status: CloseStatus::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.socket);
        buf.put_u8(self.status.raw());
    }
}

/// Send on a connected socket (0x44); tail is the data.
/// Delivery is reported by a `TransmitStatus` with the same frame id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketSend {
    pub frame_id: u8,
    pub socket: u8,
}

impl Payload for SocketSend {
    const TYPE: u8 = 0x44;
    const HEADER_SIZE: usize = 3;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        let header = SocketSend {
            frame_id: buf.get_u8(),
            socket: buf.get_u8(),
        };
        buf.advance(1); // transmit options, reserved
        header
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.socket);
        buf.put_u8(0);
    }
}

/// Send a datagram on an unconnected socket (0x45); tail is the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketSendTo {
    pub frame_id: u8,
    pub socket: u8,
    pub dest_ip: Ipv4Addr,
    pub dest_port: u16,
}

impl Payload for SocketSendTo {
    const TYPE: u8 = 0x45;
    const HEADER_SIZE: usize = 9;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        let header = SocketSendTo {
            frame_id: buf.get_u8(),
            socket: buf.get_u8(),
            dest_ip: get_ipv4(buf),
            dest_port: buf.get_u16(),
        };
        buf.advance(1); // transmit options, reserved
        header
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.socket);
        put_ipv4(buf, self.dest_ip);
        buf.put_u16(self.dest_port);
        buf.put_u8(0);
    }
}

/// Bind a UDP socket or listen on a TCP socket (0x46)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketBindListen {
    pub frame_id: u8,
    pub socket: u8,
    pub source_port: u16,
}

impl Payload for SocketBindListen {
    const TYPE: u8 = 0x46;
    const HEADER_SIZE: usize = 4;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        SocketBindListen {
            frame_id: buf.get_u8(),
            socket: buf.get_u8(),
            source_port: buf.get_u16(),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.socket);
        buf.put_u16(self.source_port);
    }
}

/// Bind/listen result (0xC6)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketBindListenResponse {
    pub frame_id: u8,
    pub socket: u8,
    pub status: BindStatus,
}

impl Payload for SocketBindListenResponse {
    const TYPE: u8 = 0xC6;
    const HEADER_SIZE: usize = 3;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        SocketBindListenResponse {
            frame_id: buf.get_u8(),
            socket: buf.get_u8(),
            status: BindStatus::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.socket);
        buf.put_u8(self.status.raw());
    }
}

/// Incoming connection accepted on a listening socket (0xCC)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketNewClient {
    pub listen_socket: u8,
    pub client_socket: u8,
    pub remote_ip: Ipv4Addr,
    pub remote_port: u16,
}

impl Payload for SocketNewClient {
    const TYPE: u8 = 0xCC;
    const HEADER_SIZE: usize = 8;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        SocketNewClient {
            listen_socket: buf.get_u8(),
            client_socket: buf.get_u8(),
            remote_ip: get_ipv4(buf),
            remote_port: buf.get_u16(),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.listen_socket);
        buf.put_u8(self.client_socket);
        put_ipv4(buf, self.remote_ip);
        buf.put_u16(self.remote_port);
    }
}

/// Data received on a connected socket (0xCD); tail is the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketReceive {
    pub frame_id: u8,
    pub socket: u8,
}

impl Payload for SocketReceive {
    const TYPE: u8 = 0xCD;
    const HEADER_SIZE: usize = 3;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        let header = SocketReceive {
            frame_id: buf.get_u8(),
            socket: buf.get_u8(),
        };
        buf.advance(1); // status, reserved
        header
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.socket);
        buf.put_u8(0);
    }
}

/// Datagram received on an unconnected socket (0xCE); tail is the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketReceiveFrom {
    pub frame_id: u8,
    pub socket: u8,
    pub source_ip: Ipv4Addr,
    pub source_port: u16,
}

impl Payload for SocketReceiveFrom {
    const TYPE: u8 = 0xCE;
    const HEADER_SIZE: usize = 9;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        let header = SocketReceiveFrom {
            frame_id: buf.get_u8(),
            socket: buf.get_u8(),
            source_ip: get_ipv4(buf),
            source_port: buf.get_u16(),
        };
        buf.advance(1); // status, reserved
        header
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.frame_id);
        buf.put_u8(self.socket);
        put_ipv4(buf, self.source_ip);
        buf.put_u16(self.source_port);
        buf.put_u8(0);
    }
}

/// Unsolicited socket state change (0xCF)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketStatus {
    pub socket: u8,
    pub status: SocketState,
}

impl Payload for SocketStatus {
    const TYPE: u8 = 0xCF;
    const HEADER_SIZE: usize = 2;

    fn read_header<B: Buf>(buf: &mut B) -> Self {
        SocketStatus {
            socket: buf.get_u8(),
            status: SocketState::from_raw(buf.get_u8()),
        }
    }

    fn write_header<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.socket);
        buf.put_u8(self.status.raw());
    }
}

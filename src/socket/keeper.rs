use std::fmt;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::core::{Error, Result, SocketConfig, TransportProtocol, MAX_PAYLOAD};
use crate::protocol::{
    wire_size_of, AddressType, AtCommandResponse, AtStatus, CloseStatus, ConnectStatus,
    CreateStatus, Frame, IpProtocol, ModemStatus, ModemStatusCode, Payload, SocketClose,
    SocketCloseResponse, SocketConnect, SocketConnectResponse, SocketCreate,
    SocketCreateResponse, SocketState, SocketStatus,
};
use crate::radio::Clock;

/// Frame id tagging our socket create requests
pub const CREATE_FRAME_ID: u8 = b'K';

/// Frame id for connect and close requests
pub const REQUEST_FRAME_ID: u8 = 1;

/// Where the keeper is in the socket lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketPhase {
    /// Idle: either connected or waiting to create a socket
    Ready,
    CreateWait,
    Connect,
    ConnectWait,
    Close,
    CloseWait,
}

impl SocketPhase {
    pub fn text(self) -> &'static str {
        match self {
            SocketPhase::Ready => "READY",
            SocketPhase::CreateWait => "CREATE_WAIT",
            SocketPhase::Connect => "CONNECT",
            SocketPhase::ConnectWait => "CONNECT_WAIT",
            SocketPhase::Close => "CLOSE",
            SocketPhase::CloseWait => "CLOSE_WAIT",
        }
    }
}

impl fmt::Display for SocketPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl From<TransportProtocol> for IpProtocol {
    fn from(protocol: TransportProtocol) -> Self {
        match protocol {
            TransportProtocol::Udp => IpProtocol::Udp,
            TransportProtocol::Tcp => IpProtocol::Tcp,
            TransportProtocol::Tls => IpProtocol::Tls,
        }
    }
}

/// Keeps one modem socket connected to a fixed host, recreating it whenever
/// the network or the socket drops.
pub struct SocketKeeper {
    clock: Rc<dyn Clock>,
    host: String,
    port: u16,
    protocol: IpProtocol,
    retry_interval: u64,

    network_up: bool,
    next_retry: u64,
    socket_id: Option<u8>,
    phase: SocketPhase,
}

impl SocketKeeper {
    pub fn new(config: &SocketConfig, clock: Rc<dyn Clock>) -> Result<Self> {
        if config.host.is_empty() {
            return Err(Error::config("Socket host is empty"));
        }
        if config.host.len() > MAX_PAYLOAD - SocketConnect::HEADER_SIZE {
            return Err(Error::config(format!("Socket host too long: {}", config.host.len())));
        }

        info!(
            host = %config.host,
            port = config.port,
            protocol = ?config.protocol,
            "Starting socket keeper"
        );
        Ok(SocketKeeper {
            clock,
            host: config.host.clone(),
            port: config.port,
            protocol: config.protocol.into(),
            retry_interval: config.retry_interval.as_millis() as u64,
            network_up: false,
            next_retry: 0,
            socket_id: None,
            phase: SocketPhase::Ready,
        })
    }

    /// Socket id, only while connected and idle
    pub fn socket(&self) -> Option<u8> {
        match self.phase {
            SocketPhase::Ready => self.socket_id,
            _ => None,
        }
    }

    pub fn phase(&self) -> SocketPhase {
        self.phase
    }

    pub fn network_up(&self) -> bool {
        self.network_up
    }

    /// Closes a connected socket so a fresh one is created
    pub fn reconnect(&mut self) {
        if self.phase == SocketPhase::Ready && self.socket_id.is_some() {
            self.phase = SocketPhase::Close;
        }
    }

    /// Notes that `socket` is being closed by its user; the keeper waits for
    /// the close response instead of handing the socket out again.
    pub fn close_started(&mut self, socket: u8) {
        if self.phase == SocketPhase::Ready && self.socket_id == Some(socket) {
            info!(socket, "Socket closing");
            self.phase = SocketPhase::CloseWait;
        }
    }

    pub fn on_incoming(&mut self, frame: &Frame) {
        if let Some((reply, _)) = frame.decode_as::<SocketCreateResponse>() {
            if self.phase == SocketPhase::CreateWait && reply.frame_id == CREATE_FRAME_ID {
                if reply.status == CreateStatus::Ok {
                    debug!(socket = reply.socket, "Socket created");
                    self.socket_id = Some(reply.socket);
                    self.phase = SocketPhase::Connect;
                } else {
                    warn!(status = %reply.status, "Socket creation failed");
                    self.socket_id = None;
                    self.phase = SocketPhase::Ready;
                }
            }
            return;
        }

        if let Some((reply, _)) = frame.decode_as::<SocketConnectResponse>() {
            if Some(reply.socket) == self.socket_id {
                if reply.status == ConnectStatus::Started {
                    // Wait for a CONNECTED socket status
                    debug!(socket = reply.socket, "Socket connecting");
                } else {
                    warn!(status = %reply.status, "Connection aborted");
                    self.phase = SocketPhase::Close;
                }
            }
            return;
        }

        if let Some((status, _)) = frame.decode_as::<SocketStatus>() {
            if Some(status.socket) == self.socket_id {
                if status.status == SocketState::Connected {
                    info!(socket = status.socket, "Socket connected");
                } else {
                    // The modem closes the socket on any other status
                    warn!(socket = status.socket, status = %status.status, "Connection failed");
                    self.socket_id = None;
                }
                self.phase = SocketPhase::Ready;
            }
            return;
        }

        if let Some((reply, _)) = frame.decode_as::<SocketCloseResponse>() {
            if Some(reply.socket) == self.socket_id && reply.status == CloseStatus::Ok {
                info!(socket = reply.socket, "Socket closed");
                self.socket_id = None;
                self.phase = SocketPhase::Ready;
            }
            return;
        }

        if let Some((modem, _)) = frame.decode_as::<ModemStatus>() {
            self.network_up = modem.status == ModemStatusCode::Registered;
            debug!(status = %modem.status, network_up = self.network_up, "Modem status");
            return;
        }

        if let Some((reply, value)) = frame.decode_as::<AtCommandResponse>() {
            if &reply.command == b"AI" && reply.status == AtStatus::Ok {
                if let [assoc] = value {
                    self.network_up = *assoc == 0x00;
                    debug!(assoc = *assoc, network_up = self.network_up, "Association status");
                }
            }
        }
    }

    /// Builds the request the current phase needs, if it fits in `space` bytes
    pub fn maybe_make_outgoing(&mut self, space: usize, out: &mut Frame) -> bool {
        match self.phase {
            SocketPhase::Ready => {
                if self.socket_id.is_some()
                    || !self.network_up
                    || space < wire_size_of::<SocketCreate>(0)
                {
                    return false;
                }

                let now = self.clock.now_millis();
                if now <= self.next_retry {
                    return false;
                }

                self.next_retry = now + self.retry_interval;
                let header = SocketCreate {
                    frame_id: CREATE_FRAME_ID,
                    protocol: self.protocol,
                };
                out.setup_as(&header, 0);
                self.phase = SocketPhase::CreateWait;
                debug!(protocol = %self.protocol, "Creating socket");
                true
            }

            SocketPhase::Connect => {
                let Some(socket) = self.socket_id else {
                    self.phase = SocketPhase::Ready;
                    return false;
                };
                if space < wire_size_of::<SocketConnect>(self.host.len()) {
                    return false;
                }

                let header = SocketConnect {
                    frame_id: REQUEST_FRAME_ID,
                    socket,
                    dest_port: self.port,
                    address_type: AddressType::Text,
                };
                out.setup_as(&header, self.host.len())
                    .copy_from_slice(self.host.as_bytes());
                self.phase = SocketPhase::ConnectWait;
                info!(socket, host = %self.host, port = self.port, "Connecting socket");
                true
            }

            SocketPhase::Close => {
                let Some(socket) = self.socket_id else {
                    self.phase = SocketPhase::Ready;
                    return false;
                };
                if space < wire_size_of::<SocketClose>(0) {
                    return false;
                }

                let header = SocketClose {
                    frame_id: REQUEST_FRAME_ID,
                    socket,
                };
                out.setup_as(&header, 0);
                self.phase = SocketPhase::CloseWait;
                info!(socket, "Closing socket");
                true
            }

            SocketPhase::CreateWait | SocketPhase::ConnectWait | SocketPhase::CloseWait => false,
        }
    }
}

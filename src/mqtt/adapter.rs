use tracing::{info, trace, warn};

use crate::core::{Error, MqttConfig, Result, MAX_PAYLOAD};
use crate::protocol::{
    wire_size_of, DeliveryStatus, Frame, Payload, SocketClose, SocketCloseResponse,
    SocketReceive, SocketSend, SocketState, SocketStatus, TransmitStatus,
};
use super::engine::{MqttEngine, MqttTransport, PublishedMessage};

/// Frame id tagging the adapter's socket sends
pub const SEND_FRAME_ID: u8 = b'M';

/// Callback receiving every published message from the engine
pub type PublishCallback = Box<dyn FnMut(&PublishedMessage)>;

/// Views of this tick's outgoing and incoming socket data
struct FrameLink<'a> {
    tx: &'a mut [u8],
    written: usize,
    rx: &'a [u8],
    consumed: usize,
}

impl MqttTransport for FrameLink<'_> {
    fn send(&mut self, data: &[u8]) -> usize {
        let count = data.len().min(self.tx.len() - self.written);
        self.tx[self.written..self.written + count].copy_from_slice(&data[..count]);
        self.written += count;
        count
    }

    fn recv(&mut self, buf: &mut [u8]) -> usize {
        let count = buf.len().min(self.rx.len() - self.consumed);
        buf[..count].copy_from_slice(&self.rx[self.consumed..self.consumed + count]);
        self.consumed += count;
        count
    }
}

/// Carries an MQTT engine's byte stream over a modem socket, one socket-send
/// and one socket-receive frame per tick.
pub struct MqttAdapter<E: MqttEngine> {
    engine: E,
    socket_id: Option<u8>,
    on_publish: PublishCallback,
    /// Socket to close once there is room for the request
    pending_close: Option<u8>,
    /// Socket given up since the last `take_abandoned`
    abandoned: Option<u8>,
}

impl<E: MqttEngine> MqttAdapter<E> {
    pub fn new(mut engine: E, config: &MqttConfig, on_publish: PublishCallback) -> Result<Self> {
        if config.tx_buffer == 0 || config.rx_buffer == 0 {
            return Err(Error::config("MQTT buffer sizes must be positive"));
        }
        engine.init(config.tx_buffer, config.rx_buffer);
        Ok(MqttAdapter {
            engine,
            socket_id: None,
            on_publish,
            pending_close: None,
            abandoned: None,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn socket(&self) -> Option<u8> {
        self.socket_id
    }

    /// Socket the adapter gave up on after a failed send, if any since the
    /// last call. Its close request is already queued; whoever owns the
    /// socket must not hand it back.
    pub fn take_abandoned(&mut self) -> Option<u8> {
        self.abandoned.take()
    }

    /// Binds to a socket (or unbinds with `None`), resetting the engine on change
    pub fn use_socket(&mut self, socket: Option<u8>) {
        if socket == self.socket_id {
            return;
        }
        info!(from = ?self.socket_id, to = ?socket, "MQTT socket change");
        self.engine.reinit();
        self.socket_id = socket;
    }

    /// Handles `incoming`, runs one engine step and fills `out` with any data
    /// to send, using at most `space` wire bytes. Returns true if `out` holds
    /// a frame to send.
    pub fn process(&mut self, incoming: &Frame, space: usize, out: &mut Frame) -> bool {
        if let Some(socket) = self.socket_id {
            if let Some((status, _)) = incoming.decode_as::<SocketStatus>() {
                if status.socket == socket && status.status != SocketState::Connected {
                    warn!(socket, status = %status.status, "MQTT socket lost");
                    self.socket_id = None;
                }
            } else if let Some((reply, _)) = incoming.decode_as::<SocketCloseResponse>() {
                if reply.socket == socket {
                    info!(socket, "MQTT socket closed");
                    self.socket_id = None;
                }
            } else if let Some((reply, _)) = incoming.decode_as::<TransmitStatus>() {
                if reply.frame_id == SEND_FRAME_ID && reply.status != DeliveryStatus::Ok {
                    warn!(socket, status = %reply.status, "MQTT send failed, closing socket");
                    self.socket_id = None;
                    self.pending_close = Some(socket);
                    self.abandoned = Some(socket);
                }
            }
        }

        if let Some(socket) = self.pending_close {
            if Self::closed_by(incoming, socket) {
                self.pending_close = None;
            } else if space >= wire_size_of::<SocketClose>(0) {
                let header = SocketClose {
                    frame_id: SEND_FRAME_ID,
                    socket,
                };
                out.setup_as(&header, 0);
                self.pending_close = None;
                return true;
            }
        }

        let capacity = space
            .saturating_sub(wire_size_of::<SocketSend>(0))
            .min(MAX_PAYLOAD - SocketSend::HEADER_SIZE);
        let tx: &mut [u8] = match self.socket_id {
            Some(socket) if capacity > 0 => {
                let header = SocketSend {
                    frame_id: SEND_FRAME_ID,
                    socket,
                };
                out.setup_as(&header, capacity)
            }
            _ => &mut [],
        };

        let rx: &[u8] = match (self.socket_id, incoming.decode_as::<SocketReceive>()) {
            (Some(socket), Some((header, data))) if header.socket == socket => data,
            _ => &[],
        };

        let mut link = FrameLink {
            tx,
            written: 0,
            rx,
            consumed: 0,
        };
        self.engine.sync(&mut link, &mut *self.on_publish);

        let written = link.written;
        let received = link.rx.len();
        let unread = received - link.consumed;
        if unread > 0 {
            warn!(received, unread, "MQTT engine left bytes in frame");
        }

        if written == 0 {
            out.clear();
            return false;
        }

        out.truncate(SocketSend::HEADER_SIZE + written);
        trace!(written, "MQTT data out");
        true
    }

    /// True if `incoming` shows `socket` is already gone
    fn closed_by(incoming: &Frame, socket: u8) -> bool {
        if let Some((status, _)) = incoming.decode_as::<SocketStatus>() {
            return status.socket == socket && status.status != SocketState::Connected;
        }
        if let Some((reply, _)) = incoming.decode_as::<SocketCloseResponse>() {
            return reply.socket == socket;
        }
        false
    }
}

use std::fmt;
use std::rc::Rc;

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace, warn};

use crate::core::{FRAME_OVERHEAD, MAX_PAYLOAD};
use crate::protocol::{ApiCodec, Frame};
use super::clock::Clock;
use super::ring::RingBuffer;
use super::serial::SerialLink;
use super::Radio;

/// Modem factory default line rate
pub const COMMAND_BAUD: u32 = 9600;

/// Line rate used once the modem is configured
pub const API_BAUD: u32 = 115_200;

/// Silence required around "+++" before the modem enters command mode
const GUARD_MILLIS: u64 = 1100;

/// Wait for an "OK" before falling back
const REPLY_TIMEOUT_MILLIS: u64 = 1500;

/// Settle time after asking the modem to change baud
const BAUD_SETTLE_MILLIS: u64 = 100;

/// Bytes buffered in each direction: one maximum-size frame
pub const BUFFER_CAPACITY: usize = MAX_PAYLOAD + FRAME_OVERHEAD;

const OK_REPLY: &[u8] = b"OK\r";

/// Modem bring-up progress; `ApiMode` is the steady state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Start,
    Init9600DelayPlusPlusPlus,
    Init9600ExpectOk,
    InitSwitchTo115200,
    Init115200DelayPlusPlusPlus,
    Init115200ExpectOk,
    InitApiExpectOkOk,
    ApiMode,
}

impl LinkState {
    pub fn text(self) -> &'static str {
        match self {
            LinkState::Start => "START",
            LinkState::Init9600DelayPlusPlusPlus => "INIT_9600_DELAY_PLUSPLUSPLUS",
            LinkState::Init9600ExpectOk => "INIT_9600_EXPECT_OK",
            LinkState::InitSwitchTo115200 => "INIT_SWITCH_TO_115200",
            LinkState::Init115200DelayPlusPlusPlus => "INIT_115200_DELAY_PLUSPLUSPLUS",
            LinkState::Init115200ExpectOk => "INIT_115200_EXPECT_OK",
            LinkState::InitApiExpectOkOk => "INIT_API_EXPECT_OKOK",
            LinkState::ApiMode => "API_MODE",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// XBee modem on a serial link.
///
/// Brings the modem from an unknown baud rate and mode into API mode at
/// 115200 baud, then deframes inbound bytes and drains queued outbound frames
/// as the link accepts them. Every call does a bounded amount of work.
pub struct XBeeRadio<S: SerialLink> {
    serial: S,
    clock: Rc<dyn Clock>,
    codec: ApiCodec,
    state: LinkState,
    state_millis: u64,
    in_buf: BytesMut,
    out_buf: RingBuffer,
    scratch: BytesMut,
}

impl<S: SerialLink> XBeeRadio<S> {
    pub fn new(serial: S, clock: Rc<dyn Clock>) -> Self {
        let state_millis = clock.now_millis();
        XBeeRadio {
            serial,
            clock,
            codec: ApiCodec::new(),
            state: LinkState::Start,
            state_millis,
            in_buf: BytesMut::with_capacity(BUFFER_CAPACITY),
            out_buf: RingBuffer::new(BUFFER_CAPACITY),
            scratch: BytesMut::with_capacity(BUFFER_CAPACITY),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Direct access to the serial link, for passthrough utilities
    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    fn step_handshake(&mut self, now: u64) {
        let elapsed = now.saturating_sub(self.state_millis);
        match self.state {
            LinkState::Start => {
                debug!("XBee radio setup starting");
                self.set_baud(COMMAND_BAUD);
                self.state = LinkState::Init9600DelayPlusPlusPlus;
            }

            LinkState::Init9600DelayPlusPlusPlus => {
                if elapsed > GUARD_MILLIS {
                    debug!("XBee sending +++ at 9600, waiting for OK");
                    self.send_text(b"+++");
                    self.in_buf.clear();
                    self.state = LinkState::Init9600ExpectOk;
                }
            }

            LinkState::Init9600ExpectOk => {
                if self.eat_ok(1) {
                    debug!("XBee got OK to +++ at 9600, switching to 115200");
                    self.send_text(b"ATBD7,AC\r");
                    self.state = LinkState::InitSwitchTo115200;
                } else if elapsed > REPLY_TIMEOUT_MILLIS {
                    debug!("XBee no OK at 9600, trying 115200");
                    self.set_baud(API_BAUD);
                    self.state = LinkState::Init115200DelayPlusPlusPlus;
                }
            }

            LinkState::InitSwitchTo115200 => {
                if elapsed > BAUD_SETTLE_MILLIS {
                    debug!("XBee sending AT at 115200, waiting for OK");
                    self.set_baud(API_BAUD);
                    self.send_text(b"AT\r");
                    self.in_buf.clear();
                    self.state = LinkState::Init115200ExpectOk;
                }
            }

            LinkState::Init115200DelayPlusPlusPlus => {
                if elapsed > GUARD_MILLIS {
                    debug!("XBee sending +++ at 115200, waiting for OK");
                    self.send_text(b"+++");
                    self.in_buf.clear();
                    self.state = LinkState::Init115200ExpectOk;
                }
            }

            LinkState::Init115200ExpectOk => {
                if self.eat_ok(1) {
                    debug!("XBee got OK at 115200, enabling API mode");
                    self.send_text(b"ATAP1,CN\r");
                    self.state = LinkState::InitApiExpectOkOk;
                } else if elapsed > REPLY_TIMEOUT_MILLIS {
                    warn!("XBee no OK at 115200, retrying init");
                    self.set_baud(COMMAND_BAUD);
                    self.state = LinkState::Init9600DelayPlusPlusPlus;
                }
            }

            LinkState::InitApiExpectOkOk => {
                // One OK for ATAP1, one for CN
                if self.eat_ok(2) {
                    debug!("XBee radio running in API mode");
                    self.state = LinkState::ApiMode;
                } else if elapsed > REPLY_TIMEOUT_MILLIS {
                    warn!("XBee no OK for API mode, retrying");
                    self.state = LinkState::Init115200DelayPlusPlusPlus;
                }
            }

            LinkState::ApiMode => {}
        }
    }

    /// Consumes `count` trailing "OK\r" replies if the input ends with them
    fn eat_ok(&mut self, count: usize) -> bool {
        let expected = OK_REPLY.repeat(count);
        if self.in_buf.ends_with(&expected) {
            self.in_buf.clear();
            true
        } else {
            false
        }
    }

    fn set_baud(&mut self, baud: u32) {
        if let Err(e) = self.serial.set_baud(baud) {
            warn!(baud, error = %e, "Failed to set XBee serial baud");
        }
    }

    fn send_text(&mut self, text: &[u8]) {
        match self.serial.write(text) {
            Ok(count) if count < text.len() => {
                warn!(sent = count, size = text.len(), "Short write to XBee in command mode");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to write to XBee"),
        }
    }

    fn fill_input(&mut self) {
        let available = match self.serial.available() {
            Ok(available) => available,
            Err(e) => {
                warn!(error = %e, "Failed to poll XBee serial");
                return;
            }
        };

        // In API mode leave excess input with the link; text replies may
        // overwrite the oldest bytes.
        let want = if self.state == LinkState::ApiMode {
            available.min(BUFFER_CAPACITY - self.in_buf.len())
        } else {
            available
        };
        if want == 0 {
            return;
        }

        let start = self.in_buf.len();
        self.in_buf.resize(start + want, 0);
        match self.serial.read(&mut self.in_buf[start..]) {
            Ok(count) => self.in_buf.truncate(start + count),
            Err(e) => {
                self.in_buf.truncate(start);
                warn!(error = %e, "Failed to read from XBee");
            }
        }

        if self.in_buf.len() > BUFFER_CAPACITY {
            let excess = self.in_buf.len() - BUFFER_CAPACITY;
            self.in_buf.advance(excess);
        }
    }

    fn drain_output(&mut self) {
        let count = self.serial.available_for_write().min(self.out_buf.len());
        if count == 0 {
            return;
        }

        let front = self.out_buf.front_slice();
        let chunk = &front[..count.min(front.len())];
        match self.serial.write(chunk) {
            Ok(written) => self.out_buf.consume(written),
            Err(e) => warn!(error = %e, "Failed to write to XBee"),
        }
    }
}

impl<S: SerialLink> Radio for XBeeRadio<S> {
    fn poll(&mut self) -> Option<Frame> {
        let now = self.clock.now_millis();
        self.fill_input();

        let old_state = self.state;
        self.step_handshake(now);
        if self.state != old_state {
            trace!(from = %old_state, to = %self.state, "XBee link state change");
            self.state_millis = now;
        }

        if self.state != LinkState::ApiMode {
            return None;
        }

        self.drain_output();
        match self.codec.decode(&mut self.in_buf) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to decode XBee input");
                None
            }
        }
    }

    fn enqueue(&mut self, frame: &Frame) {
        if self.state != LinkState::ApiMode {
            warn!(%frame, state = %self.state, "XBee not in API mode, dropping outgoing frame");
            return;
        }

        self.scratch.clear();
        if let Err(e) = Encoder::<&Frame>::encode(&mut self.codec, frame, &mut self.scratch) {
            warn!(error = %e, "Dropping outgoing frame");
            return;
        }

        if !self.out_buf.push_slice(&self.scratch) {
            warn!(
                %frame,
                size = self.scratch.len(),
                space = self.out_buf.available(),
                "Outgoing buffer full, dropping frame"
            );
            return;
        }
        trace!(%frame, "Outgoing frame");
    }

    fn outgoing_space(&self) -> usize {
        if self.state == LinkState::ApiMode {
            self.out_buf.available()
        } else {
            0
        }
    }

    fn is_ready(&self) -> bool {
        self.state == LinkState::ApiMode && self.out_buf.is_empty()
    }

    fn state_text(&self) -> &'static str {
        self.state.text()
    }
}

/// Stand-in for a board without a modem: never ready, never yields frames
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRadio;

impl Radio for NullRadio {
    fn poll(&mut self) -> Option<Frame> {
        None
    }

    fn enqueue(&mut self, frame: &Frame) {
        warn!(%frame, "No radio fitted, dropping outgoing frame");
    }

    fn outgoing_space(&self) -> usize {
        0
    }

    fn is_ready(&self) -> bool {
        false
    }

    fn state_text(&self) -> &'static str {
        "NO_RADIO"
    }
}

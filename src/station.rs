//! Station orchestrator
//!
//! One [`Station::tick`] drains every frame the radio has ready, offers each
//! to the status monitor, the socket keeper and the MQTT adapter in that
//! order, then lets the monitor, the keeper and the MQTT adapter queue at
//! most one frame each.

use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::core::{Config, Result};
use crate::monitor::{Status, StatusMonitor};
use crate::mqtt::{MqttAdapter, MqttEngine, PublishCallback};
use crate::protocol::Frame;
use crate::radio::{Clock, Radio};
use crate::socket::SocketKeeper;

/// Rows the station renders onto its display
pub const DISPLAY_LINES: usize = 5;

const LINE_NAME: usize = 0;
const LINE_RADIO: usize = 1;
const LINE_NETWORK: usize = 2;
const LINE_SIGNAL: usize = 3;
const LINE_SOCKET: usize = 4;

/// A text grid the station writes its status onto
pub trait StatusDisplay {
    fn set_line(&mut self, index: usize, text: &str);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullDisplay;

impl StatusDisplay for NullDisplay {
    fn set_line(&mut self, _index: usize, _text: &str) {}
}

/// Keeps the current lines and logs each one when it changes
#[derive(Debug, Default)]
pub struct LogDisplay {
    lines: Vec<String>,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }
}

impl StatusDisplay for LogDisplay {
    fn set_line(&mut self, index: usize, text: &str) {
        if self.lines.len() <= index {
            self.lines.resize(index + 1, String::new());
        }
        if self.lines[index] != text {
            info!(line = index, "{}", text);
            self.lines[index] = text.to_string();
        }
    }
}

/// The radio stack of one station board
pub struct Station<R: Radio, D: StatusDisplay> {
    name: String,
    radio: R,
    display: D,
    monitor: StatusMonitor,
    keeper: Option<SocketKeeper>,
    mqtt: Option<MqttAdapter<Box<dyn MqttEngine>>>,
    slow_tick: Duration,
    ticks: u64,
}

impl<R: Radio, D: StatusDisplay> Station<R, D> {
    /// Builds the monitor, and the socket keeper if a socket is configured
    pub fn new(config: &Config, radio: R, display: D, clock: Rc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let monitor = StatusMonitor::new(&config.monitor, clock.clone())?;
        let keeper = match &config.socket {
            Some(socket) => Some(SocketKeeper::new(socket, clock)?),
            None => None,
        };

        info!(
            name = %config.station.name,
            socket = keeper.is_some(),
            "Station started"
        );

        Ok(Station {
            name: config.station.name.clone(),
            radio,
            display,
            monitor,
            keeper,
            mqtt: None,
            slow_tick: config.station.slow_tick,
            ticks: 0,
        })
    }

    /// Runs an MQTT engine over the kept socket
    pub fn with_mqtt(
        mut self,
        engine: Box<dyn MqttEngine>,
        config: &Config,
        on_publish: PublishCallback,
    ) -> Result<Self> {
        self.mqtt = Some(MqttAdapter::new(engine, &config.mqtt, on_publish)?);
        Ok(self)
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn monitor(&self) -> &StatusMonitor {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut StatusMonitor {
        &mut self.monitor
    }

    pub fn status(&self) -> &Status {
        self.monitor.status()
    }

    pub fn keeper(&self) -> Option<&SocketKeeper> {
        self.keeper.as_ref()
    }

    pub fn keeper_mut(&mut self) -> Option<&mut SocketKeeper> {
        self.keeper.as_mut()
    }

    pub fn mqtt(&self) -> Option<&MqttAdapter<Box<dyn MqttEngine>>> {
        self.mqtt.as_ref()
    }

    pub fn mqtt_mut(&mut self) -> Option<&mut MqttAdapter<Box<dyn MqttEngine>>> {
        self.mqtt.as_mut()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one pass of the loop. Returns the number of inbound frames handled.
    ///
    /// All buffered inbound frames are handled before anything is sent. The
    /// MQTT engine sees every inbound frame as it is drained, with no room
    /// to send, then gets one more step with the real outgoing space, so it
    /// queues at most one frame per tick like the monitor and the keeper.
    pub fn tick(&mut self) -> usize {
        let started = Instant::now();
        let mut out = Frame::default();

        let mut frames = 0;
        while let Some(frame) = self.radio.poll() {
            frames += 1;
            debug!(frame = %frame, "Incoming");
            self.monitor.on_incoming(&frame);
            if let Some(keeper) = self.keeper.as_mut() {
                keeper.on_incoming(&frame);
            }
            self.run_mqtt(&frame, 0, &mut out);
        }

        if self.monitor.maybe_make_outgoing(self.radio.outgoing_space(), &mut out) {
            self.radio.enqueue(&out);
        }

        if let Some(keeper) = self.keeper.as_mut() {
            if keeper.maybe_make_outgoing(self.radio.outgoing_space(), &mut out) {
                self.radio.enqueue(&out);
            }
        }

        let space = self.radio.outgoing_space();
        if self.run_mqtt(&Frame::default(), space, &mut out) {
            self.radio.enqueue(&out);
        }

        if let Some(mqtt) = self.mqtt.as_mut() {
            mqtt.use_socket(self.keeper.as_ref().and_then(SocketKeeper::socket));
        }

        self.render();
        self.ticks += 1;

        let elapsed = started.elapsed();
        if elapsed > self.slow_tick {
            warn!(
                elapsed_us = elapsed.as_micros() as u64,
                frames,
                "Slow tick"
            );
        }
        frames
    }

    /// One adapter step; a socket the adapter gives up on goes back to the keeper
    fn run_mqtt(&mut self, frame: &Frame, space: usize, out: &mut Frame) -> bool {
        let Some(mqtt) = self.mqtt.as_mut() else {
            return false;
        };
        let produced = mqtt.process(frame, space, out);
        if let Some(socket) = mqtt.take_abandoned() {
            if let Some(keeper) = self.keeper.as_mut() {
                keeper.close_started(socket);
            }
        }
        produced
    }

    fn render(&mut self) {
        let status = self.monitor.status();

        let network = format!("{} {}", status.assoc_text(), status.network_operator);
        let signal = format!(
            "{} {:.0}dBm {:.0}dB",
            status.technology_text(),
            status.received_power,
            status.received_quality
        );
        let socket = match &self.keeper {
            None => "No socket".to_string(),
            Some(keeper) => match keeper.socket() {
                Some(id) => format!("Socket {} {}", id, status.ip_address),
                None => format!("Socket {}", keeper.phase()),
            },
        };

        self.display.set_line(LINE_NAME, &self.name);
        self.display.set_line(LINE_RADIO, &format!("XBee {}", self.radio.state_text()));
        self.display.set_line(LINE_NETWORK, &network);
        self.display.set_line(LINE_SIGNAL, &signal);
        self.display.set_line(LINE_SOCKET, &socket);
    }
}

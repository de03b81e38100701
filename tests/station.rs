//! Drives a whole station against a simulated XBee: command-mode bring-up,
//! status polling, socket setup and MQTT bytes on the socket.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use blub_station::core::{Config, SocketConfig, TransportProtocol};
use blub_station::mqtt::{MqttEngine, MqttTransport, PublishedMessage};
use blub_station::protocol::{
    ApiCodec, AtCommand, AtCommandResponse, AtStatus, ConnectStatus, CreateStatus,
    DeliveryStatus, Frame, IpProtocol, SocketConnect, SocketConnectResponse, SocketCreate,
    SocketCreateResponse, SocketReceive, SocketSend, SocketState, SocketStatus, TransmitStatus,
};
use blub_station::radio::{
    LinkState, ManualClock, Radio, SerialLink, XBeeRadio, API_BAUD, COMMAND_BAUD,
};
use blub_station::{LogDisplay, Result, Station};

const MODEM_SOCKET: u8 = 5;
const CONNECT: &[u8] = b"\x10\x10\x00\x04MQTT\x04\x02\x00\x3c\x00\x04blub";
const CONNACK: &[u8] = b"\x20\x02\x00\x00";

#[derive(Default)]
struct ModemState {
    modem_baud: u32,
    host_baud: u32,
    command_mode: bool,
    api_mode: bool,
    line: Vec<u8>,
    to_host: VecDeque<u8>,
    from_host: BytesMut,
    codec: ApiCodec,
    created: Vec<IpProtocol>,
    connected_to: Option<(String, u16)>,
    socket_data: Vec<u8>,
}

impl ModemState {
    fn execute(&mut self, line: &[u8]) {
        match line {
            b"AT" => self.to_host.extend(b"OK\r"),
            b"ATBD7,AC" => {
                self.to_host.extend(b"OK\r");
                self.modem_baud = API_BAUD;
            }
            b"ATAP1,CN" => {
                self.to_host.extend(b"OK\rOK\r");
                self.command_mode = false;
                self.api_mode = true;
            }
            _ => self.to_host.extend(b"ERROR\r"),
        }
    }

    fn send_frame(&mut self, frame: Frame) {
        let mut buf = BytesMut::new();
        Encoder::<Frame>::encode(&mut self.codec, frame, &mut buf).unwrap();
        self.to_host.extend(buf.iter());
    }

    fn respond(&mut self, frame: &Frame) {
        if let Some((cmd, _)) = frame.decode_as::<AtCommand>() {
            let value: &[u8] = match &cmd.command {
                b"AI" => &[0x00],
                b"MY" => &[10, 0, 0, 7],
                _ => return,
            };
            let header = AtCommandResponse {
                frame_id: cmd.frame_id,
                command: cmd.command,
                status: AtStatus::Ok,
            };
            self.send_frame(Frame::from_payload(&header, value));
        } else if let Some((create, _)) = frame.decode_as::<SocketCreate>() {
            self.created.push(create.protocol);
            let header = SocketCreateResponse {
                frame_id: create.frame_id,
                socket: MODEM_SOCKET,
                status: CreateStatus::Ok,
            };
            self.send_frame(Frame::from_payload(&header, &[]));
        } else if let Some((connect, host)) = frame.decode_as::<SocketConnect>() {
            self.connected_to = Some((String::from_utf8_lossy(host).into_owned(), connect.dest_port));
            let header = SocketConnectResponse {
                frame_id: connect.frame_id,
                socket: connect.socket,
                status: ConnectStatus::Started,
            };
            self.send_frame(Frame::from_payload(&header, &[]));
            let status = SocketStatus {
                socket: connect.socket,
                status: SocketState::Connected,
            };
            self.send_frame(Frame::from_payload(&status, &[]));
        } else if let Some((send, data)) = frame.decode_as::<SocketSend>() {
            self.socket_data.extend_from_slice(data);
            let status = TransmitStatus {
                frame_id: send.frame_id,
                status: DeliveryStatus::Ok,
            };
            self.send_frame(Frame::from_payload(&status, &[]));
            if data.starts_with(&[0x10]) {
                let header = SocketReceive {
                    frame_id: 0,
                    socket: send.socket,
                };
                self.send_frame(Frame::from_payload(&header, CONNACK));
            }
        }
    }
}

/// XBee double: command mode at its current baud, then an API-mode responder
#[derive(Clone)]
struct ModemDouble(Rc<RefCell<ModemState>>);

impl ModemDouble {
    fn new() -> Self {
        ModemDouble(Rc::new(RefCell::new(ModemState {
            modem_baud: COMMAND_BAUD,
            ..Default::default()
        })))
    }
}

impl SerialLink for ModemDouble {
    fn set_baud(&mut self, baud: u32) -> Result<()> {
        self.0.borrow_mut().host_baud = baud;
        Ok(())
    }

    fn available(&mut self) -> Result<usize> {
        Ok(self.0.borrow().to_host.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.0.borrow_mut();
        let count = buf.len().min(state.to_host.len());
        for (slot, byte) in buf.iter_mut().zip(state.to_host.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut guard = self.0.borrow_mut();
        let state = &mut *guard;
        if state.host_baud != state.modem_baud {
            return Ok(data.len());
        }

        if state.api_mode {
            state.from_host.extend_from_slice(data);
            while let Some(frame) = state.codec.decode(&mut state.from_host)? {
                state.respond(&frame);
            }
            return Ok(data.len());
        }

        for &byte in data {
            state.line.push(byte);
            if state.line == b"+++" {
                state.line.clear();
                state.command_mode = true;
                state.to_host.extend(b"OK\r");
            } else if byte == b'\r' {
                let line = std::mem::take(&mut state.line);
                if state.command_mode {
                    state.execute(&line[..line.len() - 1]);
                }
            }
        }
        Ok(data.len())
    }

    fn available_for_write(&mut self) -> usize {
        256
    }
}

/// MQTT engine double: sends CONNECT after every (re)init, records what arrives
#[derive(Default)]
struct EngineLog {
    outbox: Vec<u8>,
    inbox: Vec<u8>,
    inits: usize,
}

struct ConnectEngine(Rc<RefCell<EngineLog>>);

impl MqttEngine for ConnectEngine {
    fn init(&mut self, _tx_buffer: usize, _rx_buffer: usize) {
        self.reinit();
    }

    fn reinit(&mut self) {
        let mut log = self.0.borrow_mut();
        log.outbox = CONNECT.to_vec();
        log.inbox.clear();
        log.inits += 1;
    }

    fn sync(
        &mut self,
        transport: &mut dyn MqttTransport,
        on_publish: &mut dyn FnMut(&PublishedMessage),
    ) {
        let mut log = self.0.borrow_mut();
        let sent = transport.send(&log.outbox);
        log.outbox.drain(..sent);

        let mut buf = [0u8; 16];
        let mut received = false;
        loop {
            let count = transport.recv(&mut buf);
            if count == 0 {
                break;
            }
            log.inbox.extend_from_slice(&buf[..count]);
            received = true;
        }

        if received && log.inbox == CONNACK {
            on_publish(&PublishedMessage {
                topic: "$connack".to_string(),
                ..Default::default()
            });
        }
    }
}

struct Rig {
    station: Station<XBeeRadio<ModemDouble>, LogDisplay>,
    modem: ModemDouble,
    clock: ManualClock,
    engine: Rc<RefCell<EngineLog>>,
    published: Rc<RefCell<Vec<String>>>,
}

impl Rig {
    fn new() -> Self {
        let config = Config {
            socket: Some(SocketConfig {
                host: "broker.blub.net".to_string(),
                port: 1883,
                protocol: TransportProtocol::Tcp,
                retry_interval: Duration::from_secs(3),
            }),
            ..Config::default()
        };

        let clock = ManualClock::new(1_000);
        let modem = ModemDouble::new();
        let radio = XBeeRadio::new(modem.clone(), Rc::new(clock.clone()));

        let engine = Rc::new(RefCell::new(EngineLog::default()));
        let published = Rc::new(RefCell::new(Vec::new()));
        let sink = published.clone();

        let station = Station::new(&config, radio, LogDisplay::new(), Rc::new(clock.clone()))
            .unwrap()
            .with_mqtt(
                Box::new(ConnectEngine(engine.clone())),
                &config,
                Box::new(move |message: &PublishedMessage| {
                    sink.borrow_mut().push(message.topic.clone())
                }),
            )
            .unwrap();

        Rig {
            station,
            modem,
            clock,
            engine,
            published,
        }
    }

    /// Ticks every 10ms of simulated time until `done` or `limit_ticks` run out
    fn run_until(&mut self, limit_ticks: usize, done: impl Fn(&Rig) -> bool) -> bool {
        for _ in 0..limit_ticks {
            self.station.tick();
            if done(self) {
                return true;
            }
            self.clock.advance(10);
        }
        false
    }

    fn connected(&self) -> bool {
        self.station.mqtt().and_then(|mqtt| mqtt.socket()).is_some()
    }
}

#[test]
fn test_bring_up_to_mqtt_connack() {
    let mut rig = Rig::new();
    assert_eq!(rig.station.radio().outgoing_space(), 0);

    assert!(rig.run_until(400, |rig| rig.station.radio().state() == LinkState::ApiMode));
    assert!(rig.modem.0.borrow().api_mode);

    assert!(rig.run_until(200, Rig::connected));
    {
        let modem = rig.modem.0.borrow();
        assert_eq!(modem.created, vec![IpProtocol::Tcp]);
        assert_eq!(
            modem.connected_to,
            Some(("broker.blub.net".to_string(), 1883))
        );
    }
    assert!(rig.station.keeper().unwrap().network_up());
    assert_eq!(rig.station.status().assoc_text(), "CONNECTED");

    assert!(rig.run_until(50, |rig| !rig.published.borrow().is_empty()));
    assert_eq!(rig.modem.0.borrow().socket_data, CONNECT);
    assert_eq!(rig.engine.borrow().inbox, CONNACK);
    assert_eq!(*rig.published.borrow(), vec!["$connack".to_string()]);
}

#[test]
fn test_status_reaches_display() {
    let mut rig = Rig::new();
    assert!(rig.run_until(600, |rig| {
        rig.station.status().ip_address.octets() == [10, 0, 0, 7] && rig.connected()
    }));
    rig.station.tick();

    let display = rig.station.display();
    assert_eq!(display.line(1), Some("XBee API_MODE"));
    assert_eq!(display.line(4), Some("Socket 5 10.0.0.7"));
}

#[test]
fn test_socket_loss_recovers() {
    let mut rig = Rig::new();
    assert!(rig.run_until(600, Rig::connected));
    assert!(rig.run_until(50, |rig| !rig.published.borrow().is_empty()));
    let inits = rig.engine.borrow().inits;

    rig.modem.0.borrow_mut().send_frame(Frame::from_payload(
        &SocketStatus {
            socket: MODEM_SOCKET,
            status: SocketState::ConnectionLost,
        },
        &[],
    ));
    rig.station.tick();
    assert!(!rig.connected());
    assert_ne!(rig.station.keeper().unwrap().socket(), Some(MODEM_SOCKET));

    // A fresh socket after the retry interval, and a fresh CONNECT on it
    assert!(rig.run_until(500, Rig::connected));
    assert_eq!(rig.modem.0.borrow().created.len(), 2);
    assert_eq!(rig.engine.borrow().inits, inits + 1);
    assert!(rig.run_until(50, |rig| rig.published.borrow().len() == 2));

    let expected: Vec<u8> = [CONNECT, CONNECT].concat();
    assert_eq!(rig.modem.0.borrow().socket_data, expected);
}

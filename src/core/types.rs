use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Error, Result};

/// Transport protocol for the kept socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportProtocol {
    Udp,
    Tcp,
    Tls,
}

/// Serial link to the modem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial device path
    pub device: String,
    /// Bytes the host adapter reports as writable per poll
    pub write_chunk: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            device: "/dev/ttyUSB0".to_string(),
            write_chunk: 256,
        }
    }
}

/// Status monitor tuning and modem configuration writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Delay between polls of the same cyclic
    #[serde(serialize_with = "super::serde::serialize_millis")]
    #[serde(deserialize_with = "super::serde::deserialize_millis")]
    pub poll_interval: Duration,
    /// Carrier profile code to write at startup (ATCP)
    pub carrier_profile: Option<u8>,
    /// Access point name to write at startup (ATAN)
    pub apn: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            poll_interval: Duration::from_secs(10),
            carrier_profile: None,
            apn: None,
        }
    }
}

/// Destination kept open by the socket keeper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketConfig {
    /// Host name or dotted address, sent to the modem as text
    pub host: String,
    /// Destination port
    pub port: u16,
    /// Transport protocol
    pub protocol: TransportProtocol,
    /// Minimum delay between socket creation attempts
    #[serde(default = "default_retry_interval")]
    #[serde(serialize_with = "super::serde::serialize_millis")]
    #[serde(deserialize_with = "super::serde::deserialize_millis")]
    pub retry_interval: Duration,
}

fn default_retry_interval() -> Duration {
    Duration::from_secs(3)
}

/// Buffer sizes handed to the MQTT engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Engine transmit buffer size
    pub tx_buffer: usize,
    /// Engine receive buffer size
    pub rx_buffer: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        MqttConfig {
            tx_buffer: 2048,
            rx_buffer: 2048,
        }
    }
}

/// Orchestrator loop timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Delay between ticks
    #[serde(serialize_with = "super::serde::serialize_millis")]
    #[serde(deserialize_with = "super::serde::deserialize_millis")]
    pub tick_interval: Duration,
    /// Ticks slower than this are logged
    #[serde(serialize_with = "super::serde::serialize_millis")]
    #[serde(deserialize_with = "super::serde::deserialize_millis")]
    pub slow_tick: Duration,
    /// Station name shown on the first display line
    pub name: String,
}

impl Default for StationConfig {
    fn default() -> Self {
        StationConfig {
            tick_interval: Duration::from_millis(5),
            slow_tick: Duration::from_millis(5),
            name: "BLUB Station".to_string(),
        }
    }
}

/// Configuration for a BLUB station
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub monitor: MonitorConfig,
    /// Socket to keep open; no socket keeping when absent
    pub socket: Option<SocketConfig>,
    pub mqtt: MqttConfig,
    pub station: StationConfig,
}

impl Config {
    /// Loads a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the config for values the radio stack cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.serial.device.is_empty() {
            return Err(Error::config("Serial device path is empty"));
        }
        if self.serial.write_chunk == 0 {
            return Err(Error::config("Serial write chunk must be nonzero"));
        }
        if self.monitor.poll_interval.is_zero() {
            return Err(Error::config("Poll interval must be nonzero"));
        }
        if let Some(apn) = &self.monitor.apn {
            if apn.is_empty() || apn.len() > super::MAX_APN_LEN {
                return Err(Error::config(format!(
                    "APN must be 1-{} bytes (got {})",
                    super::MAX_APN_LEN,
                    apn.len()
                )));
            }
        }
        if let Some(socket) = &self.socket {
            if socket.host.is_empty() {
                return Err(Error::config("Socket host is empty"));
            }
            if socket.port == 0 {
                return Err(Error::config("Socket port must be nonzero"));
            }
        }
        if self.mqtt.tx_buffer == 0 || self.mqtt.rx_buffer == 0 {
            return Err(Error::config("MQTT buffers must be nonzero"));
        }
        if self.station.tick_interval.is_zero() {
            return Err(Error::config("Tick interval must be nonzero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.monitor.poll_interval, Duration::from_secs(10));
        assert!(config.socket.is_none());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "serial": { "device": "/dev/ttyACM1" },
            "monitor": { "poll_interval": 5000, "apn": "hologram" },
            "socket": { "host": "mqtt.example.com", "port": 1883, "protocol": "tcp" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.serial.device, "/dev/ttyACM1");
        assert_eq!(config.serial.write_chunk, 256);
        assert_eq!(config.monitor.poll_interval, Duration::from_secs(5));

        let socket = config.socket.unwrap();
        assert_eq!(socket.protocol, TransportProtocol::Tcp);
        assert_eq!(socket.retry_interval, Duration::from_secs(3));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.monitor.apn = Some("x".repeat(60));
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.socket = Some(SocketConfig {
            host: String::new(),
            port: 1883,
            protocol: TransportProtocol::Tcp,
            retry_interval: Duration::from_secs(3),
        });
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.mqtt.rx_buffer = 0;
        assert!(config.validate().is_err());
    }
}

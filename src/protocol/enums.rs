//! Code enums carried in frame headers
//!
//! Every enum keeps codes outside its documented set as `Unknown(raw)` so a
//! header always decodes, and every code has a text name for diagnostics.

/// Declares a wire code enum with `from_raw`, `raw` and `text` conversions.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $repr:ty {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal => $text:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// Code outside the documented set
            Unknown($repr),
        }

        impl $name {
            /// Maps a raw wire code
            #[allow(unreachable_patterns)]
            pub fn from_raw(raw: $repr) -> Self {
                match raw {
                    $( $value => $name::$variant, )+
                    other => $name::Unknown(other),
                }
            }

            /// Raw wire code
            pub fn raw(self) -> $repr {
                match self {
                    $( $name::$variant => $value, )+
                    $name::Unknown(raw) => raw,
                }
            }

            /// Diagnostic name, "UNKNOWN" outside the documented set
            pub fn text(self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                    $name::Unknown(_) => "UNKNOWN",
                }
            }
        }

        impl From<$repr> for $name {
            fn from(raw: $repr) -> Self {
                $name::from_raw(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.text())
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum! {
    /// Result of a local AT command
    pub enum AtStatus: u8 {
        Ok = 0 => "OK",
        Error = 1 => "ERROR",
        BadCommand = 2 => "BAD_COMMAND",
        BadParam = 3 => "BAD_PARAM",
    }
}

wire_enum! {
    /// Delivery result reported by a transmit status frame
    pub enum DeliveryStatus: u8 {
        Ok = 0x00 => "OK",
        ConnectionNotFound = 0x20 => "CONNECTION_NOT_FOUND",
        NetworkFailure = 0x21 => "NETWORK_FAILURE",
        NetworkDisconnected = 0x22 => "NETWORK_DISCONNECTED",
        BadFrame = 0x2C => "BAD_FRAME",
        InternalError = 0x31 => "INTERNAL_ERROR",
        ResourceError = 0x32 => "RESOURCE_ERROR",
        MessageTooLong = 0x74 => "MESSAGE_TOO_LONG",
        SocketClosedUnexpectedly = 0x76 => "SOCKET_CLOSED_UNEXPECTEDLY",
        BadUdpPort = 0x78 => "BAD_UDP_PORT",
        BadTcpPort = 0x79 => "BAD_TCP_PORT",
        BadIpAddress = 0x7A => "BAD_IP_ADDRESS",
        BadDataMode = 0x7B => "BAD_DATA_MODE",
        BadInterface = 0x7C => "BAD_INTERFACE",
        InterfaceClosed = 0x7D => "INTERFACE_CLOSED",
        ModemUpdate = 0x7E => "MODEM_UPDATE",
        ConnectionRefused = 0x80 => "CONNECTION_REFUSED",
        ConnectionLost = 0x81 => "CONNECTION_LOST",
        NoServer = 0x82 => "NO_SERVER",
        SocketClosed = 0x83 => "SOCKET_CLOSED",
        UnknownServer = 0x84 => "UNKNOWN_SERVER",
        UnknownError = 0x85 => "UNKNOWN_ERROR",
        BadTlsConfig = 0x86 => "BAD_TLS_CONFIG",
        SocketDisconnected = 0x87 => "SOCKET_DISCONNECTED",
        SocketUnbound = 0x88 => "SOCKET_UNBOUND",
        SocketInactivityTimeout = 0x89 => "SOCKET_INACTIVITY_TIMEOUT",
        NetworkPdpDeactivated = 0x8A => "NETWORK_PDP_DEACTIVATED",
        TlsAuthenticationError = 0x8B => "TLS_AUTHENTICATION_ERROR",
    }
}

wire_enum! {
    /// Unsolicited modem event
    pub enum ModemStatusCode: u8 {
        PowerUp = 0x00 => "POWER_UP",
        WatchdogReset = 0x01 => "WATCHDOG_RESET",
        Registered = 0x02 => "REGISTERED",
        Unregistered = 0x03 => "UNREGISTERED",
        ManagerConnected = 0x0E => "MANAGER_CONNECTED",
        ManagerDisconnected = 0x0F => "MANAGER_DISCONNECTED",
        UpdateStarted = 0x38 => "UPDATE_STARTED",
        UpdateFailed = 0x39 => "UPDATE_FAILED",
        UpdateApplying = 0x3A => "UPDATE_APPLYING",
    }
}

wire_enum! {
    /// IP transport protocol for transmit/receive IP and socket create frames
    pub enum IpProtocol: u8 {
        Udp = 0 => "UDP",
        Tcp = 1 => "TCP",
        Tls = 4 => "TLS",
    }
}

wire_enum! {
    /// Transmit IP option byte
    pub enum TransmitOption: u8 {
        NoOptions = 0 => "NO_OPTIONS",
        CloseSocket = 2 => "CLOSE_SOCKET",
    }
}

wire_enum! {
    /// Relay frame endpoint
    pub enum RelayInterface: u8 {
        SerialPort = 0 => "SERIAL_PORT",
        Ble = 1 => "BLE",
        Python = 2 => "PYTHON",
    }
}

wire_enum! {
    /// Firmware update step result
    pub enum FirmwareStatus: u8 {
        Ok = 0 => "OK",
        InProgress = 2 => "IN_PROGRESS",
        NotStarted = 3 => "NOT_STARTED",
        SequenceError = 4 => "SEQUENCE_ERROR",
        InternalError = 5 => "INTERNAL_ERROR",
        ResourceError = 6 => "RESOURCE_ERROR",
    }
}

wire_enum! {
    /// GNSS request command
    pub enum GnssCommand: u8 {
        StartOneShot = 0 => "START_ONESHOT",
        StopOneShot = 4 => "STOP_ONESHOT",
        StartNmea = 5 => "START_NMEA",
        StopNmea = 6 => "STOP_NMEA",
    }
}

wire_enum! {
    /// GNSS request acknowledgement
    pub enum GnssStatus: u8 {
        Ok = 0 => "OK",
        Error = 1 => "ERROR",
    }
}

wire_enum! {
    /// GNSS one-shot fix result
    pub enum GnssFixStatus: u8 {
        Ok = 0 => "OK",
        Invalid = 1 => "INVALID",
        Timeout = 2 => "TIMEOUT",
        Cancelled = 3 => "CANCELLED",
    }
}

wire_enum! {
    /// Socket create result
    pub enum CreateStatus: u8 {
        Ok = 0x00 => "OK",
        NotRegistered = 0x22 => "NOT_REGISTERED",
        InternalError = 0x31 => "INTERNAL_ERROR",
        ResourceError = 0x32 => "RESOURCE_ERROR",
        BadProtocol = 0x7B => "BAD_PROTOCOL",
        ModemUpdate = 0x7E => "MODEM_UPDATE",
        UnknownError = 0x85 => "UNKNOWN_ERROR",
        BadTlsProfile = 0x86 => "BAD_TLS_PROFILE",
    }
}

wire_enum! {
    /// Socket option result
    pub enum OptionStatus: u8 {
        Ok = 0x00 => "OK",
        BadParam = 0x01 => "BAD_PARAM",
        Failed = 0x02 => "FAILED",
        BadSocket = 0x20 => "BAD_SOCKET",
    }
}

wire_enum! {
    /// Socket connect result; success only means the attempt started
    pub enum ConnectStatus: u8 {
        Started = 0x00 => "STARTED",
        BadAddressType = 0x01 => "BAD_ADDRESS_TYPE",
        BadParam = 0x02 => "BAD_PARAM",
        AlreadyInProgress = 0x03 => "ALREADY_IN_PROGRESS",
        AlreadyConnected = 0x04 => "ALREADY_CONNECTED",
        UnknownError = 0x05 => "UNKNOWN_ERROR",
        BadSocket = 0x20 => "BAD_SOCKET",
    }
}

wire_enum! {
    /// Socket close result
    pub enum CloseStatus: u8 {
        Ok = 0x00 => "OK",
        BadSocket = 0x20 => "BAD_SOCKET",
    }
}

wire_enum! {
    /// Socket bind/listen result
    pub enum BindStatus: u8 {
        Ok = 0x00 => "OK",
        BadPort = 0x01 => "BAD_PORT",
        Error = 0x02 => "ERROR",
        AlreadyBound = 0x03 => "ALREADY_BOUND",
        BadSocket = 0x20 => "BAD_SOCKET",
    }
}

wire_enum! {
    /// Unsolicited socket state; anything but `Connected` means the modem closed it
    pub enum SocketState: u8 {
        Connected = 0x00 => "CONNECTED",
        FailedDns = 0x01 => "FAILED_DNS",
        ConnectionRefused = 0x02 => "CONNECTION_REFUSED",
        TransportClosed = 0x03 => "TRANSPORT_CLOSED",
        TimedOut = 0x04 => "TIMED_OUT",
        InternalError = 0x05 => "INTERNAL_ERROR",
        HostUnreachable = 0x06 => "HOST_UNREACHABLE",
        ConnectionLost = 0x07 => "CONNECTION_LOST",
        UnknownError = 0x08 => "UNKNOWN_ERROR",
        UnknownServer = 0x09 => "UNKNOWN_SERVER",
        ResourceError = 0x0A => "RESOURCE_ERROR",
        ResetByPeer = 0x0B => "RESET_BY_PEER",
        InactivityClosed = 0x0C => "INACTIVITY_CLOSED",
        PdpDeactivated = 0x0D => "PDP_DEACTIVATED",
    }
}

wire_enum! {
    /// How a socket connect frame encodes its destination
    pub enum AddressType: u8 {
        Binary = 0 => "BINARY",
        Text = 1 => "TEXT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_round_trip() {
        assert_eq!(SocketState::from_raw(0x00), SocketState::Connected);
        assert_eq!(SocketState::Connected.raw(), 0x00);
        assert_eq!(CreateStatus::from_raw(0x86), CreateStatus::BadTlsProfile);
        assert_eq!(DeliveryStatus::from_raw(0x8B).text(), "TLS_AUTHENTICATION_ERROR");
        assert_eq!(IpProtocol::Tls.raw(), 4);
    }

    #[test]
    fn test_unknown_codes_default_text() {
        let status = ModemStatusCode::from_raw(0x55);
        assert_eq!(status, ModemStatusCode::Unknown(0x55));
        assert_eq!(status.raw(), 0x55);
        assert_eq!(status.text(), "UNKNOWN");
        assert_eq!(AtStatus::from_raw(9).to_string(), "UNKNOWN");
        assert_eq!(DeliveryStatus::from_raw(0x01).text(), "UNKNOWN");
    }

    #[test]
    fn test_every_documented_delivery_code_has_text() {
        for raw in 0..=u8::MAX {
            let status = DeliveryStatus::from_raw(raw);
            assert_eq!(status.raw(), raw);
            match status {
                DeliveryStatus::Unknown(_) => assert_eq!(status.text(), "UNKNOWN"),
                _ => assert_ne!(status.text(), "UNKNOWN"),
            }
        }
    }
}

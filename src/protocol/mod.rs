//! XBee API protocol implementation
//!
//! This module defines the API frame, its wire codec, the fixed header layouts
//! of every known frame type and the code enums carried in those headers.

pub mod codec;
pub mod enums;
pub mod frame;
pub mod message;
pub mod socket;

pub use self::codec::{checksum, ApiCodec};
pub use self::enums::{
    AddressType, AtStatus, BindStatus, CloseStatus, ConnectStatus, CreateStatus,
    DeliveryStatus, FirmwareStatus, GnssCommand, GnssFixStatus, GnssStatus, IpProtocol,
    ModemStatusCode, OptionStatus, RelayInterface, SocketState, TransmitOption,
};
pub use self::frame::{wire_size_of, Frame, FrameType, Payload};
pub use self::message::{
    AtCommand, AtCommandQueue, AtCommandResponse, FirmwareUpdate, FirmwareUpdateResponse,
    GnssNmea, GnssOneShot, GnssRequest, GnssResponse, ModemStatus, ReceiveIp, ReceiveSms,
    RelayFromInterface, RelayToInterface, TransmitIp, TransmitSms, TransmitStatus, TransmitTls,
};
pub use self::socket::{
    SocketBindListen, SocketBindListenResponse, SocketClose, SocketCloseResponse,
    SocketConnect, SocketConnectResponse, SocketCreate, SocketCreateResponse, SocketNewClient,
    SocketOption, SocketOptionResponse, SocketReceive, SocketReceiveFrom, SocketSend,
    SocketSendTo, SocketStatus,
};

/// An application message delivered by the MQTT engine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: u8,
    pub retain: bool,
    pub packet_id: u16,
}

/// Byte transport the engine reads and writes through during `sync`
pub trait MqttTransport {
    /// Accepts up to `data.len()` bytes, returning how many were taken
    fn send(&mut self, data: &[u8]) -> usize;

    /// Fills up to `buf.len()` bytes, returning how many were available
    fn recv(&mut self, buf: &mut [u8]) -> usize;
}

/// An MQTT client protocol engine driven one `sync` at a time
pub trait MqttEngine {
    /// Sizes the engine's transmit and receive buffers
    fn init(&mut self, tx_buffer: usize, rx_buffer: usize);

    /// Drops connection state and in-flight buffers for a new transport
    fn reinit(&mut self);

    /// Runs one step of the protocol, moving bytes through `transport` and
    /// handing incoming publishes to `on_publish`.
    fn sync(
        &mut self,
        transport: &mut dyn MqttTransport,
        on_publish: &mut dyn FnMut(&PublishedMessage),
    );
}

impl<E: MqttEngine + ?Sized> MqttEngine for Box<E> {
    fn init(&mut self, tx_buffer: usize, rx_buffer: usize) {
        (**self).init(tx_buffer, rx_buffer)
    }

    fn reinit(&mut self) {
        (**self).reinit()
    }

    fn sync(
        &mut self,
        transport: &mut dyn MqttTransport,
        on_publish: &mut dyn FnMut(&PublishedMessage),
    ) {
        (**self).sync(transport, on_publish)
    }
}

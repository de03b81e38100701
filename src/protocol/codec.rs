use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace, warn};

use crate::core::{Error, FRAME_OVERHEAD, MAX_PAYLOAD, START_DELIMITER};
use super::frame::Frame;

/// Checksum over the type byte and payload: 0xFF minus their byte sum
pub fn checksum(frame_type: u8, payload: &[u8]) -> u8 {
    let sum = payload
        .iter()
        .fold(frame_type, |sum, &byte| sum.wrapping_add(byte));
    0xFF - sum
}

/// XBee API mode (AP=1, unescaped) frame codec.
///
/// Wire format: `0x7E len_hi len_lo type payload... checksum`, where the
/// big-endian length covers type and payload.
#[derive(Debug, Clone)]
pub struct ApiCodec {
    max_payload: usize,
}

impl ApiCodec {
    /// Creates a codec accepting payloads up to `MAX_PAYLOAD` bytes
    pub fn new() -> Self {
        Self::with_max_payload(MAX_PAYLOAD)
    }

    /// Creates a codec with a custom payload limit
    pub fn with_max_payload(max_payload: usize) -> Self {
        ApiCodec { max_payload }
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }
}

impl Default for ApiCodec {
    fn default() -> Self {
        ApiCodec::new()
    }
}

impl Decoder for ApiCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            // Discard anything before a start delimiter
            match src.iter().position(|&b| b == START_DELIMITER) {
                Some(0) => {}
                Some(skip) => {
                    trace!(skip, "Discarding bytes before start delimiter");
                    src.advance(skip);
                }
                None => {
                    if !src.is_empty() {
                        trace!(skip = src.len(), "Discarding bytes without start delimiter");
                        src.clear();
                    }
                    return Ok(None);
                }
            }

            if src.len() < 3 {
                // Need more data to read frame length
                return Ok(None);
            }

            let length = u16::from_be_bytes([src[1], src[2]]) as usize;
            if length == 0 || length - 1 > self.max_payload {
                warn!(
                    size = length.saturating_sub(1),
                    max = self.max_payload,
                    "Incoming frame size invalid, resyncing"
                );
                src.advance(1);
                continue;
            }

            // Delimiter, length (x2), type+payload, checksum
            let total = length + 4;
            if src.len() < total {
                return Ok(None);
            }

            let check = src[3..total]
                .iter()
                .fold(0u8, |sum, &byte| sum.wrapping_add(byte));
            if check != 0xFF {
                debug!(check, "Bad incoming checksum (!= 0xFF), resyncing");
                src.advance(1);
                continue;
            }

            let frame_type = src[3];
            let payload = src[4..total - 1].to_vec();
            src.advance(total);

            let frame = Frame::new(frame_type, payload);
            trace!(%frame, "Incoming frame");
            return Ok(Some(frame));
        }
    }
}

impl Encoder<Frame> for ApiCodec {
    type Error = Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&Frame>::encode(self, &item, dst)
    }
}

impl Encoder<&Frame> for ApiCodec {
    type Error = Error;

    fn encode(&mut self, item: &Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let size = item.payload_size();
        if size > self.max_payload {
            return Err(Error::frame(format!(
                "Outgoing {} too big ({} > {})",
                item, size, self.max_payload
            )));
        }

        dst.reserve(size + FRAME_OVERHEAD);
        dst.put_u8(START_DELIMITER);
        dst.put_u16((size + 1) as u16);
        dst.put_u8(item.frame_type());
        dst.extend_from_slice(item.payload());
        dst.put_u8(checksum(item.frame_type(), item.payload()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};

    fn encoded(frame: &Frame) -> BytesMut {
        let mut codec = ApiCodec::new();
        let mut bytes = BytesMut::new();
        codec.encode(frame, &mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_decode_modem_status() {
        let mut codec = ApiCodec::new();
        let mut bytes = BytesMut::from(&[0x7E, 0x00, 0x02, 0x8A, 0x00, 0x75][..]);

        let frame = codec.decode(&mut bytes).unwrap().unwrap();
        assert_eq!(frame.frame_type(), 0x8A);
        assert_eq!(frame.payload(), &[0x00]);
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_encode_at_command() {
        let frame = Frame::new(0x08, vec![0x01, b'N', b'J']);
        assert_eq!(&encoded(&frame)[..], &[0x7E, 0x00, 0x04, 0x08, 0x01, 0x4E, 0x4A, 0x5E]);
    }

    #[test]
    fn test_decode_waits_for_whole_frame() {
        let mut codec = ApiCodec::new();
        let full = encoded(&Frame::new(0xCD, vec![0, 1, 0, 9, 9, 9]));
        let mut bytes = BytesMut::new();
        for &byte in &full[..full.len() - 1] {
            bytes.put_u8(byte);
            assert!(codec.decode(&mut bytes).unwrap().is_none());
        }
        bytes.put_u8(full[full.len() - 1]);
        assert!(codec.decode(&mut bytes).unwrap().is_some());
    }

    #[test]
    fn test_oversized_length_drops_delimiter() {
        let mut codec = ApiCodec::with_max_payload(16);
        let good = encoded(&Frame::new(0x8A, vec![0x02]));
        let mut bytes = BytesMut::from(&[0x7E, 0x01, 0x00][..]);
        bytes.extend_from_slice(&good);

        let frame = codec.decode(&mut bytes).unwrap().unwrap();
        assert_eq!(frame, Frame::new(0x8A, vec![0x02]));
    }

    #[test]
    fn test_bad_checksum_drops_one_byte_only() {
        // A corrupt outer frame whose payload hides a good frame: dropping just
        // the outer delimiter must let the inner one decode.
        let inner = encoded(&Frame::new(0x8A, vec![0x03]));
        let mut outer = encoded(&Frame::new(0x10, inner.to_vec()));
        let last = outer.len() - 1;
        outer[last] ^= 0xFF;

        let mut codec = ApiCodec::new();
        let frame = codec.decode(&mut outer).unwrap().unwrap();
        assert_eq!(frame, Frame::new(0x8A, vec![0x03]));
    }

    #[test]
    fn test_encode_rejects_oversized() {
        let mut codec = ApiCodec::with_max_payload(4);
        let mut bytes = BytesMut::new();
        let result = codec.encode(Frame::new(0x44, vec![0; 5]), &mut bytes);
        assert!(matches!(result, Err(Error::Frame(_))));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_noise_then_frame() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let frame = Frame::new(0xC0, vec![b'K', 2, 0]);
        for _ in 0..50 {
            let noise: Vec<u8> = (0..rng.gen_range(0..200))
                .map(|_| rng.gen_range(0..=0x7D))
                .collect();
            let mut bytes = BytesMut::from(&noise[..]);
            bytes.extend_from_slice(&encoded(&frame));

            let mut codec = ApiCodec::new();
            assert_eq!(codec.decode(&mut bytes).unwrap(), Some(frame.clone()));
            assert_eq!(codec.decode(&mut bytes).unwrap(), None);
            assert!(bytes.is_empty());
        }
    }

    proptest! {
        #[test]
        fn prop_encode_decode_preserves_frame(
            frame_type in any::<u8>(),
            payload in prop::collection::vec(any::<u8>(), 0..MAX_PAYLOAD),
        ) {
            let frame = Frame::new(frame_type, payload);
            let mut bytes = encoded(&frame);
            prop_assert_eq!(bytes.len(), frame.wire_size());

            let mut codec = ApiCodec::new();
            prop_assert_eq!(codec.decode(&mut bytes).unwrap(), Some(frame));
            prop_assert!(bytes.is_empty());
        }

        #[test]
        fn prop_single_bit_flip_is_rejected(
            frame_type in 0u8..0x20,
            payload in prop::collection::vec(0u8..0x20, 0..64),
            bit in any::<prop::sample::Index>(),
        ) {
            // Bytes below 0x20 cannot become a delimiter with one flip
            let frame = Frame::new(frame_type, payload);
            let mut bytes = encoded(&frame);

            // Flip one bit in type, payload or checksum
            let checked = (bytes.len() - 3) * 8;
            let bit = bit.index(checked);
            bytes[3 + bit / 8] ^= 1 << (bit % 8);
            let flipped = bytes.clone();

            let mut codec = ApiCodec::new();
            prop_assert_eq!(codec.decode(&mut bytes).unwrap(), None);

            // Only the delimiter is dropped; scanning resumes at the next one
            let rest = match flipped[1..].iter().position(|&b| b == START_DELIMITER) {
                Some(at) => &flipped[1 + at..],
                None => &[][..],
            };
            prop_assert_eq!(&bytes[..], rest);

            bytes.extend_from_slice(&encoded(&frame));
            prop_assert_eq!(codec.decode(&mut bytes).unwrap(), Some(frame));
        }

        #[test]
        fn prop_noise_then_frame_yields_frame(
            noise in prop::collection::vec(0u8..0x7E, 0..300),
            frame_type in any::<u8>(),
            payload in prop::collection::vec(any::<u8>(), 0..128),
        ) {
            let frame = Frame::new(frame_type, payload);
            let mut bytes = BytesMut::from(&noise[..]);
            bytes.extend_from_slice(&encoded(&frame));

            let mut codec = ApiCodec::new();
            prop_assert_eq!(codec.decode(&mut bytes).unwrap(), Some(frame));
            prop_assert!(bytes.is_empty());
        }
    }
}

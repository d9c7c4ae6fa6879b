//! Tokio codec for native messaging frames

use bytes::{Bytes, BytesMut};
use serde::Serialize;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::frame::{FrameHeader, MAX_PAYLOAD_SIZE};

/// Codec for encoding/decoding native messaging frames
///
/// Decoding yields the raw JSON payload so that a malformed request can be
/// answered with an error response; only a broken frame is a codec error.
/// Encoding accepts anything serializable as JSON.
#[derive(Debug, Default)]
pub struct NativeCodec {
    /// Current header being decoded (if any)
    pending_header: Option<FrameHeader>,
}

impl NativeCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self {
            pending_header: None,
        }
    }
}

impl Decoder for NativeCodec {
    type Item = Bytes;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let header = match self.pending_header.take() {
            Some(h) => h,
            None => match FrameHeader::decode(src) {
                Some(h) => h,
                None => return Ok(None), // Need more data
            },
        };

        let payload_len = header.payload_len();
        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_len,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        if src.len() < payload_len {
            src.reserve(payload_len - src.len());
            self.pending_header = Some(header);
            return Ok(None);
        }

        tracing::trace!("Decoded frame of {} bytes", payload_len);
        Ok(Some(src.split_to(payload_len).freeze()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }

        match self.pending_header.take() {
            Some(header) => Err(ProtocolError::IncompleteFrame {
                expected: header.payload_len(),
                actual: src.len(),
            }),
            // Clean end of input between frames
            None if src.is_empty() => Ok(None),
            None => Err(ProtocolError::IncompleteHeader { actual: src.len() }),
        }
    }
}

impl<T: Serialize> Encoder<T> for NativeCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = serde_json::to_vec(&item)?;
        let payload_len = payload.len();

        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_len,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        FrameHeader::new(payload_len as u32).encode(dst);
        dst.extend_from_slice(&payload);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::HEADER_SIZE;
    use crate::message::{Request, Response};
    use serde_json::json;

    #[test]
    fn test_codec_roundtrip() {
        let mut codec = NativeCodec::new();
        let request = json!({"action": "test_conn", "ssh_target": "user@host"});

        let mut buf = BytesMut::new();
        codec.encode(&request, &mut buf).unwrap();

        let payload_len = buf.len() - HEADER_SIZE;
        assert_eq!(&buf[..HEADER_SIZE], &(payload_len as u32).to_le_bytes());

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(value, request);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_request_and_response_share_framing() {
        let mut codec = NativeCodec::new();

        let mut buf = BytesMut::new();
        codec
            .encode(json!({"action": "read_session", "ssh_target": "h", "remote_path": "/p"}), &mut buf)
            .unwrap();
        codec.encode(Response::empty(), &mut buf).unwrap();

        let request = codec.decode(&mut buf).unwrap().unwrap();
        assert!(matches!(
            Request::from_slice(&request).unwrap(),
            Request::ReadSession { .. }
        ));

        let response = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&response[..], br#"{"status":"empty"}"#);
    }

    #[test]
    fn test_codec_partial_read() {
        let mut codec = NativeCodec::new();

        let mut full_buf = BytesMut::new();
        codec.encode(json!({"action": "interrupt"}), &mut full_buf).unwrap();

        // Header only, payload still in flight
        let mut partial = full_buf.split_to(HEADER_SIZE + 3);
        assert!(codec.decode(&mut partial).unwrap().is_none());

        partial.extend_from_slice(&full_buf);
        let decoded = codec.decode(&mut partial).unwrap().unwrap();
        assert_eq!(&decoded[..], br#"{"action":"interrupt"}"#);
    }

    #[test]
    fn test_eof_between_frames_is_clean() {
        let mut codec = NativeCodec::new();
        let mut buf = BytesMut::new();
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_eof_inside_header() {
        let mut codec = NativeCodec::new();
        let mut buf = BytesMut::from(&[0x10, 0x00][..]);
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(ProtocolError::IncompleteHeader { actual: 2 })
        ));
    }

    #[test]
    fn test_eof_inside_payload() {
        let mut codec = NativeCodec::new();
        let mut buf = BytesMut::from(&[0x0A, 0x00, 0x00, 0x00, b'{', b'"'][..]);
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(ProtocolError::IncompleteFrame {
                expected: 10,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let mut codec = NativeCodec::new();
        let mut buf = BytesMut::from(&u32::MAX.to_le_bytes()[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_empty_payload_frame() {
        let mut codec = NativeCodec::new();
        let mut buf = BytesMut::from(&[0u8; 4][..]);
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert!(decoded.is_empty());
    }

    #[tokio::test]
    async fn test_framed_stream_ends_on_clean_eof() {
        use futures::StreamExt;
        use tokio_util::codec::FramedRead;

        let mut input = BytesMut::new();
        let mut codec = NativeCodec::new();
        codec.encode(json!({"action": "a"}), &mut input).unwrap();
        codec.encode(json!({"action": "b"}), &mut input).unwrap();

        let frames: Vec<_> = FramedRead::new(&input[..], NativeCodec::new())
            .collect()
            .await;
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn test_framed_stream_reports_truncation() {
        use futures::StreamExt;
        use tokio_util::codec::FramedRead;

        let input: &[u8] = &[0x08, 0x00, 0x00, 0x00, b'{'];
        let mut frames = FramedRead::new(input, NativeCodec::new());
        assert!(matches!(
            frames.next().await,
            Some(Err(ProtocolError::IncompleteFrame { expected: 8, actual: 1 }))
        ));
    }
}

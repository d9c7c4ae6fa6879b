//! Frame header encoding/decoding
//!
//! The frame format is the browser native messaging format:
//! - payload_length: 4 bytes (u32, little-endian, native to the browser host)
//! - payload: `payload_length` bytes of UTF-8 JSON

use bytes::{Buf, BufMut, BytesMut};

/// Size of the frame header in bytes
pub const HEADER_SIZE: usize = 4;

/// Maximum accepted payload size (64MB)
///
/// The header can describe up to 4GB; anything past this bound is treated as
/// a corrupted stream rather than buffered.
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;

/// Frame header carrying the payload length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Length of the payload in bytes
    pub payload_length: u32,
}

impl FrameHeader {
    /// Create a new frame header
    pub fn new(payload_length: u32) -> Self {
        Self { payload_length }
    }

    /// Encode the header into a byte buffer
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_SIZE);
        dst.put_u32_le(self.payload_length);
    }

    /// Decode a header from a byte buffer
    ///
    /// Returns None if there aren't enough bytes in the buffer.
    pub fn decode(src: &mut BytesMut) -> Option<Self> {
        if src.len() < HEADER_SIZE {
            return None;
        }

        Some(Self {
            payload_length: src.get_u32_le(),
        })
    }

    /// Payload length as a buffer size
    pub fn payload_len(&self) -> usize {
        self.payload_length as usize
    }
}

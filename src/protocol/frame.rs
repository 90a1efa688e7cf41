//! Frame struct and reply validation.
//!
//! Represents a complete protocol message with header and payload.
//! Uses `bytes::Bytes` so the payload is a zero-copy view into the
//! received datagram.
//!
//! # Example
//!
//! ```
//! use memwire_client::protocol::{build_frame, decode_and_validate, Header, MessageType};
//!
//! let header = Header::new(42, MessageType::ReadMemory, 4);
//! let raw = build_frame(&header, &[0x07, 0x00, 0x00, 0xEB]);
//!
//! let payload = decode_and_validate(raw, 42, MessageType::ReadMemory).unwrap();
//! assert_eq!(&payload[..], &[0x07, 0x00, 0x00, 0xEB]);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::{Header, MessageType, HEADER_SIZE};
use crate::error::InvalidReply;

/// A complete protocol message.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded header.
    pub header: Header,
    /// Bytes that followed the header.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from header and payload.
    pub fn new(header: Header, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Split a raw message into header and trailing payload.
    ///
    /// Only the header structure is checked here; whether the declared
    /// length matches the payload is left to [`Frame::validate_reply`].
    pub fn parse(mut raw: Bytes) -> std::result::Result<Self, InvalidReply> {
        let header = Header::decode(&raw)?;
        let payload = raw.split_off(HEADER_SIZE);
        Ok(Self { header, payload })
    }

    /// Check this frame against the request it is supposed to answer.
    pub fn validate_reply(
        &self,
        expected_request_id: u32,
        expected_type: MessageType,
    ) -> std::result::Result<(), InvalidReply> {
        self.header
            .validate_reply(expected_request_id, expected_type, self.payload.len())
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Get the request ID.
    #[inline]
    pub fn request_id(&self) -> u32 {
        self.header.request_id
    }

    /// Get the message type.
    #[inline]
    pub fn message_type(&self) -> MessageType {
        self.header.message_type
    }

    /// Encode header and payload back into one message.
    pub fn to_bytes(&self) -> Bytes {
        build_frame(&self.header, &self.payload)
    }
}

/// Build a complete message as a single contiguous buffer.
///
/// The header is written as given; callers keep `payload_length` in step
/// with `payload`.
pub fn build_frame(header: &Header, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    buf.put_slice(&header.encode());
    buf.put_slice(payload);
    buf.freeze()
}

/// Parse a raw reply and return its payload if it answers the given request.
///
/// All-or-nothing: any header mismatch yields an error and no payload.
pub fn decode_and_validate(
    raw: Bytes,
    expected_request_id: u32,
    expected_type: MessageType,
) -> std::result::Result<Bytes, InvalidReply> {
    let frame = Frame::parse(raw)?;
    frame.validate_reply(expected_request_id, expected_type)?;
    Ok(frame.payload)
}

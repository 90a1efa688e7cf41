//! Wire format encoding and decoding.
//!
//! Implements the 16-byte header format:
//! ```text
//! ┌──────────┬────────────┬──────────────┬────────────────┐
//! │ Version  │ Request ID │ Message Type │ Payload Length │
//! │ u32 LE   │ u32 LE     │ u32 LE       │ u32 LE         │
//! └──────────┴────────────┴──────────────┴────────────────┘
//! ```
//!
//! All multi-byte integers are Little Endian.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::error::InvalidReply;

/// Header size in bytes (fixed, exactly 16).
pub const HEADER_SIZE: usize = 16;

/// The only protocol version spoken on either side.
pub const CURRENT_VERSION: u32 = 1;

/// Maximum data bytes carried by a single request.
pub const MAX_REQUEST_DATA_SIZE: u32 = 32;

/// Address and size fields that open every read/write request payload.
pub const REQUEST_FIELDS_SIZE: u32 = 8;

/// Largest read a single message may ask for.
pub const MAX_READ_CHUNK: u32 = MAX_REQUEST_DATA_SIZE;

/// Largest write chunk a single message may carry.
pub const MAX_WRITE_CHUNK: u32 = MAX_REQUEST_DATA_SIZE - REQUEST_FIELDS_SIZE;

/// Request/reply discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageType {
    ReadMemory = 1,
    WriteMemory = 2,
}

impl MessageType {
    /// Wire encoding of this message type.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for MessageType {
    type Error = InvalidReply;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::ReadMemory),
            2 => Ok(Self::WriteMemory),
            other => Err(InvalidReply::UnknownMessageType(other)),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadMemory => f.write_str("ReadMemory"),
            Self::WriteMemory => f.write_str("WriteMemory"),
        }
    }
}

/// Decoded header from wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Protocol version (see [`CURRENT_VERSION`]).
    pub version: u32,
    /// Correlation value echoed by the remote.
    pub request_id: u32,
    /// Request type.
    pub message_type: MessageType,
    /// Payload length in bytes.
    pub payload_length: u32,
}

impl Header {
    /// Create a header for the current protocol version.
    pub fn new(request_id: u32, message_type: MessageType, payload_length: u32) -> Self {
        Self {
            version: CURRENT_VERSION,
            request_id,
            message_type,
            payload_length,
        }
    }

    /// Create a request header with a freshly drawn request id.
    pub fn request(message_type: MessageType, payload_length: u32) -> Self {
        Self::new(new_request_id(), message_type, payload_length)
    }

    /// Encode header to bytes (Little Endian).
    ///
    /// # Example
    ///
    /// ```
    /// use memwire_client::protocol::{Header, MessageType};
    ///
    /// let header = Header::new(42, MessageType::ReadMemory, 8);
    /// let bytes = header.encode();
    /// assert_eq!(bytes.len(), 16);
    /// assert_eq!(&bytes[..4], &[1, 0, 0, 0]);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        let mut cursor = &mut buf[..];
        cursor.put_u32_le(self.version);
        cursor.put_u32_le(self.request_id);
        cursor.put_u32_le(self.message_type.as_u32());
        cursor.put_u32_le(self.payload_length);
        buf
    }

    /// Decode a header from the front of `buf` (Little Endian).
    ///
    /// Bytes past the header are ignored. Fails if `buf` is shorter than
    /// [`HEADER_SIZE`] or carries an unknown message type; the version is
    /// returned as-is and checked by reply validation.
    pub fn decode(buf: &[u8]) -> std::result::Result<Self, InvalidReply> {
        let mut cursor = buf
            .get(..HEADER_SIZE)
            .ok_or(InvalidReply::Truncated(buf.len()))?;
        let version = cursor.get_u32_le();
        let request_id = cursor.get_u32_le();
        let message_type = MessageType::try_from(cursor.get_u32_le())?;
        let payload_length = cursor.get_u32_le();
        Ok(Self {
            version,
            request_id,
            message_type,
            payload_length,
        })
    }

    /// Check a reply header against the request it answers.
    ///
    /// `actual_payload_len` is the number of bytes that followed the header.
    pub fn validate_reply(
        &self,
        expected_request_id: u32,
        expected_type: MessageType,
        actual_payload_len: usize,
    ) -> std::result::Result<(), InvalidReply> {
        if self.version != CURRENT_VERSION {
            return Err(InvalidReply::Version {
                expected: CURRENT_VERSION,
                actual: self.version,
            });
        }
        if self.request_id != expected_request_id {
            return Err(InvalidReply::RequestId {
                expected: expected_request_id,
                actual: self.request_id,
            });
        }
        if self.message_type != expected_type {
            return Err(InvalidReply::MessageType {
                expected: expected_type,
                actual: self.message_type,
            });
        }
        if usize::try_from(self.payload_length).ok() != Some(actual_payload_len) {
            return Err(InvalidReply::PayloadLength {
                declared: self.payload_length,
                actual: actual_payload_len,
            });
        }
        Ok(())
    }
}

/// Encode a header from its raw fields (standalone function).
#[inline]
pub fn encode_header(
    version: u32,
    request_id: u32,
    message_type: MessageType,
    payload_length: u32,
) -> [u8; HEADER_SIZE] {
    Header {
        version,
        request_id,
        message_type,
        payload_length,
    }
    .encode()
}

/// Decode a header from bytes (standalone function).
#[inline]
pub fn decode_header(buf: &[u8]) -> std::result::Result<Header, InvalidReply> {
    Header::decode(buf)
}

/// Draw a request id uniformly from the full 32-bit space.
///
/// Only one request is ever outstanding on a channel, so collisions between
/// calls are harmless.
#[inline]
pub fn new_request_id() -> u32 {
    rand::random()
}

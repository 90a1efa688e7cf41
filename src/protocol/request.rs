//! Request payloads for the two memory operations.
//!
//! ```text
//! ReadMemory:  [address u32 LE][size u32 LE]
//! WriteMemory: [address u32 LE][size u32 LE][size bytes of data]
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::frame::build_frame;
use super::wire_format::{Header, MessageType, MAX_READ_CHUNK, MAX_WRITE_CHUNK, REQUEST_FIELDS_SIZE};

/// Payload of a ReadMemory request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    pub address: u32,
    pub size: u32,
}

impl ReadRequest {
    /// Create a read request, clamping `size` to [`MAX_READ_CHUNK`].
    pub fn new(address: u32, size: u32) -> Self {
        Self {
            address,
            size: size.min(MAX_READ_CHUNK),
        }
    }

    /// Encode the payload.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(REQUEST_FIELDS_SIZE as usize);
        buf.put_u32_le(self.address);
        buf.put_u32_le(self.size);
        buf.freeze()
    }

    /// Decode a payload; `None` unless it is exactly the two fields.
    pub fn decode(mut payload: &[u8]) -> Option<Self> {
        if payload.len() != REQUEST_FIELDS_SIZE as usize {
            return None;
        }
        Some(Self {
            address: payload.get_u32_le(),
            size: payload.get_u32_le(),
        })
    }

    /// Build the full message, drawing a fresh request id.
    pub fn to_message(&self) -> (Header, Bytes) {
        let payload = self.encode();
        let header = Header::request(MessageType::ReadMemory, REQUEST_FIELDS_SIZE);
        let message = build_frame(&header, &payload);
        (header, message)
    }
}

/// Payload of a WriteMemory request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub address: u32,
    pub data: Bytes,
}

impl WriteRequest {
    /// Create a write request for the first [`MAX_WRITE_CHUNK`] bytes of
    /// `data` at most.
    pub fn new(address: u32, data: &[u8]) -> Self {
        let len = data.len().min(MAX_WRITE_CHUNK as usize);
        Self {
            address,
            data: Bytes::copy_from_slice(&data[..len]),
        }
    }

    /// Number of data bytes carried.
    #[inline]
    pub fn chunk_size(&self) -> u32 {
        // Bounded by MAX_WRITE_CHUNK at construction.
        self.data.len() as u32
    }

    /// Encode the payload.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(REQUEST_FIELDS_SIZE as usize + self.data.len());
        buf.put_u32_le(self.address);
        buf.put_u32_le(self.chunk_size());
        buf.put_slice(&self.data);
        buf.freeze()
    }

    /// Decode a payload; `None` if the size field disagrees with the data
    /// that follows.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        let mut fields = payload.get(..REQUEST_FIELDS_SIZE as usize)?;
        let address = fields.get_u32_le();
        let size = usize::try_from(fields.get_u32_le()).ok()?;
        let data = payload.get(REQUEST_FIELDS_SIZE as usize..)?;
        if data.len() != size {
            return None;
        }
        Some(Self {
            address,
            data: Bytes::copy_from_slice(data),
        })
    }

    /// Build the full message, drawing a fresh request id.
    pub fn to_message(&self) -> (Header, Bytes) {
        let payload = self.encode();
        let header = Header::request(
            MessageType::WriteMemory,
            REQUEST_FIELDS_SIZE + self.chunk_size(),
        );
        let message = build_frame(&header, &payload);
        (header, message)
    }
}

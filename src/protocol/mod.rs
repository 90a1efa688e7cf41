//! Protocol module - wire format, framing, and request payloads.
//!
//! This module implements the framing layer:
//! - 16-byte header encoding/decoding
//! - Frame struct and reply validation
//! - ReadMemory / WriteMemory request payloads

mod frame;
mod request;
mod wire_format;

pub use frame::{build_frame, decode_and_validate, Frame};
pub use request::{ReadRequest, WriteRequest};
pub use wire_format::{
    decode_header, encode_header, new_request_id, Header, MessageType, CURRENT_VERSION,
    HEADER_SIZE, MAX_READ_CHUNK, MAX_REQUEST_DATA_SIZE, MAX_WRITE_CHUNK, REQUEST_FIELDS_SIZE,
};

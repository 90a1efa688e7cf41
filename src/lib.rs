//! # memwire-client
//!
//! Rust client for the memwire protocol: read and write the memory of a
//! remote process (typically an emulator's scripting endpoint) over a
//! message-oriented channel.
//!
//! ## Architecture
//!
//! - **Framing** (`protocol`): 16-byte little-endian header, request
//!   payloads, reply validation
//! - **Operations** (`Client`): chunked `read_memory` / `write_memory`, one
//!   request in flight at a time
//! - **Transport** (`transport`): blocking send/receive of whole messages,
//!   UDP by default
//!
//! ## Example
//!
//! ```ignore
//! use memwire_client::Client;
//!
//! fn main() -> memwire_client::Result<()> {
//!     let mut client = Client::builder().port(45987).connect()?;
//!     let bytes = client.read_memory(0x100000, 4)?;
//!     println!("{bytes:02x?}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;

mod client;

pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, DEFAULT_ADDRESS, DEFAULT_PORT};
pub use error::{InvalidReply, MemwireError, Result};

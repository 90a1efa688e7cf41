//! Transport module - the message channel under the client.
//!
//! A transport sends one whole message and hands back one whole message.
//! Message boundaries are preserved: `receive` never returns a partial or
//! coalesced message.

mod udp;

use bytes::Bytes;

pub use udp::{UdpTransport, MAX_DATAGRAM_SIZE};

/// Blocking, message-oriented request/reply channel.
pub trait Transport {
    /// Send one complete message.
    fn send(&mut self, message: &[u8]) -> std::io::Result<()>;

    /// Block until one complete message arrives.
    fn receive(&mut self) -> std::io::Result<Bytes>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, message: &[u8]) -> std::io::Result<()> {
        (**self).send(message)
    }

    fn receive(&mut self) -> std::io::Result<Bytes> {
        (**self).receive()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, message: &[u8]) -> std::io::Result<()> {
        (**self).send(message)
    }

    fn receive(&mut self) -> std::io::Result<Bytes> {
        (**self).receive()
    }
}

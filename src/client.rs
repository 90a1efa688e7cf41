//! Client builder and the memory operations.
//!
//! The [`ClientBuilder`] resolves and connects a UDP transport. The
//! [`Client`] runs the request/reply loop for each operation:
//! 1. Build one request for the next chunk
//! 2. Send it and block for exactly one reply
//! 3. Validate the reply against the request
//! 4. Advance, or abort the whole call on any failure
//!
//! # Example
//!
//! ```ignore
//! use memwire_client::Client;
//!
//! let mut client = Client::builder().address("127.0.0.1").port(45987).connect()?;
//!
//! client.write_memory(0x100000, &[0xFF; 4])?;
//! let bytes = client.read_memory(0x100000, 4)?;
//! assert_eq!(bytes, [0xFF; 4]);
//! ```

use std::time::Duration;

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::error::{InvalidReply, MemwireError, Result};
use crate::protocol::{decode_and_validate, MessageType, ReadRequest, WriteRequest, MAX_READ_CHUNK};
use crate::transport::{Transport, UdpTransport};

/// Builder for connecting a client over UDP.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a builder targeting the default endpoint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all settings with `config`.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the remote host.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    /// Set the remote port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Bound every receive by `timeout`.
    ///
    /// Default: block indefinitely.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.config.read_timeout_ms = Some(ms.max(1));
        self
    }

    /// Validate the settings and connect.
    pub fn connect(self) -> Result<Client<UdpTransport>> {
        self.config.validate_strict()?;
        let transport = UdpTransport::connect(
            &self.config.address,
            self.config.port,
            self.config.read_timeout(),
        )?;
        tracing::debug!(
            "Connected memwire client to {}:{}",
            self.config.address,
            self.config.port
        );
        Ok(Client::new(transport))
    }
}

/// Memory client owning one request/reply channel.
///
/// Operations take `&mut self`, so at most one request is ever in flight.
#[derive(Debug)]
pub struct Client<T = UdpTransport> {
    transport: T,
}

impl Client<UdpTransport> {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Connect with the given configuration.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        ClientBuilder::new().config(config).connect()
    }
}

impl<T: Transport> Client<T> {
    /// Wrap an existing transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Read `size` bytes starting at `address`.
    ///
    /// Requests go out in chunks of at most [`MAX_READ_CHUNK`] bytes. The
    /// remote may answer a chunk with fewer bytes than asked; the next
    /// request then starts where the data actually ended. Any failure
    /// discards everything read so far.
    pub fn read_memory(&mut self, address: u32, size: u32) -> Result<Vec<u8>> {
        let mut result = Vec::new();
        let mut address = address;
        let mut remaining = size;

        tracing::debug!("read_memory {:#010x} ({} bytes)", address, size);

        while remaining > 0 {
            let request = ReadRequest::new(address, remaining.min(MAX_READ_CHUNK));
            let (header, message) = request.to_message();
            tracing::trace!(
                "ReadMemory {:#010x} +{} (id {:#010x})",
                request.address,
                request.size,
                header.request_id
            );

            let payload = self.transact(&message, header.request_id, MessageType::ReadMemory)?;
            let received = check_read_len(&payload, request.size)?;

            result.extend_from_slice(&payload);
            address = address.wrapping_add(received);
            remaining -= received;
        }

        Ok(result)
    }

    /// Write `data` starting at `address`.
    ///
    /// Data goes out in chunks that fit the per-message ceiling together
    /// with the address and size fields. Any failure aborts the call; chunks
    /// already acknowledged stay written on the remote.
    pub fn write_memory(&mut self, address: u32, data: &[u8]) -> Result<()> {
        let mut address = address;
        let mut remaining = data;

        tracing::debug!("write_memory {:#010x} ({} bytes)", address, data.len());

        while !remaining.is_empty() {
            let request = WriteRequest::new(address, remaining);
            let (header, message) = request.to_message();
            tracing::trace!(
                "WriteMemory {:#010x} +{} (id {:#010x})",
                request.address,
                request.chunk_size(),
                header.request_id
            );

            // The acknowledgment payload is opaque.
            self.transact(&message, header.request_id, MessageType::WriteMemory)?;

            address = address.wrapping_add(request.chunk_size());
            remaining = &remaining[request.data.len()..];
        }

        Ok(())
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the client and return the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Send one request and validate its single reply.
    fn transact(
        &mut self,
        message: &[u8],
        request_id: u32,
        message_type: MessageType,
    ) -> Result<Bytes> {
        self.transport.send(message)?;
        let raw = self.transport.receive()?;

        decode_and_validate(raw, request_id, message_type).map_err(|e| {
            tracing::warn!(
                "Rejected {} reply for request {:#010x}: {}",
                message_type,
                request_id,
                e
            );
            MemwireError::from(e)
        })
    }
}

/// Length of a validated read reply, which must be within `1..=requested`.
fn check_read_len(payload: &[u8], requested: u32) -> Result<u32> {
    match u32::try_from(payload.len()) {
        Ok(0) => Err(InvalidReply::EmptyRead { requested }.into()),
        Ok(len) if len <= requested => Ok(len),
        _ => Err(InvalidReply::ReadOverrun {
            requested,
            actual: payload.len(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{build_frame, Frame, Header};
    use std::collections::VecDeque;

    /// Replies computed from each request as it is sent.
    struct FnTransport<F> {
        reply: F,
        pending: VecDeque<Bytes>,
        sent: Vec<Frame>,
    }

    impl<F: FnMut(&Frame) -> Bytes> FnTransport<F> {
        fn new(reply: F) -> Self {
            Self {
                reply,
                pending: VecDeque::new(),
                sent: Vec::new(),
            }
        }
    }

    impl<F: FnMut(&Frame) -> Bytes> Transport for FnTransport<F> {
        fn send(&mut self, message: &[u8]) -> std::io::Result<()> {
            let frame = Frame::parse(Bytes::copy_from_slice(message)).unwrap();
            self.pending.push_back((self.reply)(&frame));
            self.sent.push(frame);
            Ok(())
        }

        fn receive(&mut self) -> std::io::Result<Bytes> {
            Ok(self.pending.pop_front().unwrap())
        }
    }

    fn echo_reply(request: &Frame, payload: &[u8]) -> Bytes {
        let header = Header::new(
            request.request_id(),
            request.message_type(),
            payload.len() as u32,
        );
        build_frame(&header, payload)
    }

    #[test]
    fn test_builder_configuration() {
        let builder = Client::builder()
            .address("10.1.1.1")
            .port(9000)
            .read_timeout(Duration::from_millis(1500));

        assert_eq!(builder.config.address, "10.1.1.1");
        assert_eq!(builder.config.port, 9000);
        assert_eq!(builder.config.read_timeout_ms, Some(1500));
    }

    #[test]
    fn test_builder_sub_millisecond_timeout_rounds_up() {
        let builder = ClientBuilder::new().read_timeout(Duration::from_micros(10));
        assert_eq!(builder.config.read_timeout_ms, Some(1));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let err = ClientBuilder::new().port(0).connect().unwrap_err();
        assert!(matches!(err, MemwireError::Config(_)));
    }

    #[test]
    fn test_read_memory_single_chunk() {
        let transport = FnTransport::new(|req: &Frame| echo_reply(req, &[0x07, 0x00, 0x00, 0xEB]));
        let mut client = Client::new(transport);

        let bytes = client.read_memory(0x100000, 4).unwrap();
        assert_eq!(bytes, [0x07, 0x00, 0x00, 0xEB]);

        let sent = &client.transport_mut().sent;
        assert_eq!(sent.len(), 1);
        assert_eq!(
            ReadRequest::decode(sent[0].payload()),
            Some(ReadRequest {
                address: 0x100000,
                size: 4
            })
        );
    }

    #[test]
    fn test_read_memory_zero_size_sends_nothing() {
        let mut client = Client::new(FnTransport::new(|_: &Frame| unreachable!()));
        assert!(client.read_memory(0x1000, 0).unwrap().is_empty());
        assert!(client.into_inner().sent.is_empty());
    }

    #[test]
    fn test_read_memory_short_reply_advances_by_received() {
        // Serve at most 5 bytes per request.
        let transport = FnTransport::new(|req: &Frame| {
            let read = ReadRequest::decode(req.payload()).unwrap();
            let n = read.size.min(5);
            let data: Vec<u8> = (0..n).map(|i| (read.address + i) as u8).collect();
            echo_reply(req, &data)
        });
        let mut client = Client::new(transport);

        let bytes = client.read_memory(0x40, 12).unwrap();
        assert_eq!(bytes, (0x40u8..0x4C).collect::<Vec<_>>());

        let requests: Vec<_> = client
            .into_inner()
            .sent
            .iter()
            .map(|f| ReadRequest::decode(f.payload()).unwrap())
            .collect();
        assert_eq!(
            requests,
            vec![
                ReadRequest {
                    address: 0x40,
                    size: 12
                },
                ReadRequest {
                    address: 0x45,
                    size: 7
                },
                ReadRequest {
                    address: 0x4A,
                    size: 2
                },
            ]
        );
    }

    #[test]
    fn test_read_memory_rejects_empty_reply() {
        let mut client = Client::new(FnTransport::new(|req: &Frame| echo_reply(req, &[])));
        let err = client.read_memory(0, 4).unwrap_err();
        assert!(matches!(
            err,
            MemwireError::InvalidReply(InvalidReply::EmptyRead { requested: 4 })
        ));
    }

    #[test]
    fn test_read_memory_rejects_overrun() {
        let mut client = Client::new(FnTransport::new(|req: &Frame| echo_reply(req, &[0; 5])));
        let err = client.read_memory(0, 4).unwrap_err();
        assert!(matches!(
            err,
            MemwireError::InvalidReply(InvalidReply::ReadOverrun {
                requested: 4,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_read_memory_wraps_address() {
        let transport = FnTransport::new(|req: &Frame| {
            let read = ReadRequest::decode(req.payload()).unwrap();
            echo_reply(req, &vec![0xAA; read.size as usize])
        });
        let mut client = Client::new(transport);

        assert_eq!(client.read_memory(u32::MAX - 3, 40).unwrap().len(), 40);
        let sent = client.into_inner().sent;
        assert_eq!(ReadRequest::decode(sent[1].payload()).unwrap().address, 28);
    }

    #[test]
    fn test_write_memory_empty_sends_nothing() {
        let mut client = Client::new(FnTransport::new(|_: &Frame| unreachable!()));
        client.write_memory(0x1000, &[]).unwrap();
        assert!(client.into_inner().sent.is_empty());
    }

    #[test]
    fn test_write_memory_chunks() {
        let data: Vec<u8> = (0..50).collect();
        let mut client = Client::new(FnTransport::new(|req: &Frame| echo_reply(req, b"")));
        client.write_memory(0x2000, &data).unwrap();

        let writes: Vec<_> = client
            .into_inner()
            .sent
            .iter()
            .map(|f| WriteRequest::decode(f.payload()).unwrap())
            .collect();
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[0].address, 0x2000);
        assert_eq!(writes[1].address, 0x2018);
        assert_eq!(writes[2].address, 0x2030);
        assert_eq!(writes[2].data.len(), 2);
    }

    #[test]
    fn test_write_memory_ack_payload_is_opaque() {
        let mut client = Client::new(FnTransport::new(|req: &Frame| echo_reply(req, b"\x00ok")));
        client.write_memory(0x100000, &[0xFF; 4]).unwrap();
    }

    #[test]
    fn test_failure_stops_further_requests() {
        let mut calls = 0;
        let transport = FnTransport::new(move |req: &Frame| {
            calls += 1;
            if calls == 2 {
                let stale = Header::new(req.request_id() ^ 1, req.message_type(), 0);
                build_frame(&stale, &[])
            } else {
                echo_reply(req, b"")
            }
        });
        let mut client = Client::new(transport);

        let err = client.write_memory(0, &[0u8; 100]).unwrap_err();
        assert!(matches!(
            err,
            MemwireError::InvalidReply(InvalidReply::RequestId { .. })
        ));
        assert_eq!(client.into_inner().sent.len(), 2);
    }

    #[test]
    fn test_check_read_len() {
        assert_eq!(check_read_len(&[0; 3], 4).unwrap(), 3);
        assert_eq!(check_read_len(&[0; 4], 4).unwrap(), 4);
        assert!(check_read_len(&[], 4).is_err());
        assert!(check_read_len(&[0; 5], 4).is_err());
    }
}

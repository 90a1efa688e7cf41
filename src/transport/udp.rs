//! UDP datagram transport.
//!
//! Each protocol message travels as exactly one datagram, so message
//! boundaries come for free. The socket is connected to the remote, which
//! makes the kernel drop datagrams from any other peer.
//!
//! # Example
//!
//! ```ignore
//! use memwire_client::transport::{Transport, UdpTransport};
//!
//! let mut transport = UdpTransport::connect("127.0.0.1", 45987, None)?;
//! transport.send(&message)?;
//! let reply = transport.receive()?;
//! ```

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use bytes::Bytes;

use super::Transport;

/// Largest payload a UDP datagram can carry.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Connected UDP socket speaking one message per datagram.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    recv_buf: Vec<u8>,
}

impl UdpTransport {
    /// Resolve `address:port`, bind an ephemeral local port and connect.
    ///
    /// `read_timeout` bounds each `receive`; `None` blocks indefinitely.
    pub fn connect(address: &str, port: u16, read_timeout: Option<Duration>) -> io::Result<Self> {
        let peer = (address, port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("{address}:{port} did not resolve to any address"),
            )
        })?;

        let local: SocketAddr = match peer {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let socket = UdpSocket::bind(local)?;
        socket.connect(peer)?;
        socket.set_read_timeout(read_timeout)?;

        tracing::debug!("UDP transport {} -> {}", socket.local_addr()?, peer);

        Ok(Self::from_socket(socket))
    }

    /// Wrap an already connected socket.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket,
            recv_buf: vec![0u8; MAX_DATAGRAM_SIZE],
        }
    }

    /// Set the receive timeout; `None` blocks indefinitely.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.socket.set_read_timeout(timeout)
    }

    /// Local socket address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Remote socket address.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.socket.peer_addr()
    }

    /// Get a reference to the underlying socket.
    pub fn inner(&self) -> &UdpSocket {
        &self.socket
    }

    /// Drop every datagram already queued on the socket.
    ///
    /// Anything waiting before a request goes out answers an earlier request
    /// (typically one whose receive timed out). Returns how many were dropped.
    pub fn discard_pending(&mut self) -> io::Result<usize> {
        self.socket.set_nonblocking(true)?;
        let drained = self.drain_queue();
        self.socket.set_nonblocking(false)?;
        drained
    }

    fn drain_queue(&mut self) -> io::Result<usize> {
        let mut dropped = 0;
        loop {
            match self.socket.recv(&mut self.recv_buf) {
                Ok(n) => {
                    dropped += 1;
                    tracing::debug!("Discarded stale {} byte datagram", n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(dropped),
                // Queued ICMP errors from earlier sends.
                Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, message: &[u8]) -> io::Result<()> {
        self.discard_pending()?;
        let sent = self.socket.send(message)?;
        if sent != message.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("datagram truncated: sent {sent} of {} bytes", message.len()),
            ));
        }
        Ok(())
    }

    fn receive(&mut self) -> io::Result<Bytes> {
        let n = self.socket.recv(&mut self.recv_buf)?;
        Ok(Bytes::copy_from_slice(&self.recv_buf[..n]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn loopback_peer() -> UdpSocket {
        UdpSocket::bind("127.0.0.1:0").unwrap()
    }

    #[test]
    fn test_connect_targets_peer() {
        let peer = loopback_peer();
        let port = peer.local_addr().unwrap().port();

        let transport = UdpTransport::connect("127.0.0.1", port, None).unwrap();
        assert_eq!(transport.peer_addr().unwrap(), peer.local_addr().unwrap());
        assert_ne!(transport.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn test_send_and_receive_preserve_boundaries() {
        let peer = loopback_peer();
        let port = peer.local_addr().unwrap().port();
        let mut transport =
            UdpTransport::connect("127.0.0.1", port, Some(Duration::from_secs(5))).unwrap();

        transport.send(b"first").unwrap();
        transport.send(b"second").unwrap();

        let mut buf = [0u8; 64];
        let (n, from) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"first");
        let (n, _) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"second");

        peer.send_to(b"reply one", from).unwrap();
        peer.send_to(b"two", from).unwrap();
        assert_eq!(&transport.receive().unwrap()[..], b"reply one");
        assert_eq!(&transport.receive().unwrap()[..], b"two");
    }

    #[test]
    fn test_receive_times_out() {
        let peer = loopback_peer();
        let port = peer.local_addr().unwrap().port();
        let mut transport =
            UdpTransport::connect("127.0.0.1", port, Some(Duration::from_millis(50))).unwrap();

        let err = transport.receive().unwrap_err();
        assert!(matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        ));
    }

    #[test]
    fn test_late_reply_is_discarded_before_next_send() {
        let peer = loopback_peer();
        let port = peer.local_addr().unwrap().port();
        let mut transport =
            UdpTransport::connect("127.0.0.1", port, Some(Duration::from_millis(50))).unwrap();

        transport.send(b"first").unwrap();
        let mut buf = [0u8; 64];
        let (_, from) = peer.recv_from(&mut buf).unwrap();
        assert!(transport.receive().is_err());

        // The answer to "first" arrives after the client gave up on it.
        peer.send_to(b"late", from).unwrap();
        thread::sleep(Duration::from_millis(50));

        transport.send(b"second").unwrap();
        let (n, _) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"second");
        peer.send_to(b"fresh", from).unwrap();

        assert_eq!(&transport.receive().unwrap()[..], b"fresh");
    }

    #[test]
    fn test_discard_pending_counts_and_restores_blocking() {
        let peer = loopback_peer();
        let port = peer.local_addr().unwrap().port();
        let mut transport = UdpTransport::connect("127.0.0.1", port, None).unwrap();
        transport.inner().send(b"hello").unwrap();

        let mut buf = [0u8; 64];
        let (_, from) = peer.recv_from(&mut buf).unwrap();
        peer.send_to(b"a", from).unwrap();
        peer.send_to(b"b", from).unwrap();
        thread::sleep(Duration::from_millis(50));

        assert_eq!(transport.discard_pending().unwrap(), 2);
        assert_eq!(transport.discard_pending().unwrap(), 0);

        // Back in blocking mode: a receive waits for the timeout instead of
        // failing immediately.
        transport
            .set_read_timeout(Some(Duration::from_millis(100)))
            .unwrap();
        assert_eq!(
            transport.inner().read_timeout().unwrap(),
            Some(Duration::from_millis(100))
        );
        let started = std::time::Instant::now();
        assert!(transport.receive().is_err());
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn test_connect_unresolvable_host() {
        assert!(UdpTransport::connect("host.invalid.", 45987, None).is_err());
    }
}

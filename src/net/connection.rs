//! Per-connection metadata.
//!
//! # Responsibilities
//! - Capture the raw peer address (last-resort client address)
//! - Capture the local address the connection was accepted on
//! - Expose both to handlers through axum's `ConnectInfo`

use std::net::SocketAddr;

use axum::extract::connect_info::Connected;
use axum::serve::IncomingStream;
use tokio::net::TcpListener;

/// Addresses of an accepted client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConnection {
    /// Remote socket address of the client (or the hop in front of us).
    pub peer: SocketAddr,
    /// Local socket address the connection was accepted on.
    pub local: SocketAddr,
}

impl ClientConnection {
    pub fn new(peer: SocketAddr, local: SocketAddr) -> Self {
        Self { peer, local }
    }

    /// Peer IP without the port, as used for `x-forwarded-for`.
    pub fn peer_ip(&self) -> String {
        self.peer.ip().to_string()
    }

    /// Host the connection was resolved to, `ip:port` of the local socket.
    pub fn resolved_host(&self) -> String {
        self.local.to_string()
    }
}

impl Connected<IncomingStream<'_, TcpListener>> for ClientConnection {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        let peer = *stream.remote_addr();
        // A socket without a local address cannot be accepted, but fall back to the peer.
        let local = stream.io().local_addr().unwrap_or(peer);
        Self { peer, local }
    }
}

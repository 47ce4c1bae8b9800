//! Pass-through networking types from the underlying reactor.
//!
//! These aliases exist so the rest of the stack names one stable set of
//! socket, endpoint, and error types regardless of what the reactor calls
//! them. Semantics are unchanged; nothing here wraps or adapts.

/// A connected TCP socket.
pub type Socket = tokio::net::TcpStream;

/// A listening TCP acceptor.
pub type Acceptor = tokio::net::TcpListener;

/// A concrete network address and port.
pub type Endpoint = std::net::SocketAddr;

/// The error-code type used by the reactor's I/O surface.
pub type ErrorCode = std::io::Error;

/// Standard error values, pass-through from the underlying library.
pub mod errc {
    pub use std::io::ErrorKind::*;
}

/// Maximum pending-connection backlog for listen sockets: the platform
/// `SOMAXCONN` where the platform exposes one.
#[cfg(unix)]
pub const MAX_CONNECTIONS: u32 = libc::SOMAXCONN as u32;

/// Maximum pending-connection backlog for listen sockets on platforms
/// without an exposed `SOMAXCONN`.
#[cfg(not(unix))]
pub const MAX_CONNECTIONS: u32 = 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_connections_usable_as_backlog() {
        assert!(MAX_CONNECTIONS > 0);
        assert!(i32::try_from(MAX_CONNECTIONS).is_ok());
    }
}

//! Blocking TCP connection
//!
//! A minimal [`Connection`] over a plain TCP session. Useful on its own for
//! pooling raw sockets to a backend, and as the session type of the bundled
//! load driver.

use super::{Connection, ConnectionParams};
use crate::error::ConnectionError;
use parking_lot::Mutex;
use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, warn};

/// Default port when `port` is not given
const DEFAULT_PORT: u16 = 5432;

/// Default connect timeout when `connect_timeout_ms` is not given
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Socket options applied right after connect
#[derive(Debug, Clone, PartialEq, Eq)]
struct SocketOpts {
    nodelay: bool,
    keepalive_secs: Option<u64>,
}

impl SocketOpts {
    fn from_params(params: &ConnectionParams) -> Result<Self, ConnectionError> {
        Ok(SocketOpts {
            nodelay: params.parse("nodelay")?.unwrap_or(true),
            keepalive_secs: params.parse("keepalive_secs")?,
        })
    }

    fn apply(&self, stream: &TcpStream) -> io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        if let Some(secs) = self.keepalive_secs {
            let socket = socket2::SockRef::from(stream);
            let keepalive = socket2::TcpKeepalive::new().with_time(Duration::from_secs(secs));
            socket.set_tcp_keepalive(&keepalive)?;
        }

        Ok(())
    }
}

/// A pooled TCP session
///
/// Recognised parameters: `host` (required), `port`, `connect_timeout_ms`,
/// `nodelay`, `keepalive_secs`. Anything else is ignored.
#[derive(Debug)]
pub struct TcpConnection {
    /// `None` once closed
    stream: Mutex<Option<TcpStream>>,
    /// Address the session is connected to
    peer: SocketAddr,
}

impl TcpConnection {
    /// Address of the remote end
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn connect(params: &ConnectionParams) -> Result<(TcpStream, SocketAddr), ConnectionError> {
        let host = params.require("host")?;
        let port = params.parse::<u16>("port")?.unwrap_or(DEFAULT_PORT);
        let timeout = params
            .parse::<u64>("connect_timeout_ms")?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT);

        let mut last_err = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok((stream, addr)),
                Err(e) => {
                    debug!("Failed to connect to {}: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        Err(match last_err {
            Some(e) => ConnectionError::Io(e),
            None => ConnectionError::InvalidParams(format!("'{}' did not resolve", host)),
        })
    }
}

impl Connection for TcpConnection {
    fn open(params: &ConnectionParams) -> Result<Self, ConnectionError> {
        let opts = SocketOpts::from_params(params)?;
        let (stream, peer) = Self::connect(params)?;
        opts.apply(&stream)?;

        debug!("TCP connection established to {}", peer);

        Ok(TcpConnection {
            stream: Mutex::new(Some(stream)),
            peer,
        })
    }

    /// Discard any unread bytes left behind by the previous owner
    fn reset(&self) -> Result<(), ConnectionError> {
        let mut guard = self.stream.lock();
        let stream = guard.as_mut().ok_or(ConnectionError::Closed)?;

        stream.set_nonblocking(true)?;
        let mut buf = [0u8; 4096];
        let drained = loop {
            match stream.read(&mut buf) {
                Ok(0) => break Err(ConnectionError::Closed),
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(ConnectionError::Io(e)),
            }
        };
        stream.set_nonblocking(false)?;

        drained
    }

    fn close(&self) {
        if let Some(stream) = self.stream.lock().take() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                warn!("Failed to shut down connection to {}: {}", self.peer, e);
            }
            debug!("Closed TCP connection to {}", self.peer);
        }
    }

    fn is_finished(&self) -> bool {
        let guard = self.stream.lock();
        let Some(stream) = guard.as_ref() else {
            return true;
        };

        if stream.set_nonblocking(true).is_err() {
            return true;
        }
        let mut probe = [0u8; 1];
        let finished = match stream.peek(&mut probe) {
            Ok(0) => true,
            Ok(_) => false,
            Err(e) => e.kind() != io::ErrorKind::WouldBlock,
        };
        let _ = stream.set_nonblocking(false);

        finished
    }
}

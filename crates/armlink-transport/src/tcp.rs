use std::io::ErrorKind;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::LinkStream;

/// TCP transport to the motion controller.
///
/// Both controller channels are plain TCP: connect, then read and write bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport;

impl TcpTransport {
    /// Connect to `addr` (`host:port`), blocking until the OS gives up.
    pub fn connect(addr: &str) -> Result<LinkStream> {
        Self::connect_inner(addr, None)
    }

    /// Connect to `addr`, giving up on each resolved address after `timeout`.
    pub fn connect_timeout(addr: &str, timeout: Duration) -> Result<LinkStream> {
        Self::connect_inner(addr, Some(timeout))
    }

    fn connect_inner(addr: &str, timeout: Option<Duration>) -> Result<LinkStream> {
        let candidates = resolve(addr)?;
        let mut last_err = None;

        for candidate in candidates {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&candidate, timeout),
                None => TcpStream::connect(candidate),
            };
            match attempt {
                Ok(stream) => {
                    // Commands are tiny; don't let Nagle hold them back.
                    stream.set_nodelay(true)?;
                    debug!(%addr, peer = %candidate, "connected to controller");
                    return Ok(LinkStream::from_tcp(stream));
                }
                Err(err) => {
                    debug!(%addr, peer = %candidate, error = %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }

        let err = last_err.unwrap_or_else(|| {
            std::io::Error::new(ErrorKind::AddrNotAvailable, "no socket addresses resolved")
        });
        Err(connect_error(addr, err))
    }
}

fn resolve(addr: &str) -> Result<Vec<SocketAddr>> {
    let resolved = addr
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            addr: addr.to_string(),
            source,
        })?
        .collect::<Vec<_>>();

    if resolved.is_empty() {
        return Err(TransportError::Resolve {
            addr: addr.to_string(),
            source: std::io::Error::new(ErrorKind::AddrNotAvailable, "no socket addresses resolved"),
        });
    }
    Ok(resolved)
}

fn connect_error(addr: &str, source: std::io::Error) -> TransportError {
    if source.kind() == ErrorKind::ConnectionRefused {
        TransportError::ConnectionRefused {
            addr: addr.to_string(),
        }
    } else {
        TransportError::Connect {
            addr: addr.to_string(),
            source,
        }
    }
}

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use tracing::debug;

use crate::error::Result;

/// A connected controller stream. Implements Read + Write.
///
/// This is the fundamental I/O type returned by transport operations.
pub struct LinkStream {
    inner: TcpStream,
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl LinkStream {
    /// Wrap an already connected TCP stream.
    pub fn from_tcp(stream: TcpStream) -> Self {
        Self { inner: stream }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self::from_tcp(cloned))
    }

    /// Address of the connected controller.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner.peer_addr().map_err(Into::into)
    }

    /// Split off a handle that can shut this stream down from another thread.
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        Ok(ShutdownHandle {
            inner: self.inner.try_clone()?,
        })
    }
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkStream")
            .field("peer", &self.inner.peer_addr().ok())
            .finish()
    }
}

/// Aborts a [`LinkStream`] from outside the thread that owns it.
///
/// Shutting down both directions makes a blocked `read` return 0 immediately.
#[derive(Debug)]
pub struct ShutdownHandle {
    inner: TcpStream,
}

impl ShutdownHandle {
    /// Shut down both halves of the stream. Errors from an already closed
    /// socket are ignored.
    pub fn shutdown(&self) {
        if let Err(err) = self.inner.shutdown(Shutdown::Both) {
            debug!(error = %err, "stream shutdown after close");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    fn pair() -> (LinkStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (LinkStream::from_tcp(client), server)
    }

    #[test]
    fn read_write_through_wrapper() {
        let (mut link, mut server) = pair();

        link.write_all(b"ping").unwrap();
        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");

        server.write_all(b"pong").unwrap();
        link.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"pong");
    }

    #[test]
    fn shutdown_handle_unblocks_reader() {
        let (link, _server) = pair();
        let handle = link.shutdown_handle().unwrap();

        let reader = std::thread::spawn(move || {
            let mut link = link;
            let mut buf = [0u8; 16];
            link.read(&mut buf)
        });

        std::thread::sleep(Duration::from_millis(50));
        handle.shutdown();

        let read = reader.join().unwrap().unwrap();
        assert_eq!(read, 0);
    }

    #[test]
    fn try_clone_shares_connection() {
        let (link, mut server) = pair();
        let mut clone = link.try_clone().unwrap();

        clone.write_all(b"x").unwrap();
        let mut buf = [0u8; 1];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"x");
        assert_eq!(
            link.peer_addr().unwrap(),
            clone.peer_addr().unwrap()
        );
    }
}

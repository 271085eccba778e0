use std::io::ErrorKind;
use std::time::Duration;

use armlink_frame::FrameError;

/// Errors that can occur on the command and telemetry channels.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] armlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The command was rejected before anything was sent.
    #[error("invalid command: {0}")]
    Command(#[from] armlink_command::CommandError),

    /// The controller ended the stream.
    #[error("connection closed by controller")]
    ConnectionClosed,

    /// The connection was reset or aborted.
    #[error("connection reset: {0}")]
    ConnectionReset(std::io::Error),

    /// No response arrived in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// A previous exchange failed mid-request; the channel must be reconnected.
    #[error("command channel is broken by an earlier fault; reconnect")]
    Broken,

    /// A stop was requested.
    #[error("stopped")]
    Stopped,
}

impl PeerError {
    /// Short class name for logs.
    pub fn class(&self) -> &'static str {
        match self {
            PeerError::Transport(armlink_transport::TransportError::ConnectionRefused { .. }) => {
                "connection_refused"
            }
            PeerError::Transport(_) => "transport",
            PeerError::Frame(_) => "frame",
            PeerError::Command(_) => "command",
            PeerError::ConnectionClosed => "connection_closed",
            PeerError::ConnectionReset(_) => "connection_reset",
            PeerError::Timeout(_) => "timeout",
            PeerError::Broken => "broken",
            PeerError::Stopped => "stopped",
        }
    }

    /// Map a raw read/write fault to its class.
    pub(crate) fn from_io(err: std::io::Error, timeout: Option<Duration>) -> Self {
        match err.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => {
                PeerError::Timeout(timeout.unwrap_or_default())
            }
            ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => {
                PeerError::ConnectionReset(err)
            }
            ErrorKind::UnexpectedEof => PeerError::ConnectionClosed,
            _ => PeerError::Transport(err.into()),
        }
    }

    /// Lift a frame error, pulling connection faults out of `Io`.
    pub(crate) fn from_frame(err: FrameError, timeout: Option<Duration>) -> Self {
        match err {
            FrameError::ConnectionClosed => PeerError::ConnectionClosed,
            FrameError::Io(io) => Self::from_io(io, timeout),
            other => PeerError::Frame(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, PeerError>;

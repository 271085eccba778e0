//! Controller peers: the command channel and the telemetry stream.
//!
//! [`CommandChannel`] is strictly request/response, one command at a time.
//! [`TelemetryClient`] runs on its own thread, reconnecting forever with a
//! fixed delay until stopped. The two share nothing.

pub mod command;
pub mod error;
pub mod telemetry;

pub use command::{CommandChannel, CommandChannelConfig, DEFAULT_COMMAND_PORT};
pub use error::{PeerError, Result};
pub use telemetry::{
    ChunkSink, Connect, ConnectionState, RunSummary, StopHandle, TcpConnector, TelemetryClient,
    TelemetryConfig, DEFAULT_LOG_PORT, DEFAULT_READ_CHUNK_SIZE, DEFAULT_RECONNECT_DELAY,
};

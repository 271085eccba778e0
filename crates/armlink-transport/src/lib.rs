//! TCP transport for armlink.
//!
//! The motion controller exposes two plain TCP listeners: a command port and a
//! telemetry (log) port. This crate resolves and connects to them and hands
//! back a [`LinkStream`], the `Read + Write` type everything else builds on.
//!
//! A [`ShutdownHandle`] can be split off a stream so another thread can abort
//! a blocked read.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::{LinkStream, ShutdownHandle};
pub use tcp::TcpTransport;

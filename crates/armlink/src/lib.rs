//! Command and telemetry clients for TCP motion controllers.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP connect and stream shutdown
//! - [`frame`]: `#`-terminated message framing
//! - [`command`]: Command intents and the `|`-delimited wire encoding
//! - [`telemetry`]: Log line routing, structured extraction, render classes
//! - [`peer`]: Command channel and reconnecting telemetry client

/// Re-export transport types.
pub mod transport {
    pub use armlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use armlink_frame::*;
}

/// Re-export command types.
pub mod command {
    pub use armlink_command::*;
}

/// Re-export telemetry pipeline types.
pub mod telemetry {
    pub use armlink_telemetry::*;
}

/// Re-export peer types.
pub mod peer {
    pub use armlink_peer::*;
}

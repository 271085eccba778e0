//! Terminator-delimited message framing.
//!
//! Every message on the controller command channel is ASCII text ended by a
//! single `#`. There is no length prefix and no escaping, so the terminator
//! must never appear inside a payload.
//!
//! [`FrameReader`] buffers partial reads until the terminator arrives;
//! callers always get complete frames.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, TERMINATOR};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;

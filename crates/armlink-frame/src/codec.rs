use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame terminator: `#` (0x23).
pub const TERMINATOR: u8 = b'#';

/// Default maximum payload size: 64 KiB.
///
/// Controller commands and responses are a few hundred bytes at most.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024;

/// A complete message, terminator stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (payload + terminator).
    pub fn wire_size(&self) -> usize {
        self.payload.len() + 1
    }

    /// The frame as it appeared on the wire, terminator included.
    pub fn to_wire(&self) -> Bytes {
        let mut wire = BytesMut::with_capacity(self.wire_size());
        wire.put_slice(&self.payload);
        wire.put_u8(TERMINATOR);
        wire.freeze()
    }

    /// Payload as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────────────────┬──────┐
/// │ Payload (ASCII, no '#')      │ '#'  │
/// └──────────────────────────────┴──────┘
/// ```
///
/// A payload that already ends with the terminator is written as-is. The
/// terminator anywhere else is rejected, since it would split the frame.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let body = payload.strip_suffix(&[TERMINATOR]).unwrap_or(payload);
    if let Some(offset) = body.iter().position(|&b| b == TERMINATOR) {
        return Err(FrameError::TerminatorInPayload { offset });
    }

    dst.reserve(body.len() + 1);
    dst.put_slice(body);
    dst.put_u8(TERMINATOR);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a terminator yet.
/// On success, consumes the frame bytes (terminator included) from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    let Some(end) = src.iter().position(|&b| b == TERMINATOR) else {
        if src.len() > max_payload {
            return Err(FrameError::PayloadTooLarge {
                size: src.len(),
                max: max_payload,
            });
        }
        return Ok(None); // Need more data
    };

    if end > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: end,
            max: max_payload,
        });
    }

    let mut wire = src.split_to(end + 1);
    wire.truncate(end);
    Ok(Some(Frame {
        payload: wire.freeze(),
    }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 64 KiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

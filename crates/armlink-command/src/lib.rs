//! Command intent model and wire encoding for the controller command channel.
//!
//! A command is one line of ten `|`-separated slots:
//!
//! ```text
//! ACTION|NUM_POINTS|POINTS|IO_POINT|IO_PIN|IO_STATE|TOOL|BASE|SPEED|ID
//! ```
//!
//! Point components are joined by `;` and points by `,`. The frame layer
//! appends the `#` terminator. Unused slots are left empty.
//!
//! Encoding is pure: validation failures are reported before anything
//! touches the network.

pub mod action;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod intent;
pub mod response;
pub mod wire;

pub use action::{ActionCode, CommandCategory, MotionFamily};
pub use decoder::{decode_command, DecodedCommand, IoFields};
pub use encoder::{AngleUnit, CommandEncoder, EncoderConfig};
pub use error::{CommandError, Result};
pub use intent::{CommandId, CommandIntent, IoCommand, MotionCommand, Point, PointKind, SubroutineCall};
pub use response::{Response, ResponseStatus};

use crate::wire::Slot;

/// Errors raised while encoding or decoding command payloads.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// A point has neither 6 (cartesian) nor 7 (joint) components.
    #[error("point {index} has {len} components (expected 6 or 7)")]
    InvalidPointArity { index: usize, len: usize },

    /// The command id is empty.
    #[error("command id is empty")]
    EmptyCommandId,

    /// A motion command carries no points.
    #[error("motion command has no points")]
    EmptyPoints,

    /// Joint and cartesian points are mixed, or disagree with the joint-space flag.
    #[error("point {index} is {found}, command is {expected}")]
    PointKindMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// Speed fraction outside 0.0..=1.0.
    #[error("speed {0} outside 0.0..=1.0")]
    SpeedOutOfRange(f64),

    /// A point component is NaN or infinite.
    #[error("point {index} component {component} is not finite")]
    NonFiniteValue { index: usize, component: usize },

    /// A free-text field contains a wire delimiter.
    #[error("{field} contains reserved character {ch:?}")]
    DelimiterInField { field: &'static str, ch: char },

    /// A free-text field is empty where a value is required.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// The payload has fewer slots than the layout requires.
    #[error("payload has {got} slots (expected {expected})")]
    MissingSlots { expected: usize, got: usize },

    /// A slot could not be parsed as a number or boolean.
    #[error("slot {slot} has invalid value {value:?}")]
    InvalidSlot { slot: Slot, value: String },

    /// The action code is not in the table.
    #[error("unknown action code {0}")]
    UnknownActionCode(u16),

    /// NUM_POINTS disagrees with the points actually present.
    #[error("declared {declared} points, found {actual}")]
    PointCountMismatch { declared: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, CommandError>;

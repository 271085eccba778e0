//! Wire delimiters and slot positions.

use std::fmt;

/// Separates the ten top-level slots.
pub const FIELD_DELIMITER: char = '|';

/// Separates the components of one point.
pub const COMPONENT_DELIMITER: char = ';';

/// Separates points from each other.
pub const POINT_DELIMITER: char = ',';

/// Frame terminator; owned by the frame layer but reserved here too.
pub const TERMINATOR: char = '#';

/// Characters that may not appear inside a free-text slot.
pub const RESERVED: [char; 4] = [
    FIELD_DELIMITER,
    COMPONENT_DELIMITER,
    POINT_DELIMITER,
    TERMINATOR,
];

/// Position of each slot in a command payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Slot {
    Action = 0,
    NumPoints = 1,
    Points = 2,
    IoPoint = 3,
    IoPin = 4,
    IoState = 5,
    Tool = 6,
    Base = 7,
    Speed = 8,
    Id = 9,
}

impl Slot {
    /// Number of slots in a command payload.
    pub const COUNT: usize = 10;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Slot::Action => "ACTION",
            Slot::NumPoints => "NUM_POINTS",
            Slot::Points => "POINTS",
            Slot::IoPoint => "IO_POINT",
            Slot::IoPin => "IO_PIN",
            Slot::IoState => "IO_STATE",
            Slot::Tool => "TOOL",
            Slot::Base => "BASE",
            Slot::Speed => "SPEED",
            Slot::Id => "ID",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds a payload slot by slot; unset slots stay empty.
#[derive(Debug, Default)]
pub(crate) struct SlotWriter {
    slots: [String; Slot::COUNT],
}

impl SlotWriter {
    pub(crate) fn set(&mut self, slot: Slot, value: impl Into<String>) -> &mut Self {
        self.slots[slot.index()] = value.into();
        self
    }

    pub(crate) fn finish(&self) -> String {
        self.slots.join(&FIELD_DELIMITER.to_string())
    }
}

use std::fmt;

use serde::Serialize;

/// Motion interpolation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionFamily {
    /// Point-to-point.
    Ptp,
    /// Linear.
    Lin,
    /// Circular (auxiliary point, then end point).
    Circ,
}

impl MotionFamily {
    pub fn name(self) -> &'static str {
        match self {
            MotionFamily::Ptp => "PTP",
            MotionFamily::Lin => "LIN",
            MotionFamily::Circ => "CIRC",
        }
    }
}

impl fmt::Display for MotionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// High-level command category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCategory {
    Movement,
    Io,
    ProgramCall,
}

/// Action code in the first payload slot.
///
/// ```text
///            joint   joint+cont   cartesian   cartesian+cont
///   PTP        1         7            2             8
///   LIN        3         3            4             9
///   CIRC       5         5            6             6
/// ```
///
/// LIN in joint space and both CIRC variants have no continuous form; the
/// continuous flag is dropped for them. I/O is 10 and subroutine calls are
/// 100. Relative linear moves (11, 12) are decoded but never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionCode {
    PtpAxis,
    PtpFrame,
    LinAxis,
    LinFrame,
    CircAxis,
    CircFrame,
    PtpAxisC,
    PtpFrameC,
    LinFrameC,
    ActivateIo,
    LinRelTool,
    LinRelBase,
    ProgramCall,
}

impl ActionCode {
    /// Every code, in numeric order.
    pub const ALL: [ActionCode; 13] = [
        ActionCode::PtpAxis,
        ActionCode::PtpFrame,
        ActionCode::LinAxis,
        ActionCode::LinFrame,
        ActionCode::CircAxis,
        ActionCode::CircFrame,
        ActionCode::PtpAxisC,
        ActionCode::PtpFrameC,
        ActionCode::LinFrameC,
        ActionCode::ActivateIo,
        ActionCode::LinRelTool,
        ActionCode::LinRelBase,
        ActionCode::ProgramCall,
    ];

    /// Resolve the code for a motion from the decision table.
    pub fn for_motion(family: MotionFamily, continuous: bool, joint_space: bool) -> Self {
        match (family, joint_space, continuous) {
            (MotionFamily::Ptp, true, false) => ActionCode::PtpAxis,
            (MotionFamily::Ptp, true, true) => ActionCode::PtpAxisC,
            (MotionFamily::Ptp, false, false) => ActionCode::PtpFrame,
            (MotionFamily::Ptp, false, true) => ActionCode::PtpFrameC,
            (MotionFamily::Lin, true, _) => ActionCode::LinAxis,
            (MotionFamily::Lin, false, false) => ActionCode::LinFrame,
            (MotionFamily::Lin, false, true) => ActionCode::LinFrameC,
            (MotionFamily::Circ, true, _) => ActionCode::CircAxis,
            (MotionFamily::Circ, false, _) => ActionCode::CircFrame,
        }
    }

    /// Numeric value on the wire.
    pub fn code(self) -> u16 {
        match self {
            ActionCode::PtpAxis => 1,
            ActionCode::PtpFrame => 2,
            ActionCode::LinAxis => 3,
            ActionCode::LinFrame => 4,
            ActionCode::CircAxis => 5,
            ActionCode::CircFrame => 6,
            ActionCode::PtpAxisC => 7,
            ActionCode::PtpFrameC => 8,
            ActionCode::LinFrameC => 9,
            ActionCode::ActivateIo => 10,
            ActionCode::LinRelTool => 11,
            ActionCode::LinRelBase => 12,
            ActionCode::ProgramCall => 100,
        }
    }

    /// Look up a code read off the wire.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.code() == code)
    }

    pub fn category(self) -> CommandCategory {
        match self {
            ActionCode::ActivateIo => CommandCategory::Io,
            ActionCode::ProgramCall => CommandCategory::ProgramCall,
            _ => CommandCategory::Movement,
        }
    }

    pub fn family(self) -> Option<MotionFamily> {
        match self {
            ActionCode::PtpAxis
            | ActionCode::PtpFrame
            | ActionCode::PtpAxisC
            | ActionCode::PtpFrameC => Some(MotionFamily::Ptp),
            ActionCode::LinAxis
            | ActionCode::LinFrame
            | ActionCode::LinFrameC
            | ActionCode::LinRelTool
            | ActionCode::LinRelBase => Some(MotionFamily::Lin),
            ActionCode::CircAxis | ActionCode::CircFrame => Some(MotionFamily::Circ),
            ActionCode::ActivateIo | ActionCode::ProgramCall => None,
        }
    }

    /// True when target points are joint values.
    pub fn is_joint_motion(self) -> bool {
        matches!(
            self,
            ActionCode::PtpAxis | ActionCode::PtpAxisC | ActionCode::LinAxis | ActionCode::CircAxis
        )
    }

    /// True when target points are cartesian frames.
    pub fn is_cartesian_motion(self) -> bool {
        self.category() == CommandCategory::Movement && !self.is_joint_motion()
    }

    pub fn is_continuous(self) -> bool {
        matches!(
            self,
            ActionCode::PtpAxisC | ActionCode::PtpFrameC | ActionCode::LinFrameC
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ActionCode::PtpAxis => "PTP_AXIS",
            ActionCode::PtpFrame => "PTP_FRAME",
            ActionCode::LinAxis => "LIN_AXIS",
            ActionCode::LinFrame => "LIN_FRAME",
            ActionCode::CircAxis => "CIRC_AXIS",
            ActionCode::CircFrame => "CIRC_FRAME",
            ActionCode::PtpAxisC => "PTP_AXIS_C",
            ActionCode::PtpFrameC => "PTP_FRAME_C",
            ActionCode::LinFrameC => "LIN_FRAME_C",
            ActionCode::ActivateIo => "ACTIVATE_IO",
            ActionCode::LinRelTool => "LIN_REL_TOOL",
            ActionCode::LinRelBase => "LIN_REL_BASE",
            ActionCode::ProgramCall => "PROGRAM_CALL",
        }
    }
}

impl fmt::Display for ActionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

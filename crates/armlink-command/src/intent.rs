use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::action::MotionFamily;

/// Number of components in a cartesian point (X, Y, Z, A, B, C).
pub const CARTESIAN_COMPONENTS: usize = 6;

/// Number of components in a joint point (J1..J7).
pub const JOINT_COMPONENTS: usize = 7;

/// What a point's component count says it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Cartesian,
    Joint,
}

impl PointKind {
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            CARTESIAN_COMPONENTS => Some(PointKind::Cartesian),
            JOINT_COMPONENTS => Some(PointKind::Joint),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PointKind::Cartesian => "cartesian",
            PointKind::Joint => "joint",
        }
    }

    /// Indices of components that are angles.
    ///
    /// Every joint value is an angle; for cartesian points only A, B and C are.
    pub fn rotational_range(self) -> std::ops::Range<usize> {
        match self {
            PointKind::Cartesian => 3..CARTESIAN_COMPONENTS,
            PointKind::Joint => 0..JOINT_COMPONENTS,
        }
    }
}

/// One motion target: 6 cartesian or 7 joint values.
///
/// Arity is checked when the command is encoded, not here, so a point read
/// from operator input can be reported with its position in the sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Point {
    values: Vec<f64>,
}

impl Point {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn kind(&self) -> Option<PointKind> {
        PointKind::from_len(self.values.len())
    }
}

impl From<Vec<f64>> for Point {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// Opaque token correlating a request with the controller's log output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CommandId(String);

impl CommandId {
    /// A fresh random (v4 UUID) id. Never reuse one across requests.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for CommandId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CommandId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Default speed fraction when the operator gives none.
pub const DEFAULT_SPEED: f64 = 0.25;

/// Move the arm through one or more points.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionCommand {
    pub family: MotionFamily,
    pub continuous: bool,
    /// Points are joint values (true) or cartesian frames (false).
    pub joint_space: bool,
    pub points: Vec<Point>,
    /// Tool name; empty means the controller's active tool.
    pub tool: String,
    /// Base name; empty means the controller's active base.
    pub base: String,
    /// Speed override fraction, 0.0..=1.0.
    pub speed: f64,
    pub id: CommandId,
}

impl MotionCommand {
    /// A motion whose joint-space flag follows the first point's arity.
    ///
    /// Uses default tool and base, [`DEFAULT_SPEED`] and a fresh id.
    pub fn from_points(family: MotionFamily, continuous: bool, points: Vec<Point>) -> Self {
        let joint_space = points
            .first()
            .and_then(Point::kind)
            .is_some_and(|kind| kind == PointKind::Joint);
        Self {
            family,
            continuous,
            joint_space,
            points,
            tool: String::new(),
            base: String::new(),
            speed: DEFAULT_SPEED,
            id: CommandId::generate(),
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_id(mut self, id: impl Into<CommandId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn expected_kind(&self) -> PointKind {
        if self.joint_space {
            PointKind::Joint
        } else {
            PointKind::Cartesian
        }
    }
}

/// Drive a digital output.
#[derive(Debug, Clone, PartialEq)]
pub struct IoCommand {
    pub pin: String,
    pub state: bool,
    pub id: CommandId,
}

impl IoCommand {
    pub fn new(pin: impl Into<String>, state: bool) -> Self {
        Self {
            pin: pin.into(),
            state,
            id: CommandId::generate(),
        }
    }
}

/// Start a program stored on the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct SubroutineCall {
    pub program: String,
    pub id: CommandId,
}

impl SubroutineCall {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            id: CommandId::generate(),
        }
    }
}

/// Everything an operator can ask the controller to do.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandIntent {
    Motion(MotionCommand),
    Io(IoCommand),
    Subroutine(SubroutineCall),
}

impl CommandIntent {
    pub fn id(&self) -> &CommandId {
        match self {
            CommandIntent::Motion(cmd) => &cmd.id,
            CommandIntent::Io(cmd) => &cmd.id,
            CommandIntent::Subroutine(cmd) => &cmd.id,
        }
    }
}

impl From<MotionCommand> for CommandIntent {
    fn from(cmd: MotionCommand) -> Self {
        CommandIntent::Motion(cmd)
    }
}

impl From<IoCommand> for CommandIntent {
    fn from(cmd: IoCommand) -> Self {
        CommandIntent::Io(cmd)
    }
}

impl From<SubroutineCall> for CommandIntent {
    fn from(cmd: SubroutineCall) -> Self {
        CommandIntent::Subroutine(cmd)
    }
}

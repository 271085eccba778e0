use serde::Serialize;
use tracing::debug;

use crate::action::ActionCode;
use crate::error::{CommandError, Result};
use crate::intent::{CommandId, CommandIntent, IoCommand, MotionCommand, Point, SubroutineCall};
use crate::wire::{Slot, SlotWriter, COMPONENT_DELIMITER, POINT_DELIMITER, RESERVED};

/// Unit of the rotational values handed to the encoder.
///
/// The controller expects radians. With [`AngleUnit::Degrees`] the encoder
/// converts joint values and cartesian A/B/C before writing them; X/Y/Z are
/// never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
}

impl AngleUnit {
    /// Convert a value in this unit to radians.
    pub fn to_radians(self, value: f64) -> f64 {
        match self {
            AngleUnit::Radians => value,
            AngleUnit::Degrees => value.to_radians(),
        }
    }
}

/// Encoder behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncoderConfig {
    /// Unit of incoming rotational values. Default: radians (sent as given).
    pub angle_unit: AngleUnit,
}

/// Turns a [`CommandIntent`] into a command payload (terminator not included).
#[derive(Debug, Clone, Default)]
pub struct CommandEncoder {
    config: EncoderConfig,
}

impl CommandEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn encode(&self, intent: &CommandIntent) -> Result<String> {
        match intent {
            CommandIntent::Motion(cmd) => self.encode_motion(cmd),
            CommandIntent::Io(cmd) => self.encode_io(cmd),
            CommandIntent::Subroutine(cmd) => self.encode_subroutine(cmd),
        }
    }

    /// `CODE|N|P1,P2,..|||` `|TOOL|BASE|SPEED|ID`
    pub fn encode_motion(&self, cmd: &MotionCommand) -> Result<String> {
        check_point_arity(&cmd.points)?;
        check_id(&cmd.id)?;
        if cmd.points.is_empty() {
            return Err(CommandError::EmptyPoints);
        }

        let expected = cmd.expected_kind();
        for (index, point) in cmd.points.iter().enumerate() {
            // Arity was checked above, so kind() is Some.
            if let Some(found) = point.kind().filter(|kind| *kind != expected) {
                return Err(CommandError::PointKindMismatch {
                    index,
                    expected: expected.name(),
                    found: found.name(),
                });
            }
            if let Some(component) = point.values().iter().position(|v| !v.is_finite()) {
                return Err(CommandError::NonFiniteValue { index, component });
            }
        }

        if !cmd.speed.is_finite() || !(0.0..=1.0).contains(&cmd.speed) {
            return Err(CommandError::SpeedOutOfRange(cmd.speed));
        }
        check_text("tool", &cmd.tool)?;
        check_text("base", &cmd.base)?;

        let action = ActionCode::for_motion(cmd.family, cmd.continuous, cmd.joint_space);
        if cmd.continuous && !action.is_continuous() {
            debug!(%action, "no continuous variant; sending as discrete motion");
        }

        let points = cmd
            .points
            .iter()
            .map(|point| self.encode_point(point))
            .collect::<Vec<_>>()
            .join(&POINT_DELIMITER.to_string());

        let mut slots = SlotWriter::default();
        slots
            .set(Slot::Action, action.code().to_string())
            .set(Slot::NumPoints, cmd.points.len().to_string())
            .set(Slot::Points, points)
            .set(Slot::Tool, cmd.tool.as_str())
            .set(Slot::Base, cmd.base.as_str())
            .set(Slot::Speed, cmd.speed.to_string())
            .set(Slot::Id, cmd.id.as_str());
        Ok(slots.finish())
    }

    /// `10|0||0|PIN|STATE|||0|ID`
    pub fn encode_io(&self, cmd: &IoCommand) -> Result<String> {
        check_id(&cmd.id)?;
        check_required("pin", &cmd.pin)?;

        let mut slots = SlotWriter::default();
        slots
            .set(Slot::Action, ActionCode::ActivateIo.code().to_string())
            .set(Slot::NumPoints, "0")
            .set(Slot::IoPoint, "0")
            .set(Slot::IoPin, cmd.pin.trim())
            .set(Slot::IoState, if cmd.state { "true" } else { "false" })
            .set(Slot::Speed, "0")
            .set(Slot::Id, cmd.id.as_str());
        Ok(slots.finish())
    }

    /// `100|0|PROGRAM||||||0|ID`; the program id travels in the POINTS slot.
    pub fn encode_subroutine(&self, cmd: &SubroutineCall) -> Result<String> {
        check_id(&cmd.id)?;
        check_required("program", &cmd.program)?;

        let mut slots = SlotWriter::default();
        slots
            .set(Slot::Action, ActionCode::ProgramCall.code().to_string())
            .set(Slot::NumPoints, "0")
            .set(Slot::Points, cmd.program.trim())
            .set(Slot::Speed, "0")
            .set(Slot::Id, cmd.id.as_str());
        Ok(slots.finish())
    }

    fn encode_point(&self, point: &Point) -> String {
        let rotational = point
            .kind()
            .map(|kind| kind.rotational_range())
            .unwrap_or(0..0);
        point
            .values()
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                let value = if rotational.contains(&i) {
                    self.config.angle_unit.to_radians(value)
                } else {
                    value
                };
                value.to_string()
            })
            .collect::<Vec<_>>()
            .join(&COMPONENT_DELIMITER.to_string())
    }
}

fn check_point_arity(points: &[Point]) -> Result<()> {
    match points.iter().position(|point| point.kind().is_none()) {
        Some(index) => Err(CommandError::InvalidPointArity {
            index,
            len: points[index].len(),
        }),
        None => Ok(()),
    }
}

fn check_id(id: &CommandId) -> Result<()> {
    if id.is_empty() {
        return Err(CommandError::EmptyCommandId);
    }
    check_text("id", id.as_str())
}

fn check_required(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CommandError::EmptyField(field));
    }
    check_text(field, value)
}

fn check_text(field: &'static str, value: &str) -> Result<()> {
    match value.chars().find(|ch| RESERVED.contains(ch)) {
        Some(ch) => Err(CommandError::DelimiterInField { field, ch }),
        None => Ok(()),
    }
}

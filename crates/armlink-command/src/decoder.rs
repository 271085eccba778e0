use serde::Serialize;

use crate::action::{ActionCode, CommandCategory};
use crate::error::{CommandError, Result};
use crate::intent::{Point, PointKind};
use crate::wire::{Slot, COMPONENT_DELIMITER, FIELD_DELIMITER, POINT_DELIMITER, TERMINATOR};

/// I/O slots of a decoded command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IoFields {
    pub point: String,
    pub pin: String,
    pub state: bool,
}

/// A command payload read back into its parts.
///
/// Values are exactly what is on the wire; no unit conversion is undone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedCommand {
    pub action: ActionCode,
    pub point_count: usize,
    pub points: Vec<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io: Option<IoFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    pub tool: String,
    pub base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    pub id: String,
}

/// Parse a command payload. A trailing `#` is accepted and ignored.
///
/// Extra slots past ID are tolerated; fewer than ten are not.
pub fn decode_command(payload: &str) -> Result<DecodedCommand> {
    let payload = payload.trim_end();
    let payload = payload.strip_suffix(TERMINATOR).unwrap_or(payload);
    let parts: Vec<&str> = payload.split(FIELD_DELIMITER).collect();
    if parts.len() < Slot::COUNT {
        return Err(CommandError::MissingSlots {
            expected: Slot::COUNT,
            got: parts.len(),
        });
    }
    let slot = |slot: Slot| parts[slot.index()].trim();

    let code: u16 = parse_slot(Slot::Action, slot(Slot::Action))?;
    let action = ActionCode::from_code(code).ok_or(CommandError::UnknownActionCode(code))?;
    let point_count: usize = parse_slot(Slot::NumPoints, slot(Slot::NumPoints))?;

    let id = slot(Slot::Id);
    if id.is_empty() {
        return Err(CommandError::EmptyCommandId);
    }

    let speed = match slot(Slot::Speed) {
        "" => None,
        raw => Some(parse_slot::<f64>(Slot::Speed, raw)?),
    };

    let mut decoded = DecodedCommand {
        action,
        point_count,
        points: Vec::new(),
        io: None,
        program: None,
        tool: slot(Slot::Tool).to_string(),
        base: slot(Slot::Base).to_string(),
        speed,
        id: id.to_string(),
    };

    match action.category() {
        CommandCategory::Movement => {
            let expected = if action.is_joint_motion() {
                PointKind::Joint
            } else {
                PointKind::Cartesian
            };
            decoded.points = decode_points(slot(Slot::Points), expected)?;
            if decoded.points.len() != point_count {
                return Err(CommandError::PointCountMismatch {
                    declared: point_count,
                    actual: decoded.points.len(),
                });
            }
        }
        CommandCategory::Io => {
            let state = match slot(Slot::IoState).to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                other => {
                    return Err(CommandError::InvalidSlot {
                        slot: Slot::IoState,
                        value: other.to_string(),
                    })
                }
            };
            decoded.io = Some(IoFields {
                point: slot(Slot::IoPoint).to_string(),
                pin: slot(Slot::IoPin).to_string(),
                state,
            });
        }
        CommandCategory::ProgramCall => {
            let program = slot(Slot::Points);
            if program.is_empty() {
                return Err(CommandError::EmptyField("program"));
            }
            decoded.program = Some(program.to_string());
        }
    }

    Ok(decoded)
}

fn decode_points(raw: &str, expected: PointKind) -> Result<Vec<Point>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    raw.split(POINT_DELIMITER)
        .enumerate()
        .map(|(index, point)| {
            let values = point
                .split(COMPONENT_DELIMITER)
                .map(|v| parse_slot::<f64>(Slot::Points, v.trim()))
                .collect::<Result<Vec<f64>>>()?;
            match PointKind::from_len(values.len()) {
                None => Err(CommandError::InvalidPointArity {
                    index,
                    len: values.len(),
                }),
                Some(kind) if kind != expected => Err(CommandError::PointKindMismatch {
                    index,
                    expected: expected.name(),
                    found: kind.name(),
                }),
                Some(_) => Ok(Point::new(values)),
            }
        })
        .collect()
}

fn parse_slot<T: std::str::FromStr>(slot: Slot, raw: &str) -> Result<T> {
    raw.parse().map_err(|_| CommandError::InvalidSlot {
        slot,
        value: raw.to_string(),
    })
}

use serde::Serialize;

use crate::record::{ExtractedField, FieldValue};

/// Number of distinct axis render classes; axis slots wrap at this.
pub const AXIS_CLASSES: usize = 7;

/// Number of distinct parameter render classes; param slots wrap at this.
pub const PARAM_CLASSES: usize = 5;

const IDENTITY_FIELDS: &[&str] = &["actionType", "ActionType", "id", "ID", "commandId", "type"];

/// Keys that open a new record when seen at the top level.
const RECORD_START_FIELDS: &[&str] = &["actionType", "ActionType"];

const AXIS_FIELDS: &[&str] = &[
    "j1", "j2", "j3", "j4", "j5", "j6", "j7", "x", "y", "z", "a", "b", "c",
];

const PARAM_FIELDS: &[&str] = &[
    "speed",
    "speed override",
    "speedoverride",
    "tool",
    "base",
    "continuous",
    "num points",
    "numpoints",
    "io point",
    "io pin",
    "io state",
    "iopoint",
    "iopin",
    "iostate",
    "pin",
    "state",
    "program id",
    "programid",
];

/// Logical highlight category of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "class", content = "slot", rename_all = "snake_case")]
pub enum RenderClass {
    /// Command type and id fields; fixed regardless of position.
    Identity,
    /// Coordinate or joint value, by cyclic position in the record.
    AxisSlot(usize),
    /// Motion or I/O parameter, by cyclic position in the record.
    ParamSlot(usize),
    DefaultString,
    DefaultScalar,
}

/// Grouping of a classified field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "slot", rename_all = "snake_case")]
pub enum GroupRole {
    Scalar,
    AxisSlot(usize),
    ParamSlot(usize),
}

impl RenderClass {
    pub fn group_role(self) -> GroupRole {
        match self {
            RenderClass::AxisSlot(n) => GroupRole::AxisSlot(n),
            RenderClass::ParamSlot(n) => GroupRole::ParamSlot(n),
            _ => GroupRole::Scalar,
        }
    }
}

/// Assigns render classes to the fields of one record at a time.
///
/// Holds the two cyclic counters; they only advance within a record and
/// are zeroed by [`reset`](Self::reset) or by a top-level record start key.
/// Output depends only on the field sequence since the last reset.
#[derive(Debug, Clone, Default)]
pub struct FieldRenderClassifier {
    axis: usize,
    param: usize,
}

impl FieldRenderClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new record.
    pub fn reset(&mut self) {
        self.axis = 0;
        self.param = 0;
    }

    /// Classify the next field. Containers get `None`.
    pub fn classify(&mut self, field: &ExtractedField) -> Option<RenderClass> {
        if field.depth == 0 && RECORD_START_FIELDS.contains(&field.name.as_str()) {
            self.reset();
        }
        self.classify_parts(&field.name, &field.value)
    }

    fn classify_parts(&mut self, name: &str, value: &FieldValue) -> Option<RenderClass> {
        if IDENTITY_FIELDS.contains(&name) {
            return Some(RenderClass::Identity);
        }

        let key = name.trim().to_ascii_lowercase();
        if AXIS_FIELDS.contains(&key.as_str()) {
            let slot = self.axis;
            self.axis = (self.axis + 1) % AXIS_CLASSES;
            return Some(RenderClass::AxisSlot(slot));
        }
        if PARAM_FIELDS.contains(&key.as_str()) {
            let slot = self.param;
            self.param = (self.param + 1) % PARAM_CLASSES;
            return Some(RenderClass::ParamSlot(slot));
        }

        match value {
            FieldValue::Nested(_) => None,
            FieldValue::Text(s) if !s.is_empty() => Some(RenderClass::DefaultString),
            FieldValue::Text(_) | FieldValue::Scalar(_) => Some(RenderClass::DefaultScalar),
        }
    }
}

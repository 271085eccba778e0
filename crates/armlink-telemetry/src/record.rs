use std::fmt;

use serde::Serialize;

/// What kind of line the router saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A decoded command with an embedded payload.
    StructuredCommand,
    Error,
    Warning,
    /// Connection and transmit/receive notices.
    Info,
    /// Anything else, including structured lines that failed to parse.
    Plain,
}

impl RecordKind {
    pub fn name(self) -> &'static str {
        match self {
            RecordKind::StructuredCommand => "structured_command",
            RecordKind::Error => "error",
            RecordKind::Warning => "warning",
            RecordKind::Info => "info",
            RecordKind::Plain => "plain",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Container type of a nested field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NestedKind {
    Object,
    Array,
}

/// Value of an extracted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    /// A string value.
    Text(String),
    /// A number, boolean or null, kept in its printed form.
    Scalar(String),
    /// An object or array; its children follow it at `depth + 1`.
    Nested(NestedKind),
}

impl FieldValue {
    /// Infer a value type from delimiter-embedded text.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        let scalar = matches!(trimmed, "true" | "false" | "null")
            || (!trimmed.is_empty() && trimmed.parse::<f64>().is_ok());
        if scalar {
            FieldValue::Scalar(raw.to_string())
        } else {
            FieldValue::Text(raw.to_string())
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, FieldValue::Nested(_))
    }

    /// Printed form; empty for containers.
    pub fn as_str(&self) -> &str {
        match self {
            FieldValue::Text(s) | FieldValue::Scalar(s) => s,
            FieldValue::Nested(_) => "",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(name, value)` pair pulled out of a structured line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedField {
    pub name: String,
    pub value: FieldValue,
    /// Nesting depth; top-level fields are 0.
    pub depth: usize,
}

impl ExtractedField {
    pub fn new(name: impl Into<String>, value: FieldValue, depth: usize) -> Self {
        Self {
            name: name.into(),
            value,
            depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_infer_scalars() {
        assert_eq!(FieldValue::from_raw("0.5"), FieldValue::Scalar("0.5".into()));
        assert_eq!(FieldValue::from_raw("-12"), FieldValue::Scalar("-12".into()));
        assert_eq!(FieldValue::from_raw("true"), FieldValue::Scalar("true".into()));
        assert_eq!(
            FieldValue::from_raw("[Default]"),
            FieldValue::Text("[Default]".into())
        );
        assert_eq!(FieldValue::from_raw(""), FieldValue::Text(String::new()));
    }

    #[test]
    fn nested_prints_empty() {
        assert_eq!(FieldValue::Nested(NestedKind::Array).to_string(), "");
        assert!(FieldValue::Nested(NestedKind::Object).is_nested());
    }
}

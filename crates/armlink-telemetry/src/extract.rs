//! Structured payload extraction.
//!
//! Two embeddings are understood, tried in this order:
//!
//! 1. **Serialized**: `... Successfully parsed command: {"actionType":...}`.
//!    Everything before the first `{` after the phrase is the header; the
//!    rest is a JSON object whose key order is kept.
//! 2. **Delimited**: a `ParsedCommand {` block whose values are wrapped in
//!    `\u{1A}` ... `\u{1B}`. The text before each value names it
//!    (`J3=` gives `J3`, `Speed Override: ` gives `Speed Override`).

use serde_json::{Map, Value};

use crate::error::{ExtractError, Result};
use crate::record::{ExtractedField, FieldValue, NestedKind};

/// Header phrase preceding a JSON payload.
pub const SERIALIZED_HEADER: &str = "Successfully parsed command:";

/// Header phrase opening a delimited block.
pub const DELIMITED_HEADER: &str = "ParsedCommand {";

/// Opens a delimited value (SUB).
pub const VALUE_START: char = '\u{1A}';

/// Closes a delimited value (ESC).
pub const VALUE_END: char = '\u{1B}';

/// Which embedding a structured line uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Embedding {
    Serialized,
    Delimited,
}

impl Embedding {
    /// Detect the embedding from its header phrase.
    pub fn detect(line: &str) -> Option<Self> {
        if line.contains(SERIALIZED_HEADER) {
            Some(Embedding::Serialized)
        } else if line.contains(DELIMITED_HEADER) {
            Some(Embedding::Delimited)
        } else {
            None
        }
    }
}

/// Header text and fields of a serialized payload, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub header: String,
    pub fields: Vec<ExtractedField>,
}

/// Extract a JSON payload following [`SERIALIZED_HEADER`].
///
/// Text after the closing brace is ignored. Containers are flattened
/// depth-first: the container itself is emitted as a
/// [`FieldValue::Nested`] entry and its children follow at `depth + 1`.
/// Array elements are named by index (`[0]`, `[1]`, ...).
pub fn extract_serialized(line: &str) -> Result<Extraction> {
    let phrase = line
        .find(SERIALIZED_HEADER)
        .ok_or(ExtractError::MissingPayload)?;
    let after = phrase + SERIALIZED_HEADER.len();
    let brace = line[after..]
        .find('{')
        .map(|offset| after + offset)
        .ok_or(ExtractError::MissingPayload)?;

    let payload = &line[brace..];
    let value = serde_json::Deserializer::from_str(payload)
        .into_iter::<Value>()
        .next()
        .ok_or(ExtractError::MissingPayload)?
        .map_err(|err| ExtractError::MalformedPayload {
            reason: err.to_string(),
        })?;

    let mut fields = Vec::new();
    if let Value::Object(map) = value {
        flatten_object(map, 0, &mut fields);
    }

    Ok(Extraction {
        header: line[..brace].trim_end().to_string(),
        fields,
    })
}

fn flatten_object(map: Map<String, Value>, depth: usize, out: &mut Vec<ExtractedField>) {
    for (name, value) in map {
        flatten_value(name, value, depth, out);
    }
}

fn flatten_value(name: String, value: Value, depth: usize, out: &mut Vec<ExtractedField>) {
    match value {
        Value::Object(map) => {
            out.push(ExtractedField::new(
                name,
                FieldValue::Nested(NestedKind::Object),
                depth,
            ));
            flatten_object(map, depth + 1, out);
        }
        Value::Array(items) => {
            out.push(ExtractedField::new(
                name,
                FieldValue::Nested(NestedKind::Array),
                depth,
            ));
            for (index, item) in items.into_iter().enumerate() {
                flatten_value(format!("[{index}]"), item, depth + 1, out);
            }
        }
        Value::String(s) => out.push(ExtractedField::new(name, FieldValue::Text(s), depth)),
        other => out.push(ExtractedField::new(
            name,
            FieldValue::Scalar(other.to_string()),
            depth,
        )),
    }
}

/// A piece of a delimited line, left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Label or other literal text.
    Literal(String),
    /// A bracketed value and the name taken from the label before it.
    Field(ExtractedField),
}

/// Split a delimited line into literal text and fields.
///
/// An unterminated value is kept as literal text, markers stripped.
pub fn extract_delimited(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = text;
    let mut last_name = String::new();

    while let Some(start) = rest.find(VALUE_START) {
        let label = &rest[..start];
        let value_and_after = &rest[start + VALUE_START.len_utf8()..];
        let Some(end) = value_and_after.find(VALUE_END) else {
            break;
        };

        if !label.is_empty() {
            segments.push(Segment::Literal(label.to_string()));
        }
        let name = match label_name(label) {
            Some(name) => name.to_string(),
            // Two values back to back share the earlier label.
            None => last_name.clone(),
        };
        let value = &value_and_after[..end];
        segments.push(Segment::Field(ExtractedField::new(
            name.clone(),
            FieldValue::from_raw(value),
            0,
        )));
        last_name = name;
        rest = &value_and_after[end + VALUE_END.len_utf8()..];
    }

    let tail: String = rest
        .chars()
        .filter(|ch| *ch != VALUE_START && *ch != VALUE_END)
        .collect();
    if !tail.is_empty() {
        segments.push(Segment::Literal(tail));
    }
    segments
}

/// Field name implied by the label text before a value.
///
/// Takes the text between the last separator and the trailing `=` or `:`.
fn label_name(label: &str) -> Option<&str> {
    let label = label.trim_end();
    let label = label
        .strip_suffix('=')
        .or_else(|| label.strip_suffix(':'))
        .unwrap_or(label);
    let start = label
        .rfind([',', ':', '=', '(', '{'])
        .map(|i| i + 1)
        .unwrap_or(0);
    let name = label[start..].trim();
    (!name.is_empty()).then_some(name)
}

//! Telemetry line pipeline: route, extract, classify.
//!
//! The controller's log stream is free text. Some lines carry a decoded
//! command, either as a JSON object after a header phrase or as a
//! multi-line block whose values are bracketed by `\u{1A}` / `\u{1B}`.
//! [`RecordRouter`] picks those out, [`extract`] pulls the fields and
//! [`FieldRenderClassifier`] assigns every field a stable [`RenderClass`].
//! How a class looks on screen is up to the [`Renderer`].

pub mod classify;
pub mod error;
pub mod extract;
pub mod lines;
pub mod record;
pub mod router;

pub use classify::{FieldRenderClassifier, GroupRole, RenderClass, AXIS_CLASSES, PARAM_CLASSES};
pub use error::{ExtractError, Result};
pub use extract::{
    extract_delimited, extract_serialized, Embedding, Extraction, Segment, DELIMITED_HEADER,
    SERIALIZED_HEADER, VALUE_END, VALUE_START,
};
pub use lines::LineAssembler;
pub use record::{ExtractedField, FieldValue, NestedKind, RecordKind};
pub use router::{classify_line, RecordRouter, Renderer};

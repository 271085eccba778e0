use tracing::debug;

use crate::classify::{FieldRenderClassifier, RenderClass};
use crate::extract::{extract_delimited, extract_serialized, Embedding, Segment, DELIMITED_HEADER, VALUE_START};
use crate::lines::LineAssembler;
use crate::record::{ExtractedField, RecordKind};

const ERROR_MARKERS: &[&str] = &["Error:", "ERROR"];
const WARNING_MARKERS: &[&str] = &["Warning:", "WARN"];
const INFO_MARKERS: &[&str] = &["Sent", "Received", "Connected", "connected"];

/// Receives routed output. How classes map to colors is the renderer's call.
pub trait Renderer {
    /// A whole unstructured line.
    fn render_line(&mut self, line: &str, kind: RecordKind);

    /// Header text opening a structured record, as its own line.
    fn render_header(&mut self, text: &str);

    /// One field of a serialized record, as its own line.
    fn render_field(&mut self, field: &ExtractedField, class: Option<RenderClass>);

    /// Label text inside a delimited line.
    fn render_literal(&mut self, text: &str);

    /// A value inside a delimited line; its label came just before.
    fn render_inline_field(&mut self, field: &ExtractedField, class: Option<RenderClass>);

    /// Ends a delimited line.
    fn end_line(&mut self);

    /// The current structured record is complete.
    fn record_end(&mut self) {}
}

/// Classify a line by fixed priority.
///
/// Structured header, then error marker, warning marker, transmit/receive
/// marker, else plain. A line matching several is given the first.
pub fn classify_line(line: &str) -> RecordKind {
    let contains_any = |markers: &[&str]| markers.iter().any(|m| line.contains(m));

    if Embedding::detect(line).is_some() {
        RecordKind::StructuredCommand
    } else if contains_any(ERROR_MARKERS) {
        RecordKind::Error
    } else if contains_any(WARNING_MARKERS) {
        RecordKind::Warning
    } else if contains_any(INFO_MARKERS) {
        RecordKind::Info
    } else {
        RecordKind::Plain
    }
}

/// Routes telemetry lines to the extractor or straight to the renderer.
///
/// A delimited record spans several lines, from its `ParsedCommand {`
/// header to a line holding only `}`; the router keeps it open, and the
/// classifier's counters with it, until then. Extraction failures fall
/// back to rendering the raw line as [`RecordKind::Plain`].
#[derive(Debug, Default)]
pub struct RecordRouter {
    classifier: FieldRenderClassifier,
    lines: LineAssembler,
    open_block: bool,
}

impl RecordRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a delimited record is open.
    pub fn in_record(&self) -> bool {
        self.open_block
    }

    /// Feed a raw chunk from the stream. Complete lines are routed now;
    /// a trailing partial line waits for the next chunk or [`flush`](Self::flush).
    pub fn route_chunk<R: Renderer>(&mut self, chunk: &[u8], renderer: &mut R) {
        for line in self.lines.push(chunk) {
            self.route_line(&line, renderer);
        }
    }

    /// Route any buffered partial line and close an open record.
    ///
    /// Call when the stream ends so nothing is held back.
    pub fn flush<R: Renderer>(&mut self, renderer: &mut R) {
        if let Some(line) = self.lines.flush() {
            self.route_line(&line, renderer);
        }
        self.close_block(renderer);
    }

    /// Route one line; returns the kind it was rendered as.
    pub fn route_line<R: Renderer>(&mut self, line: &str, renderer: &mut R) -> RecordKind {
        if self.open_block {
            if Embedding::detect(line).is_some() {
                self.close_block(renderer);
            } else {
                return self.route_block_line(line, renderer);
            }
        }

        match classify_line(line) {
            RecordKind::StructuredCommand => match Embedding::detect(line) {
                Some(Embedding::Serialized) => self.route_serialized(line, renderer),
                Some(Embedding::Delimited) => self.open_delimited(line, renderer),
                None => {
                    renderer.render_line(line, RecordKind::Plain);
                    RecordKind::Plain
                }
            },
            kind => {
                renderer.render_line(line, kind);
                kind
            }
        }
    }

    fn route_serialized<R: Renderer>(&mut self, line: &str, renderer: &mut R) -> RecordKind {
        match extract_serialized(line) {
            Ok(extraction) => {
                self.classifier.reset();
                renderer.render_header(&extraction.header);
                for field in &extraction.fields {
                    let class = self.classifier.classify(field);
                    renderer.render_field(field, class);
                }
                renderer.record_end();
                RecordKind::StructuredCommand
            }
            Err(err) => {
                debug!(error = %err, "structured payload rejected, rendering raw line");
                renderer.render_line(line, RecordKind::Plain);
                RecordKind::Plain
            }
        }
    }

    fn open_delimited<R: Renderer>(&mut self, line: &str, renderer: &mut R) -> RecordKind {
        // Embedding::detect matched, so the phrase is present.
        let end = line
            .find(DELIMITED_HEADER)
            .map(|pos| pos + DELIMITED_HEADER.len())
            .unwrap_or(line.len());
        self.classifier.reset();
        renderer.render_header(&line[..end]);
        self.open_block = true;

        let rest = &line[end..];
        if !rest.trim().is_empty() {
            self.render_segments(rest, renderer);
            if rest.trim_end().ends_with('}') {
                self.close_block(renderer);
            }
        }
        RecordKind::StructuredCommand
    }

    fn route_block_line<R: Renderer>(&mut self, line: &str, renderer: &mut R) -> RecordKind {
        if line.trim() == "}" {
            renderer.render_literal(line);
            renderer.end_line();
            self.close_block(renderer);
            return RecordKind::StructuredCommand;
        }

        // Unrelated log output can land inside a block.
        if !line.contains(VALUE_START) {
            let kind = classify_line(line);
            if kind != RecordKind::Plain {
                renderer.render_line(line, kind);
                return kind;
            }
        }

        self.render_segments(line, renderer);
        RecordKind::StructuredCommand
    }

    fn render_segments<R: Renderer>(&mut self, text: &str, renderer: &mut R) {
        for segment in extract_delimited(text) {
            match segment {
                Segment::Literal(literal) => renderer.render_literal(&literal),
                Segment::Field(field) => {
                    let class = self.classifier.classify(&field);
                    renderer.render_inline_field(&field, class);
                }
            }
        }
        renderer.end_line();
    }

    fn close_block<R: Renderer>(&mut self, renderer: &mut R) {
        if self.open_block {
            self.open_block = false;
            renderer.record_end();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Line(String, RecordKind),
        Header(String),
        Field(String, String, Option<RenderClass>),
        Literal(String),
        Inline(String, String, Option<RenderClass>),
        EndLine,
        RecordEnd,
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl Recorder {
        fn fields(&self) -> Vec<(String, Option<RenderClass>)> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Field(name, _, class) | Event::Inline(name, _, class) => {
                        Some((name.clone(), *class))
                    }
                    _ => None,
                })
                .collect()
        }
    }

    impl Renderer for Recorder {
        fn render_line(&mut self, line: &str, kind: RecordKind) {
            self.events.push(Event::Line(line.to_string(), kind));
        }
        fn render_header(&mut self, text: &str) {
            self.events.push(Event::Header(text.to_string()));
        }
        fn render_field(&mut self, field: &ExtractedField, class: Option<RenderClass>) {
            self.events.push(Event::Field(
                field.name.clone(),
                field.value.to_string(),
                class,
            ));
        }
        fn render_literal(&mut self, text: &str) {
            self.events.push(Event::Literal(text.to_string()));
        }
        fn render_inline_field(&mut self, field: &ExtractedField, class: Option<RenderClass>) {
            self.events.push(Event::Inline(
                field.name.clone(),
                field.value.to_string(),
                class,
            ));
        }
        fn end_line(&mut self) {
            self.events.push(Event::EndLine);
        }
        fn record_end(&mut self) {
            self.events.push(Event::RecordEnd);
        }
    }

    #[test]
    fn priority_order() {
        assert_eq!(
            classify_line("Error: Successfully parsed command: {\"id\":\"1\"}"),
            RecordKind::StructuredCommand
        );
        assert_eq!(
            classify_line("Error: Parsed Message: ParsedCommand {"),
            RecordKind::StructuredCommand
        );
        assert_eq!(classify_line("ERROR WARN both"), RecordKind::Error);
        assert_eq!(classify_line("Warning: Sent late"), RecordKind::Warning);
        assert_eq!(classify_line("Sent FREE to client"), RecordKind::Info);
        assert_eq!(classify_line("Successfully connected"), RecordKind::Info);
        assert_eq!(classify_line("robot idle"), RecordKind::Plain);
    }

    #[test]
    fn serialized_record_is_classified() {
        let mut router = RecordRouter::new();
        let mut out = Recorder::default();
        let kind = router.route_line(
            r#"Successfully parsed command: {"actionType":"MOVE","J1":0.5}"#,
            &mut out,
        );

        assert_eq!(kind, RecordKind::StructuredCommand);
        assert_eq!(
            out.events,
            vec![
                Event::Header("Successfully parsed command:".into()),
                Event::Field("actionType".into(), "MOVE".into(), Some(RenderClass::Identity)),
                Event::Field("J1".into(), "0.5".into(), Some(RenderClass::AxisSlot(0))),
                Event::RecordEnd,
            ]
        );
    }

    #[test]
    fn malformed_payload_falls_back_to_plain() {
        let mut router = RecordRouter::new();
        let mut out = Recorder::default();
        let line = "Successfully parsed command: {bad json";
        assert_eq!(router.route_line(line, &mut out), RecordKind::Plain);
        assert_eq!(out.events, vec![Event::Line(line.into(), RecordKind::Plain)]);

        // The stream carries on normally.
        assert_eq!(router.route_line("Sent FREE", &mut out), RecordKind::Info);
    }

    #[test]
    fn each_serialized_line_is_its_own_record() {
        let mut router = RecordRouter::new();
        let mut out = Recorder::default();
        router.route_line(r#"Successfully parsed command: {"X":1,"Y":2}"#, &mut out);
        router.route_line(r#"Successfully parsed command: {"X":1}"#, &mut out);

        let classes: Vec<_> = out.fields().into_iter().map(|(_, c)| c).collect();
        assert_eq!(
            classes,
            vec![
                Some(RenderClass::AxisSlot(0)),
                Some(RenderClass::AxisSlot(1)),
                Some(RenderClass::AxisSlot(0)),
            ]
        );
    }

    fn parsed_command_block() -> String {
        [
            "Parsed Message: ParsedCommand {",
            "  ActionType: \u{1A}PTP_AXIS (1)\u{1B}",
            "  ID: \u{1A}abc-1\u{1B}",
            "  --- Movement Command ---",
            "  Axis Target Points (1):",
            "    Point 1: J1=\u{1A}0.1\u{1B}, J2=\u{1A}0.2\u{1B}, J3=\u{1A}0.3\u{1B}",
            "  Motion Parameters:",
            "    Speed Override: \u{1A}0.25\u{1B}",
            "    Tool: \u{1A}[Default]\u{1B}",
            "}",
        ]
        .join("\n")
            + "\n"
    }

    #[test]
    fn delimited_block_spans_lines() {
        let mut router = RecordRouter::new();
        let mut out = Recorder::default();
        router.route_chunk(parsed_command_block().as_bytes(), &mut out);

        assert!(!router.in_record());
        assert_eq!(out.events[0], Event::Header("Parsed Message: ParsedCommand {".into()));
        assert_eq!(out.events.last(), Some(&Event::RecordEnd));
        assert_eq!(
            out.events.iter().filter(|e| **e == Event::RecordEnd).count(),
            1
        );
        assert_eq!(
            out.fields(),
            vec![
                ("ActionType".to_string(), Some(RenderClass::Identity)),
                ("ID".to_string(), Some(RenderClass::Identity)),
                ("J1".to_string(), Some(RenderClass::AxisSlot(0))),
                ("J2".to_string(), Some(RenderClass::AxisSlot(1))),
                ("J3".to_string(), Some(RenderClass::AxisSlot(2))),
                ("Speed Override".to_string(), Some(RenderClass::ParamSlot(0))),
                ("Tool".to_string(), Some(RenderClass::ParamSlot(1))),
            ]
        );
    }

    #[test]
    fn delimited_block_survives_chunk_splits() {
        let block = parsed_command_block();
        let mut whole = Recorder::default();
        RecordRouter::new().route_chunk(block.as_bytes(), &mut whole);

        for split in [1, 7, 40, 100] {
            let mut router = RecordRouter::new();
            let mut out = Recorder::default();
            for chunk in block.as_bytes().chunks(split) {
                router.route_chunk(chunk, &mut out);
            }
            assert_eq!(out.events, whole.events, "split {split}");
        }
    }

    #[test]
    fn counters_reset_at_next_header() {
        let mut router = RecordRouter::new();
        let mut out = Recorder::default();
        let record = "ParsedCommand {\n  Point 1: X=\u{1A}1\u{1B}, Y=\u{1A}2\u{1B}\n}\n";
        router.route_chunk(record.as_bytes(), &mut out);
        router.route_chunk(record.as_bytes(), &mut out);

        let classes: Vec<_> = out.fields().into_iter().map(|(_, c)| c).collect();
        assert_eq!(
            classes,
            vec![
                Some(RenderClass::AxisSlot(0)),
                Some(RenderClass::AxisSlot(1)),
                Some(RenderClass::AxisSlot(0)),
                Some(RenderClass::AxisSlot(1)),
            ]
        );
    }

    #[test]
    fn new_header_closes_unterminated_block() {
        let mut router = RecordRouter::new();
        let mut out = Recorder::default();
        router.route_line("ParsedCommand {", &mut out);
        router.route_line("  ID: \u{1A}a\u{1B}", &mut out);
        router.route_line("ParsedCommand {", &mut out);

        assert!(router.in_record());
        assert_eq!(
            out.events.iter().filter(|e| **e == Event::RecordEnd).count(),
            1
        );
    }

    #[test]
    fn error_line_inside_block_keeps_its_kind() {
        let mut router = RecordRouter::new();
        let mut out = Recorder::default();
        router.route_line("ParsedCommand {", &mut out);
        let kind = router.route_line("Error: lost connection to drive", &mut out);

        assert_eq!(kind, RecordKind::Error);
        assert!(router.in_record());
    }

    #[test]
    fn single_line_delimited_record() {
        let mut router = RecordRouter::new();
        let mut out = Recorder::default();
        router.route_line("ParsedCommand { Program ID: \u{1A}42\u{1B} }", &mut out);

        assert!(!router.in_record());
        assert_eq!(
            out.fields(),
            vec![("Program ID".to_string(), Some(RenderClass::ParamSlot(0)))]
        );
    }

    #[test]
    fn flush_emits_partial_line_and_closes_record() {
        let mut router = RecordRouter::new();
        let mut out = Recorder::default();
        router.route_chunk(b"ParsedCommand {\n  ID: \x1aq\x1b", &mut out);
        assert!(router.in_record());
        router.flush(&mut out);

        assert!(!router.in_record());
        assert!(out
            .events
            .contains(&Event::Inline("ID".into(), "q".into(), Some(RenderClass::Identity))));
        assert_eq!(out.events.last(), Some(&Event::RecordEnd));
    }

    #[test]
    fn plain_lines_pass_through_unparsed() {
        let mut router = RecordRouter::new();
        let mut out = Recorder::default();
        router.route_chunk(b"Warning: joint limit near\nhello\n", &mut out);
        assert_eq!(
            out.events,
            vec![
                Event::Line("Warning: joint limit near".into(), RecordKind::Warning),
                Event::Line("hello".into(), RecordKind::Plain),
            ]
        );
    }
}

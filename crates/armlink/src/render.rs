//! Terminal and JSON renderers for the log stream.

use std::fmt;
use std::io::{self, Write};

use armlink_telemetry::{
    ExtractedField, FieldValue, GroupRole, RecordKind, RenderClass, Renderer, AXIS_CLASSES,
    PARAM_CLASSES,
};
use serde::Serialize;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const WHITE: &str = "\x1b[37m";
const IDENTITY: &str = "\x1b[1;35m";

const AXIS_PALETTE: [&str; AXIS_CLASSES] = [
    "\x1b[91m", "\x1b[92m", "\x1b[93m", "\x1b[94m", "\x1b[95m", "\x1b[96m", "\x1b[97m",
];

const PARAM_PALETTE: [&str; PARAM_CLASSES] =
    ["\x1b[32m", "\x1b[33m", "\x1b[34m", "\x1b[35m", "\x1b[36m"];

/// Colors are off with `--no-color`, with `NO_COLOR` set, or off a terminal.
pub fn colors_enabled(no_color: bool, is_terminal: bool) -> bool {
    if no_color || !is_terminal {
        return false;
    }
    std::env::var_os("NO_COLOR").is_none()
}

fn kind_color(kind: RecordKind) -> Option<&'static str> {
    match kind {
        RecordKind::Error => Some(RED),
        RecordKind::Warning => Some(YELLOW),
        RecordKind::Info => Some(CYAN),
        RecordKind::StructuredCommand => Some(BOLD),
        RecordKind::Plain => None,
    }
}

fn class_color(class: RenderClass) -> &'static str {
    match class {
        RenderClass::Identity => IDENTITY,
        RenderClass::AxisSlot(slot) => AXIS_PALETTE[slot % AXIS_CLASSES],
        RenderClass::ParamSlot(slot) => PARAM_PALETTE[slot % PARAM_CLASSES],
        RenderClass::DefaultString => GREEN,
        RenderClass::DefaultScalar => WHITE,
    }
}

/// A renderer over an output stream.
///
/// The first write error is kept and every later write is skipped, so a
/// closed stdout stops output instead of failing once per line.
pub trait OutputRenderer: Renderer {
    /// Take the write error that stopped output, if any.
    fn take_error(&mut self) -> Option<io::Error>;
}

/// Output stream that remembers its first failure.
struct Sticky<W> {
    out: W,
    failed: bool,
    error: Option<io::Error>,
}

impl<W: Write> Sticky<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            failed: false,
            error: None,
        }
    }

    fn put(&mut self, args: fmt::Arguments<'_>) {
        if !self.failed {
            let result = self.out.write_fmt(args);
            self.record(result);
        }
    }

    fn flush(&mut self) {
        if !self.failed {
            let result = self.out.flush();
            self.record(result);
        }
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(err) = result {
            self.failed = true;
            self.error = Some(err);
        }
    }
}

/// Writes log lines as text, colored by record kind and field class.
pub struct AnsiRenderer<W: Write> {
    out: Sticky<W>,
    color: bool,
}

impl<W: Write> AnsiRenderer<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out: Sticky::new(out),
            color,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out.out
    }

    fn paint(&mut self, text: &str, color: Option<&str>) {
        match color {
            Some(color) if self.color && !text.is_empty() => {
                self.out.put(format_args!("{color}{text}{RESET}"))
            }
            _ => self.out.put(format_args!("{text}")),
        }
    }

    fn newline(&mut self) {
        self.out.put(format_args!("\n"));
        self.out.flush();
    }
}

impl<W: Write> OutputRenderer for AnsiRenderer<W> {
    fn take_error(&mut self) -> Option<io::Error> {
        self.out.error.take()
    }
}

impl<W: Write> Renderer for AnsiRenderer<W> {
    fn render_line(&mut self, line: &str, kind: RecordKind) {
        self.paint(line, kind_color(kind));
        self.newline();
    }

    fn render_header(&mut self, text: &str) {
        self.paint(text, Some(BOLD));
        self.newline();
    }

    fn render_field(&mut self, field: &ExtractedField, class: Option<RenderClass>) {
        let indent = "  ".repeat(field.depth + 1);
        self.out.put(format_args!("{indent}"));
        if let FieldValue::Nested(_) = field.value {
            self.paint(&format!("{}:", field.name), Some(DIM));
        } else {
            self.out.put(format_args!("{}: ", field.name));
            self.paint(field.value.as_str(), class.map(class_color));
        }
        self.newline();
    }

    fn render_literal(&mut self, text: &str) {
        self.paint(text, None);
    }

    fn render_inline_field(&mut self, field: &ExtractedField, class: Option<RenderClass>) {
        self.paint(field.value.as_str(), class.map(class_color));
    }

    fn end_line(&mut self) {
        self.newline();
    }
}

#[derive(Serialize)]
struct LineEvent<'a> {
    kind: RecordKind,
    line: &'a str,
}

#[derive(Serialize)]
struct FieldEvent {
    name: String,
    #[serde(flatten)]
    value: FieldValue,
    depth: usize,
    #[serde(flatten)]
    class: Option<RenderClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<GroupRole>,
}

#[derive(Serialize)]
struct RecordEvent<'a> {
    kind: RecordKind,
    header: &'a str,
    fields: &'a [FieldEvent],
}

/// Writes one JSON object per log line or structured record.
pub struct JsonRenderer<W: Write> {
    out: Sticky<W>,
    record: Option<(String, Vec<FieldEvent>)>,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Sticky::new(out),
            record: None,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out.out
    }

    fn emit<T: Serialize>(&mut self, event: &T) {
        let text = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
        self.out.put(format_args!("{text}\n"));
        self.out.flush();
    }

    fn push_field(&mut self, field: &ExtractedField, class: Option<RenderClass>) {
        if let Some((_, fields)) = self.record.as_mut() {
            fields.push(FieldEvent {
                name: field.name.clone(),
                value: field.value.clone(),
                depth: field.depth,
                class,
                group: class.map(RenderClass::group_role),
            });
        }
    }
}

impl<W: Write> OutputRenderer for JsonRenderer<W> {
    fn take_error(&mut self) -> Option<io::Error> {
        self.out.error.take()
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render_line(&mut self, line: &str, kind: RecordKind) {
        self.emit(&LineEvent { kind, line });
    }

    fn render_header(&mut self, text: &str) {
        self.record = Some((text.trim().to_string(), Vec::new()));
    }

    fn render_field(&mut self, field: &ExtractedField, class: Option<RenderClass>) {
        self.push_field(field, class);
    }

    fn render_literal(&mut self, _text: &str) {}

    fn render_inline_field(&mut self, field: &ExtractedField, class: Option<RenderClass>) {
        self.push_field(field, class);
    }

    fn end_line(&mut self) {}

    fn record_end(&mut self) {
        if let Some((header, fields)) = self.record.take() {
            self.emit(&RecordEvent {
                kind: RecordKind::StructuredCommand,
                header: &header,
                fields: &fields,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use armlink_telemetry::RecordRouter;

    use super::*;

    const SERIALIZED: &str =
        "Successfully parsed command: {\"actionType\":\"PTP\",\"j1\":0.5,\"speed\":0.25}\n";

    fn ansi(input: &str, color: bool) -> String {
        let mut renderer = AnsiRenderer::new(Vec::new(), color);
        let mut router = RecordRouter::new();
        router.route_chunk(input.as_bytes(), &mut renderer);
        router.flush(&mut renderer);
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn plain_text_without_color() {
        let out = ansi("Error: lost\nhello\n", false);
        assert_eq!(out, "Error: lost\nhello\n");
    }

    #[test]
    fn lines_colored_by_kind() {
        let out = ansi("Error: lost\nWarning: hot\nConnected to 10.0.0.2\nhello\n", true);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], format!("{RED}Error: lost{RESET}"));
        assert_eq!(lines[1], format!("{YELLOW}Warning: hot{RESET}"));
        assert_eq!(lines[2], format!("{CYAN}Connected to 10.0.0.2{RESET}"));
        assert_eq!(lines[3], "hello");
    }

    #[test]
    fn serialized_fields_use_class_palettes() {
        let out = ansi(SERIALIZED, true);
        assert!(out.contains(&format!("actionType: {IDENTITY}PTP{RESET}")));
        assert!(out.contains(&format!("j1: {}0.5{RESET}", AXIS_PALETTE[0])));
        assert!(out.contains(&format!("speed: {}0.25{RESET}", PARAM_PALETTE[0])));
    }

    #[test]
    fn delimited_record_keeps_its_layout() {
        let input = "Parsed Message: ParsedCommand {\n  ID: \u{1a}abc\u{1b}\n    Point 1: J1=\u{1a}0.1\u{1b}, J2=\u{1a}0.2\u{1b}\n}\n";
        let out = ansi(input, false);
        assert_eq!(
            out,
            "Parsed Message: ParsedCommand {\n  ID: abc\n    Point 1: J1=0.1, J2=0.2\n}\n"
        );
    }

    #[test]
    fn json_renderer_emits_records() {
        let mut renderer = JsonRenderer::new(Vec::new());
        let mut router = RecordRouter::new();
        router.route_chunk(format!("ERROR bad\n{SERIALIZED}").as_bytes(), &mut renderer);

        let out = String::from_utf8(renderer.into_inner()).unwrap();
        let events: Vec<serde_json::Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["kind"], "error");
        assert_eq!(events[0]["line"], "ERROR bad");

        assert_eq!(events[1]["kind"], "structured_command");
        let fields = events[1]["fields"].as_array().unwrap();
        assert_eq!(fields[0]["name"], "actionType");
        assert_eq!(fields[0]["class"], "identity");
        assert_eq!(fields[1]["name"], "j1");
        assert_eq!(fields[1]["type"], "scalar");
        assert_eq!(fields[1]["value"], "0.5");
        assert_eq!(fields[1]["class"], "axis_slot");
        assert_eq!(fields[1]["slot"], 0);
        assert_eq!(fields[0]["group"]["role"], "scalar");
        assert_eq!(fields[1]["group"]["role"], "axis_slot");
        assert_eq!(fields[1]["group"]["slot"], 0);
        assert_eq!(fields[2]["name"], "speed");
        assert_eq!(fields[2]["group"]["role"], "param_slot");
    }

    /// Fails every call with a closed pipe and counts the attempts.
    #[derive(Default)]
    struct ClosedPipe {
        attempts: usize,
    }

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.attempts += 1;
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            self.attempts += 1;
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn closed_output_keeps_first_error_and_stops_writing() {
        let mut renderer = AnsiRenderer::new(ClosedPipe::default(), true);
        let mut router = RecordRouter::new();
        for _ in 0..3 {
            router.route_chunk(b"Error: lost
hello
", &mut renderer);
        }

        let err = renderer.take_error().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(renderer.into_inner().attempts, 1);
    }

    #[test]
    fn json_output_reports_write_failure() {
        let mut renderer = JsonRenderer::new(ClosedPipe::default());
        let mut router = RecordRouter::new();
        router.route_chunk(format!("one\ntwo\n{SERIALIZED}").as_bytes(), &mut renderer);

        assert_eq!(renderer.take_error().unwrap().kind(), io::ErrorKind::BrokenPipe);
        assert!(renderer.take_error().is_none());
        assert_eq!(renderer.into_inner().attempts, 1);
    }

    #[test]
    fn color_gate() {
        assert!(!colors_enabled(true, true));
        assert!(!colors_enabled(false, false));
    }
}

use std::io::{self, IsTerminal};

use armlink_peer::{
    ChunkSink, Connect, ConnectionState, StopHandle, TcpConnector, TelemetryClient,
    TelemetryConfig,
};
use armlink_telemetry::{ExtractedField, RecordKind, RecordRouter, RenderClass, Renderer};
use tracing::{debug, info, warn};

use crate::cmd::{parse_duration, Endpoint, MonitorArgs};
use crate::exit::{self, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::OutputFormat;
use crate::render::{colors_enabled, AnsiRenderer, JsonRenderer, OutputRenderer};

pub fn run(args: MonitorArgs, endpoint: &Endpoint, format: OutputFormat) -> CliResult<i32> {
    let config = TelemetryConfig {
        reconnect_delay: parse_duration(&args.reconnect_delay)?,
        hello: args.hello.as_ref().map(|hello| hello.as_bytes().to_vec()),
        ..TelemetryConfig::default()
    };
    let connector = TcpConnector::new(endpoint.log_addr()).with_timeout(parse_duration(&args.timeout)?);
    info!(addr = %connector.addr(), "following controller log");

    let stop = StopHandle::new();
    install_ctrlc_handler(stop.clone())?;
    let mut client = TelemetryClient::new(connector, config).with_stop_handle(stop.clone());

    let stdout = std::io::stdout();
    match format {
        OutputFormat::Json => {
            let renderer = JsonRenderer::new(stdout.lock());
            follow(&mut client, MonitorSink::new(renderer, args.count, stop))
        }
        OutputFormat::Raw => {
            let renderer = AnsiRenderer::new(stdout.lock(), false);
            follow(&mut client, MonitorSink::new(renderer, args.count, stop))
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            let color = colors_enabled(args.no_color, stdout.is_terminal());
            let renderer = AnsiRenderer::new(stdout.lock(), color);
            follow(&mut client, MonitorSink::new(renderer, args.count, stop))
        }
    }
}

fn follow<C: Connect, R: OutputRenderer>(
    client: &mut TelemetryClient<C>,
    mut sink: MonitorSink<R>,
) -> CliResult<i32> {
    let summary = client.run(&mut sink);
    debug!(
        attempts = summary.connect_attempts,
        sessions = summary.sessions,
        bytes = summary.bytes,
        "monitor finished"
    );
    match sink.error {
        Some(err) => Err(exit::io_error("write to stdout failed", err)),
        None => Ok(SUCCESS),
    }
}

fn install_ctrlc_handler(stop: StopHandle) -> CliResult<()> {
    ctrlc::set_handler(move || stop.stop()).map_err(|err| {
        CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
    })
}

/// Feeds stream chunks through the router into a renderer.
///
/// A failed write to the output stops the client; the error is kept for the
/// exit code.
struct MonitorSink<R> {
    router: RecordRouter,
    renderer: Limited<R>,
    error: Option<io::Error>,
}

impl<R: OutputRenderer> MonitorSink<R> {
    fn new(renderer: R, limit: Option<usize>, stop: StopHandle) -> Self {
        Self {
            router: RecordRouter::new(),
            renderer: Limited {
                inner: renderer,
                limit,
                seen: 0,
                stop,
            },
            error: None,
        }
    }

    fn check_output(&mut self) {
        if let Some(err) = self.renderer.inner.take_error() {
            warn!(error = %err, "output closed; stopping monitor");
            self.renderer.stop.stop();
            self.error.get_or_insert(err);
        }
    }
}

impl<R: OutputRenderer> ChunkSink for MonitorSink<R> {
    fn on_chunk(&mut self, chunk: &[u8]) {
        self.router.route_chunk(chunk, &mut self.renderer);
        self.check_output();
    }

    fn on_state(&mut self, state: ConnectionState) {
        debug!(%state, "log stream state");
        if state == ConnectionState::Disconnected {
            self.router.flush(&mut self.renderer);
            self.check_output();
        }
    }
}

/// Stops the client once `limit` records have been rendered and drops
/// everything after that.
struct Limited<R> {
    inner: R,
    limit: Option<usize>,
    seen: usize,
    stop: StopHandle,
}

impl<R> Limited<R> {
    fn done(&self) -> bool {
        self.limit.is_some_and(|limit| self.seen >= limit)
    }

    fn count_record(&mut self) {
        self.seen += 1;
        if self.done() {
            self.stop.stop();
        }
    }
}

impl<R: Renderer> Renderer for Limited<R> {
    fn render_line(&mut self, line: &str, kind: RecordKind) {
        if self.done() {
            return;
        }
        self.inner.render_line(line, kind);
        self.count_record();
    }

    fn render_header(&mut self, text: &str) {
        if !self.done() {
            self.inner.render_header(text);
        }
    }

    fn render_field(&mut self, field: &ExtractedField, class: Option<RenderClass>) {
        if !self.done() {
            self.inner.render_field(field, class);
        }
    }

    fn render_literal(&mut self, text: &str) {
        if !self.done() {
            self.inner.render_literal(text);
        }
    }

    fn render_inline_field(&mut self, field: &ExtractedField, class: Option<RenderClass>) {
        if !self.done() {
            self.inner.render_inline_field(field, class);
        }
    }

    fn end_line(&mut self) {
        if !self.done() {
            self.inner.end_line();
        }
    }

    fn record_end(&mut self) {
        if self.done() {
            return;
        }
        self.inner.record_end();
        self.count_record();
    }
}

//! Long-lived, self-healing telemetry stream.
//!
//! [`TelemetryClient::run`] connects, hands every chunk it reads to a
//! [`ChunkSink`], and on any fault drops the stream, waits a fixed delay and
//! connects again. It only returns once [`StopHandle::stop`] is called.

use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use armlink_transport::{LinkStream, ShutdownHandle, TcpTransport};
use tracing::{debug, info, warn};

use crate::error::{PeerError, Result};

/// Default controller port for the log stream.
pub const DEFAULT_LOG_PORT: u16 = 30003;

/// Default wait between connection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Default size of a single read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// Connection state of the telemetry client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        })
    }
}

/// Telemetry client behavior.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Fixed wait after a failed connect or a dropped stream.
    pub reconnect_delay: Duration,
    /// Upper bound on bytes per read.
    pub read_chunk_size: usize,
    /// Bytes written once right after each connect.
    pub hello: Option<Vec<u8>>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            hello: None,
        }
    }
}

/// Opens telemetry streams.
pub trait Connect {
    type Stream: Read + Write;

    fn connect(&mut self) -> Result<Self::Stream>;

    /// A handle that can abort a blocked read on `stream` from another thread.
    fn shutdown_handle(&self, _stream: &Self::Stream) -> Option<ShutdownHandle> {
        None
    }
}

/// Connects over TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
    timeout: Option<Duration>,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Connect for TcpConnector {
    type Stream = LinkStream;

    fn connect(&mut self) -> Result<LinkStream> {
        let stream = match self.timeout {
            Some(timeout) => TcpTransport::connect_timeout(&self.addr, timeout)?,
            None => TcpTransport::connect(&self.addr)?,
        };
        Ok(stream)
    }

    fn shutdown_handle(&self, stream: &LinkStream) -> Option<ShutdownHandle> {
        stream.shutdown_handle().ok()
    }
}

/// Receives what the client reads.
pub trait ChunkSink {
    /// Called with every chunk, before the next read is issued.
    fn on_chunk(&mut self, chunk: &[u8]);

    /// Called on every state transition.
    fn on_state(&mut self, _state: ConnectionState) {}
}

#[derive(Debug, Default)]
struct StopState {
    stopped: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
    live: Mutex<Option<ShutdownHandle>>,
}

/// Cooperative stop signal for a running [`TelemetryClient`].
///
/// Cloneable and `Send`; `stop` wakes a pending backoff wait and shuts down
/// the live socket so a blocked read returns.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    state: Arc<StopState>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.state.stopped.store(true, Ordering::SeqCst);
        {
            let _guard = self.state.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.state.wake.notify_all();
        }
        let live = self.state.live.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = live.as_ref() {
            handle.shutdown();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.state.stopped.load(Ordering::SeqCst)
    }

    /// Sleep for `delay` or until stopped. Returns true if stopped.
    fn wait(&self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        let mut guard = self.state.lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !self.is_stopped() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            guard = self
                .state
                .wake
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        self.is_stopped()
    }

    fn set_live(&self, handle: Option<ShutdownHandle>) {
        let mut live = self.state.live.lock().unwrap_or_else(PoisonError::into_inner);
        *live = handle;
    }
}

/// Counters from a finished [`TelemetryClient::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub connect_attempts: u64,
    pub sessions: u64,
    pub bytes: u64,
}

/// Reconnecting telemetry reader.
pub struct TelemetryClient<C> {
    connector: C,
    config: TelemetryConfig,
    stop: StopHandle,
    state: ConnectionState,
}

impl<C: Connect> TelemetryClient<C> {
    pub fn new(connector: C, config: TelemetryConfig) -> Self {
        Self {
            connector,
            config,
            stop: StopHandle::new(),
            state: ConnectionState::Disconnected,
        }
    }

    /// Use an existing stop handle, e.g. one shared with a signal handler.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Run until stopped. Connection faults are logged and retried forever.
    pub fn run<S: ChunkSink>(&mut self, sink: &mut S) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut failures: u64 = 0;

        while !self.stop.is_stopped() {
            self.set_state(ConnectionState::Connecting, sink);
            summary.connect_attempts += 1;

            let stream = match self.connector.connect() {
                Ok(stream) => stream,
                Err(err) => {
                    failures += 1;
                    self.set_state(ConnectionState::Disconnected, sink);
                    warn!(
                        attempt = failures,
                        class = err.class(),
                        error = %err,
                        retry_in = ?self.config.reconnect_delay,
                        "telemetry connect failed"
                    );
                    if self.stop.wait(self.config.reconnect_delay) {
                        break;
                    }
                    continue;
                }
            };

            failures = 0;
            summary.sessions += 1;
            self.stop.set_live(self.connector.shutdown_handle(&stream));
            // A stop that raced the connect found no socket to shut down.
            if self.stop.is_stopped() {
                self.stop.set_live(None);
                break;
            }

            self.set_state(ConnectionState::Connected, sink);
            info!("telemetry stream connected");

            let reason = self.session(stream, sink, &mut summary);
            self.stop.set_live(None);
            self.set_state(ConnectionState::Disconnected, sink);

            if self.stop.is_stopped() {
                debug!("telemetry stream stopped");
                break;
            }
            match &reason {
                PeerError::ConnectionClosed => info!("telemetry stream closed by controller"),
                other => warn!(class = other.class(), error = %other, "telemetry stream lost"),
            }
            if self.stop.wait(self.config.reconnect_delay) {
                break;
            }
        }

        self.set_state(ConnectionState::Disconnected, sink);
        summary
    }

    /// Read until the stream fails; returns why it ended.
    fn session<S: ChunkSink>(
        &mut self,
        mut stream: C::Stream,
        sink: &mut S,
        summary: &mut RunSummary,
    ) -> PeerError {
        if let Some(hello) = &self.config.hello {
            if let Err(err) = stream.write_all(hello).and_then(|()| stream.flush()) {
                return PeerError::from_io(err, None);
            }
        }

        let mut buf = vec![0u8; self.config.read_chunk_size.max(1)];
        loop {
            if self.stop.is_stopped() {
                return PeerError::Stopped;
            }
            match stream.read(&mut buf) {
                Ok(0) => return PeerError::ConnectionClosed,
                Ok(n) => {
                    summary.bytes += n as u64;
                    sink.on_chunk(&buf[..n]);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return PeerError::from_io(err, None),
            }
        }
    }

    fn set_state<S: ChunkSink>(&mut self, state: ConnectionState, sink: &mut S) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "telemetry state");
            self.state = state;
            sink.on_state(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    use super::*;

    enum Step {
        Refuse,
        Serve(Vec<&'static [u8]>),
        Reset,
    }

    /// Replays a list of connect outcomes, then stops the client.
    struct Scripted {
        steps: VecDeque<Step>,
        stop: StopHandle,
        written: Arc<Mutex<Vec<u8>>>,
    }

    struct ScriptedStream {
        chunks: VecDeque<&'static [u8]>,
        reset: bool,
        written: Arc<Mutex<Vec<u8>>>,
    }

    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) => Cursor::new(chunk).read(buf),
                None if self.reset => Err(std::io::Error::from(ErrorKind::ConnectionReset)),
                None => Ok(0),
            }
        }
    }

    impl Write for ScriptedStream {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Connect for Scripted {
        type Stream = ScriptedStream;

        fn connect(&mut self) -> Result<ScriptedStream> {
            let step = match self.steps.pop_front() {
                Some(step) => step,
                None => {
                    self.stop.stop();
                    Step::Refuse
                }
            };
            let stream = |chunks: Vec<&'static [u8]>, reset| ScriptedStream {
                chunks: chunks.into(),
                reset,
                written: self.written.clone(),
            };
            match step {
                Step::Refuse => Err(PeerError::Transport(
                    armlink_transport::TransportError::ConnectionRefused {
                        addr: "scripted".into(),
                    },
                )),
                Step::Serve(chunks) => Ok(stream(chunks, false)),
                Step::Reset => Ok(stream(Vec::new(), true)),
            }
        }
    }

    #[derive(Default)]
    struct Collect {
        states: Vec<ConnectionState>,
        chunks: Vec<Vec<u8>>,
    }

    impl ChunkSink for Collect {
        fn on_chunk(&mut self, chunk: &[u8]) {
            self.chunks.push(chunk.to_vec());
        }

        fn on_state(&mut self, state: ConnectionState) {
            self.states.push(state);
        }
    }

    fn scripted_client(steps: Vec<Step>, delay: Duration) -> (TelemetryClient<Scripted>, Arc<Mutex<Vec<u8>>>) {
        let stop = StopHandle::new();
        let written = Arc::new(Mutex::new(Vec::new()));
        let connector = Scripted {
            steps: steps.into(),
            stop: stop.clone(),
            written: written.clone(),
        };
        let config = TelemetryConfig {
            reconnect_delay: delay,
            ..TelemetryConfig::default()
        };
        let client = TelemetryClient::new(connector, config).with_stop_handle(stop);
        (client, written)
    }

    use ConnectionState::{Connected, Connecting, Disconnected};

    #[test]
    fn refused_three_times_then_connects() {
        let delay = Duration::from_millis(20);
        let (mut client, _) = scripted_client(
            vec![
                Step::Refuse,
                Step::Refuse,
                Step::Refuse,
                Step::Serve(vec![b"Successfully connected\n"]),
            ],
            delay,
        );
        let mut sink = Collect::default();

        let started = Instant::now();
        let summary = client.run(&mut sink);
        let elapsed = started.elapsed();

        assert_eq!(
            &sink.states[..8],
            &[
                Connecting,
                Disconnected,
                Connecting,
                Disconnected,
                Connecting,
                Disconnected,
                Connecting,
                Connected,
            ]
        );
        assert_eq!(sink.chunks, vec![b"Successfully connected\n".to_vec()]);
        assert_eq!(summary.sessions, 1);
        assert_eq!(summary.connect_attempts, 5);
        // Three refusals plus one dropped session, each followed by a wait.
        assert!(elapsed >= delay * 4, "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(5), "elapsed {elapsed:?}");
        assert_eq!(client.state(), Disconnected);
    }

    #[test]
    fn closed_stream_reconnects() {
        let (mut client, _) = scripted_client(
            vec![
                Step::Serve(vec![b"one\n"]),
                Step::Reset,
                Step::Serve(vec![b"two\n", b"three\n"]),
            ],
            Duration::from_millis(1),
        );
        let mut sink = Collect::default();
        let summary = client.run(&mut sink);

        assert_eq!(summary.sessions, 3);
        assert_eq!(
            sink.chunks,
            vec![b"one\n".to_vec(), b"two\n".to_vec(), b"three\n".to_vec()]
        );
        let connected = sink.states.iter().filter(|s| **s == Connected).count();
        assert_eq!(connected, 3);
        // Every session ends in Disconnected before the next attempt.
        for pair in sink.states.windows(2) {
            if pair[0] == Connected {
                assert_eq!(pair[1], Disconnected);
            }
        }
    }

    #[test]
    fn hello_sent_after_each_connect() {
        let (client, written) = scripted_client(
            vec![Step::Serve(Vec::new()), Step::Serve(Vec::new())],
            Duration::from_millis(1),
        );
        let mut client = TelemetryClient {
            config: TelemetryConfig {
                hello: Some(b"hi\n".to_vec()),
                ..client.config.clone()
            },
            ..client
        };
        client.run(&mut Collect::default());

        assert_eq!(written.lock().unwrap().as_slice(), b"hi\nhi\n");
    }

    #[test]
    fn stop_interrupts_backoff() {
        struct AlwaysRefuse;
        impl Connect for AlwaysRefuse {
            type Stream = Cursor<Vec<u8>>;
            fn connect(&mut self) -> Result<Cursor<Vec<u8>>> {
                Err(PeerError::ConnectionClosed)
            }
        }

        let mut client = TelemetryClient::new(
            AlwaysRefuse,
            TelemetryConfig {
                reconnect_delay: Duration::from_secs(30),
                ..TelemetryConfig::default()
            },
        );
        let stop = client.stop_handle();
        let started = Instant::now();
        let worker = thread::spawn(move || client.run(&mut Collect::default()));

        thread::sleep(Duration::from_millis(50));
        stop.stop();
        let summary = worker.join().unwrap();

        assert_eq!(summary.connect_attempts, 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    struct Notify(mpsc::Sender<ConnectionState>);

    impl ChunkSink for Notify {
        fn on_chunk(&mut self, _chunk: &[u8]) {}

        fn on_state(&mut self, state: ConnectionState) {
            let _ = self.0.send(state);
        }
    }

    #[test]
    fn stop_unblocks_a_pending_read() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = thread::spawn(move || {
            // Hold the connection open without writing.
            let (stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1];
            let _ = (&stream).read(&mut buf);
        });

        let mut client = TelemetryClient::new(TcpConnector::new(addr), TelemetryConfig::default());
        let stop = client.stop_handle();
        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || client.run(&mut Notify(tx)));

        loop {
            let state = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            if state == Connected {
                break;
            }
        }
        let started = Instant::now();
        stop.stop();
        let summary = worker.join().unwrap();

        assert_eq!(summary.sessions, 1);
        assert!(started.elapsed() < Duration::from_secs(2));
        server.join().unwrap();
    }
}

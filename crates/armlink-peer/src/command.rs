use std::io::{Read, Write};
use std::time::Duration;

use armlink_command::{CommandEncoder, CommandIntent, EncoderConfig, Response};
use armlink_frame::{FrameConfig, FrameReader, FrameWriter};
use armlink_transport::{LinkStream, TcpTransport};
use tracing::{debug, warn};

use crate::error::{PeerError, Result};

/// Default controller port for the command channel.
pub const DEFAULT_COMMAND_PORT: u16 = 30001;

/// Command channel behavior.
#[derive(Debug, Clone)]
pub struct CommandChannelConfig {
    /// Frame limits and socket timeouts. `read_timeout` bounds the wait for
    /// each response.
    pub frame: FrameConfig,
    /// Give up connecting after this long. `None` waits for the OS.
    pub connect_timeout: Option<Duration>,
    /// Read the controller's status frame (`FREE|0#`) right after connecting.
    pub await_greeting: bool,
    pub encoder: EncoderConfig,
}

impl Default for CommandChannelConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig {
                read_timeout: Some(Duration::from_secs(30)),
                write_timeout: Some(Duration::from_secs(5)),
                ..FrameConfig::default()
            },
            connect_timeout: Some(Duration::from_secs(5)),
            await_greeting: true,
            encoder: EncoderConfig::default(),
        }
    }
}

/// Synchronous request/response link to the controller.
///
/// One request is in flight at a time: [`send`](Self::send) takes `&mut self`
/// and does not return until the response frame has been read. Once an
/// exchange fails on the wire (timeout, reset, close) a late reply may still
/// be in flight, so every later request fails with [`PeerError::Broken`].
pub struct CommandChannel<R = LinkStream, W = LinkStream> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    encoder: CommandEncoder,
    greeting: Option<Response>,
    read_timeout: Option<Duration>,
    broken: bool,
}

impl CommandChannel {
    /// Connect to the controller at `addr` (`host:port`).
    pub fn connect(addr: &str, config: CommandChannelConfig) -> Result<Self> {
        let stream = match config.connect_timeout {
            Some(timeout) => TcpTransport::connect_timeout(addr, timeout)?,
            None => TcpTransport::connect(addr)?,
        };
        let reader_stream = stream.try_clone()?;

        let reader = FrameReader::with_config_link(reader_stream, config.frame.clone())?;
        let writer = FrameWriter::with_config_link(stream, config.frame.clone())?;
        debug!(%addr, "command channel connected");

        Self::from_parts(reader, writer, config)
    }
}

impl<R: Read, W: Write> CommandChannel<R, W> {
    /// Build a channel over an already connected reader/writer pair.
    pub fn from_parts(
        reader: FrameReader<R>,
        writer: FrameWriter<W>,
        config: CommandChannelConfig,
    ) -> Result<Self> {
        let mut channel = Self {
            reader,
            writer,
            encoder: CommandEncoder::new(config.encoder),
            greeting: None,
            read_timeout: config.frame.read_timeout,
            broken: false,
        };

        if config.await_greeting {
            let greeting = channel.read_response()?;
            debug!(status = ?greeting.status, text = %greeting.text, "controller greeting");
            channel.greeting = Some(greeting);
        }
        Ok(channel)
    }

    /// Status frame sent by the controller on connect, if one was awaited.
    pub fn greeting(&self) -> Option<&Response> {
        self.greeting.as_ref()
    }

    /// True once a failed exchange has left the channel out of step.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn encoder(&self) -> &CommandEncoder {
        &self.encoder
    }

    /// Encode and send a command, then wait for its response.
    ///
    /// Validation errors are returned before anything is written.
    pub fn send(&mut self, intent: &CommandIntent) -> Result<Response> {
        let payload = self.encoder.encode(intent)?;
        debug!(id = %intent.id(), %payload, "sending command");

        let response = self.request(payload.as_bytes())?;
        if let Some(detail) = response.detail.as_deref() {
            let echoed = detail != "0" && !detail.is_empty();
            if echoed && detail != intent.id().as_str() {
                warn!(
                    sent = %intent.id(),
                    received = %detail,
                    "response id does not match request"
                );
            }
        }
        Ok(response)
    }

    /// Send a raw payload and wait for one response frame.
    pub fn request(&mut self, payload: &[u8]) -> Result<Response> {
        if self.broken {
            return Err(PeerError::Broken);
        }
        if let Err(err) = self.writer.send(payload) {
            return Err(self.fail(err));
        }
        self.read_response()
    }

    fn fail(&mut self, err: armlink_frame::FrameError) -> PeerError {
        let err = PeerError::from_frame(err, self.read_timeout);
        warn!(class = err.class(), error = %err, "command exchange failed; channel marked broken");
        self.broken = true;
        err
    }

    fn read_response(&mut self) -> Result<Response> {
        loop {
            let frame = match self.reader.read_frame() {
                Ok(frame) => frame,
                Err(err) => return Err(self.fail(err)),
            };
            let text = frame.text();
            // Line endings between frames show up as blank payloads.
            if text.trim().is_empty() {
                continue;
            }
            let response = Response::parse(&text);
            debug!(status = ?response.status, text = %response.text, "received response");
            return Ok(response);
        }
    }
}

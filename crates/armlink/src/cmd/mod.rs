use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod call;
pub mod decode;
pub mod dispatch;
pub mod io;
pub mod monitor;
pub mod motion;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a PTP, LIN or CIRC motion.
    Move(MoveArgs),
    /// Set a digital output.
    Io(IoArgs),
    /// Start a program stored on the controller.
    Call(CallArgs),
    /// Follow the controller log stream.
    Monitor(MonitorArgs),
    /// Parse a command payload and show its slots.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Where the controller listens.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub host: String,
    pub command_port: u16,
    pub log_port: u16,
}

impl Endpoint {
    pub fn command_addr(&self) -> String {
        join_host_port(&self.host, self.command_port)
    }

    pub fn log_addr(&self) -> String {
        join_host_port(&self.host, self.log_port)
    }
}

fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

pub fn run(command: Command, endpoint: &Endpoint, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Move(args) => motion::run(args, endpoint, format),
        Command::Io(args) => io::run(args, endpoint, format),
        Command::Call(args) => call::run(args, endpoint, format),
        Command::Monitor(args) => monitor::run(args, endpoint, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args, format),
    }
}

/// Options shared by every command that talks to the command port.
#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Connect timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// How long to wait for the controller's reply.
    #[arg(long, default_value = "30s")]
    pub response_timeout: String,
    /// Do not wait for the status frame sent on connect.
    #[arg(long)]
    pub no_greeting: bool,
    /// Encode and print the payload without connecting.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FamilyArg {
    Ptp,
    Lin,
    Circ,
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Interpolation family.
    #[arg(value_enum)]
    pub family: FamilyArg,
    /// Target point: 7 joint values or X,Y,Z,A,B,C. Repeat for CIRC and paths.
    #[arg(long = "point", short = 'p', value_name = "VALUES", required = true)]
    pub points: Vec<String>,
    /// Blend into the next motion instead of stopping.
    #[arg(long)]
    pub continuous: bool,
    /// Tool name (controller default when omitted).
    #[arg(long)]
    pub tool: Option<String>,
    /// Base name (controller default when omitted).
    #[arg(long)]
    pub base: Option<String>,
    /// Speed override fraction, 0.0 to 1.0.
    #[arg(long, default_value_t = armlink_command::intent::DEFAULT_SPEED)]
    pub speed: f64,
    /// Rotational values are in degrees.
    #[arg(long)]
    pub degrees: bool,
    /// Command id (generated when omitted).
    #[arg(long)]
    pub id: Option<String>,
    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct IoArgs {
    /// Output pin.
    pub pin: String,
    /// on|off|true|false
    #[arg(value_parser = parse_switch, action = clap::ArgAction::Set)]
    pub state: bool,
    /// Command id (generated when omitted).
    #[arg(long)]
    pub id: Option<String>,
    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Program name or number.
    pub program: String,
    /// Command id (generated when omitted).
    #[arg(long)]
    pub id: Option<String>,
    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Wait between reconnect attempts (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub reconnect_delay: String,
    /// Connect timeout for each attempt.
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// Text sent once after each connect.
    #[arg(long)]
    pub hello: Option<String>,
    /// Exit after N log records.
    #[arg(long)]
    pub count: Option<usize>,
    /// Disable ANSI colors (also honors NO_COLOR).
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Payload as sent on the wire; the `#` terminator is optional.
    pub payload: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_switch(input: &str) -> Result<bool, String> {
    match input.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "high" => Ok(true),
        "off" | "false" | "0" | "low" => Ok(false),
        other => Err(format!("expected on or off, got {other:?}")),
    }
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

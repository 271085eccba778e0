mod cmd;
mod exit;
mod logging;
mod output;
mod render;

use clap::Parser;

use crate::cmd::{Command, Endpoint};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "armlink", version, about = "Motion controller command and log client")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Controller host name or address.
    #[arg(long, env = "ARMLINK_HOST", default_value = "127.0.0.1", global = true)]
    host: String,

    /// Command channel port.
    #[arg(long, env = "ARMLINK_COMMAND_PORT", default_value_t = armlink_peer::DEFAULT_COMMAND_PORT, global = true)]
    command_port: u16,

    /// Log stream port.
    #[arg(long, env = "ARMLINK_LOG_PORT", default_value_t = armlink_peer::DEFAULT_LOG_PORT, global = true)]
    log_port: u16,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let endpoint = Endpoint {
        host: cli.host,
        command_port: cli.command_port,
        log_port: cli.log_port,
    };
    let result = cmd::run(cli.command, &endpoint, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_move_with_points() {
        let cli = Cli::try_parse_from([
            "armlink",
            "move",
            "circ",
            "-p",
            "0,0,0,0,0,0",
            "--point",
            "1;1;1;0;0;0",
            "--speed",
            "0.5",
        ])
        .expect("move args should parse");

        match cli.command {
            Command::Move(args) => {
                assert_eq!(args.points.len(), 2);
                assert_eq!(args.speed, 0.5);
                assert!(!args.connect.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn move_requires_a_point() {
        let err = Cli::try_parse_from(["armlink", "move", "ptp"])
            .expect_err("missing point should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_io_state_words() {
        let cli = Cli::try_parse_from(["armlink", "io", "3", "off", "--id", "x1"])
            .expect("io args should parse");
        match cli.command {
            Command::Io(args) => {
                assert!(!args.state);
                assert_eq!(args.id.as_deref(), Some("x1"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_endpoint_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "armlink",
            "monitor",
            "--host",
            "10.0.0.5",
            "--log-port",
            "40001",
            "--count",
            "3",
        ])
        .expect("monitor args should parse");
        assert_eq!(cli.host, "10.0.0.5");
        assert_eq!(cli.log_port, 40001);
        assert!(matches!(cli.command, Command::Monitor(_)));
    }
}

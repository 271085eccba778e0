use armlink_command::{CommandEncoder, CommandIntent, EncoderConfig};
use armlink_peer::{CommandChannel, CommandChannelConfig};
use tracing::{debug, warn};

use crate::cmd::{parse_duration, ConnectArgs, Endpoint};
use crate::exit::{command_error, peer_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_payload, print_response, OutputFormat};

/// Encode `intent`, send it unless `--dry-run`, and print the outcome.
///
/// A controller `ERROR` reply exits with [`FAILURE`].
pub fn send_intent(
    intent: CommandIntent,
    encoder: EncoderConfig,
    connect: &ConnectArgs,
    endpoint: &Endpoint,
    format: OutputFormat,
) -> CliResult<i32> {
    let payload = CommandEncoder::new(encoder)
        .encode(&intent)
        .map_err(|err| command_error("invalid command", err))?;

    if connect.dry_run {
        print_payload(&intent, &payload, format);
        return Ok(SUCCESS);
    }

    let mut config = CommandChannelConfig {
        connect_timeout: Some(parse_duration(&connect.timeout)?),
        await_greeting: !connect.no_greeting,
        encoder,
        ..CommandChannelConfig::default()
    };
    config.frame.read_timeout = Some(parse_duration(&connect.response_timeout)?);

    let addr = endpoint.command_addr();
    let mut channel =
        CommandChannel::connect(&addr, config).map_err(|err| peer_error("connect failed", err))?;
    if let Some(greeting) = channel.greeting() {
        if !greeting.is_free() {
            warn!(greeting = %greeting.text, "controller is not free");
        }
    }

    let response = channel
        .send(&intent)
        .map_err(|err| peer_error("send failed", err))?;
    debug!(%addr, id = %intent.id(), status = ?response.status, "command answered");
    print_response(&intent, &payload, &response, format);

    if response.is_error() {
        return Ok(FAILURE);
    }
    Ok(SUCCESS)
}

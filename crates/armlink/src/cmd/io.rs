use armlink_command::{EncoderConfig, IoCommand};

use crate::cmd::dispatch::send_intent;
use crate::cmd::{Endpoint, IoArgs};
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub fn run(args: IoArgs, endpoint: &Endpoint, format: OutputFormat) -> CliResult<i32> {
    let mut command = IoCommand::new(args.pin, args.state);
    if let Some(id) = args.id {
        command.id = id.into();
    }
    send_intent(
        command.into(),
        EncoderConfig::default(),
        &args.connect,
        endpoint,
        format,
    )
}

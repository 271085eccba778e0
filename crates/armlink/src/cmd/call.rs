use armlink_command::{EncoderConfig, SubroutineCall};

use crate::cmd::dispatch::send_intent;
use crate::cmd::{CallArgs, Endpoint};
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub fn run(args: CallArgs, endpoint: &Endpoint, format: OutputFormat) -> CliResult<i32> {
    let mut call = SubroutineCall::new(args.program);
    if let Some(id) = args.id {
        call.id = id.into();
    }
    send_intent(
        call.into(),
        EncoderConfig::default(),
        &args.connect,
        endpoint,
        format,
    )
}

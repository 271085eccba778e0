use armlink_command::decode_command;

use crate::cmd::DecodeArgs;
use crate::exit::{command_error, CliResult, SUCCESS};
use crate::output::{print_decoded, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let decoded =
        decode_command(&args.payload).map_err(|err| command_error("decode failed", err))?;
    print_decoded(&decoded, format);
    Ok(SUCCESS)
}

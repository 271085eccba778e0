use armlink_command::{AngleUnit, EncoderConfig, MotionCommand, MotionFamily, Point};

use crate::cmd::dispatch::send_intent;
use crate::cmd::{Endpoint, FamilyArg, MoveArgs};
use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub fn run(args: MoveArgs, endpoint: &Endpoint, format: OutputFormat) -> CliResult<i32> {
    let points = args
        .points
        .iter()
        .map(|raw| parse_point(raw))
        .collect::<CliResult<Vec<_>>>()?;

    let family = match args.family {
        FamilyArg::Ptp => MotionFamily::Ptp,
        FamilyArg::Lin => MotionFamily::Lin,
        FamilyArg::Circ => MotionFamily::Circ,
    };
    let mut command = MotionCommand::from_points(family, args.continuous, points)
        .with_tool(args.tool.unwrap_or_default())
        .with_base(args.base.unwrap_or_default())
        .with_speed(args.speed);
    if let Some(id) = args.id {
        command = command.with_id(id);
    }

    let encoder = EncoderConfig {
        angle_unit: if args.degrees {
            AngleUnit::Degrees
        } else {
            AngleUnit::Radians
        },
    };
    send_intent(command.into(), encoder, &args.connect, endpoint, format)
}

/// Components may be separated by `,` or `;`.
fn parse_point(raw: &str) -> CliResult<Point> {
    let values = raw
        .split([',', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f64>()
                .map_err(|_| CliError::new(USAGE, format!("invalid point value {part:?} in {raw:?}")))
        })
        .collect::<CliResult<Vec<f64>>>()?;
    Ok(Point::new(values))
}

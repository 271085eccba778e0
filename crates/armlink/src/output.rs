use std::io::{IsTerminal, Write};

use armlink_command::{CommandIntent, DecodedCommand, Response, ResponseStatus};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct CommandOutput<'a> {
    id: &'a str,
    payload: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<&'a Response>,
    sent: bool,
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Print an encoded command that was not sent (`--dry-run`).
pub fn print_payload(intent: &CommandIntent, payload: &str, format: OutputFormat) {
    print_command(intent, payload, None, format);
}

/// Print a sent command and the controller's reply.
pub fn print_response(
    intent: &CommandIntent,
    payload: &str,
    response: &Response,
    format: OutputFormat,
) {
    print_command(intent, payload, Some(response), format);
}

fn print_command(
    intent: &CommandIntent,
    payload: &str,
    response: Option<&Response>,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => print_json(&CommandOutput {
            id: intent.id().as_str(),
            payload,
            response,
            sent: response.is_some(),
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "PAYLOAD", "STATUS", "REPLY"])
                .add_row(vec![
                    intent.id().to_string(),
                    payload.to_string(),
                    response.map_or("not sent", |r| status_name(r.status)).to_string(),
                    response.map(|r| r.text.clone()).unwrap_or_default(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match response {
            Some(response) => println!(
                "id={} status={} reply={} payload={}",
                intent.id(),
                status_name(response.status),
                response.text,
                payload
            ),
            None => println!("id={} payload={}", intent.id(), payload),
        },
        OutputFormat::Raw => match response {
            Some(response) => print_raw(format!("{}\n", response.text).as_bytes()),
            None => print_raw(format!("{payload}#\n").as_bytes()),
        },
    }
}

fn status_name(status: ResponseStatus) -> &'static str {
    match status {
        ResponseStatus::Free => "FREE",
        ResponseStatus::Error => "ERROR",
        ResponseStatus::Other => "OTHER",
    }
}

pub fn print_decoded(decoded: &DecodedCommand, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(decoded),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (name, value) in decoded_rows(decoded) {
                table.add_row(vec![name, value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for (name, value) in decoded_rows(decoded) {
                println!("{name}: {value}");
            }
        }
    }
}

fn decoded_rows(decoded: &DecodedCommand) -> Vec<(String, String)> {
    let mut rows = vec![
        ("action".to_string(), decoded.action.to_string()),
        ("points".to_string(), decoded.point_count.to_string()),
    ];
    for (index, point) in decoded.points.iter().enumerate() {
        let values: Vec<String> = point.values().iter().map(f64::to_string).collect();
        rows.push((format!("point {}", index + 1), values.join(", ")));
    }
    if let Some(io) = &decoded.io {
        rows.push(("io point".to_string(), io.point.clone()));
        rows.push(("io pin".to_string(), io.pin.clone()));
        rows.push(("io state".to_string(), io.state.to_string()));
    }
    if let Some(program) = &decoded.program {
        rows.push(("program".to_string(), program.clone()));
    }
    if !decoded.tool.is_empty() {
        rows.push(("tool".to_string(), decoded.tool.clone()));
    }
    if !decoded.base.is_empty() {
        rows.push(("base".to_string(), decoded.base.clone()));
    }
    if let Some(speed) = decoded.speed {
        rows.push(("speed".to_string(), speed.to_string()));
    }
    rows.push(("id".to_string(), decoded.id.clone()));
    rows
}

#[cfg(test)]
mod tests {
    use armlink_command::decode_command;

    use super::*;

    #[test]
    fn decoded_rows_for_io() {
        let decoded = decode_command("10|0||0|7|true|||0|abc#").unwrap();
        let rows = decoded_rows(&decoded);
        assert_eq!(rows.first().unwrap().1, "ACTIVATE_IO (10)");
        assert!(rows.contains(&("io pin".to_string(), "7".to_string())));
        assert!(rows.contains(&("io state".to_string(), "true".to_string())));
        assert_eq!(rows.last().unwrap(), &("id".to_string(), "abc".to_string()));
    }

    #[test]
    fn decoded_rows_list_points() {
        let decoded = decode_command("1|1|0;0;0;0;0;0;0.5||||tool0|base0|0.25|m1").unwrap();
        let rows = decoded_rows(&decoded);
        assert!(rows.contains(&("point 1".to_string(), "0, 0, 0, 0, 0, 0, 0.5".to_string())));
        assert!(rows.contains(&("tool".to_string(), "tool0".to_string())));
    }
}

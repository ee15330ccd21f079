use serde_json::Value;

use crate::cli::ResampleArgs;
use crate::error::CliError;
use crate::input::{parse_number, read_signals, Signal};

use super::CommandResult;

pub fn run(args: &ResampleArgs) -> Result<CommandResult, CliError> {
    let loaded = read_signals(&args.input.input)?;
    let signal = loaded.find(&args.signal)?;

    let timebase: Vec<f64> = match &args.onto {
        Some(name) => loaded.find(name)?.series().timestamps().to_vec(),
        None if !args.timestamps.is_empty() => args.timestamps.clone(),
        None => {
            return Err(CliError::Command(String::from(
                "resample needs --onto <signal> or --timestamps",
            )))
        }
    };
    let default = match &args.default {
        Some(token) => Some(
            parse_number(token)
                .ok_or_else(|| CliError::Command(format!("invalid default value '{token}'")))?,
        ),
        None => None,
    };

    let data: Value = match signal {
        Signal::Boolean { flags: series, .. } => serde_json::to_value(series.resample(&timebase, default)?)?,
        other => serde_json::to_value(other.series().resample(&timebase, default)?)?,
    };
    Ok(CommandResult::ok(data).with_warnings(loaded.warnings.clone()))
}

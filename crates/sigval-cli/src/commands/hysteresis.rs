use crate::cli::HysteresisArgs;
use crate::error::CliError;
use crate::input::read_signals;

use super::CommandResult;

pub fn run(args: &HysteresisArgs) -> Result<CommandResult, CliError> {
    let loaded = read_signals(&args.input.input)?;
    let signal = loaded.find(&args.signal)?;

    let flags = signal.series().hysteresis(args.catch, args.drop)?;
    let on_samples = flags.values().iter().filter(|value| **value == 1.0).count();

    let data = serde_json::json!({
        "series": flags,
        "on_samples": on_samples,
    });
    Ok(CommandResult::ok(data).with_warnings(loaded.warnings.clone()))
}

use sigval_core::CompareOp;

use crate::cli::CompareArgs;
use crate::error::CliError;
use crate::input::{read_signals, Signal};

use super::CommandResult;

pub fn run(args: &CompareArgs) -> Result<CommandResult, CliError> {
    let loaded = read_signals(&args.input.input)?;
    let lhs = loaded.find(&args.lhs)?;
    let rhs = loaded.operand(&args.rhs)?;
    let op = CompareOp::parse(&args.op)
        .ok_or_else(|| CliError::Command(format!("unknown comparison '{}'", args.op)))?;

    let mut result = match lhs {
        Signal::Boolean { flags, .. } => flags.compare(op, rhs)?,
        other => other.series().compare(op, rhs)?,
    };
    if let Some(name) = &args.name {
        result.set_name(name.clone());
    }

    let data = serde_json::to_value(&result)?;
    Ok(CommandResult::ok(data).with_warnings(loaded.warnings.clone()))
}

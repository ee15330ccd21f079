use sigval_core::ArithmeticOp;

use crate::cli::ArithArgs;
use crate::error::CliError;
use crate::input::{read_signals, Signal};

use super::CommandResult;

pub fn run(args: &ArithArgs) -> Result<CommandResult, CliError> {
    let loaded = read_signals(&args.input.input)?;
    let lhs = loaded.find(&args.lhs)?;
    let rhs = loaded.operand(&args.rhs)?;

    let mut result = match args.op.trim() {
        "**" | "pow" => match lhs {
            Signal::Boolean { flags, .. } => flags.pow(rhs)?,
            other => other.series().pow(rhs)?,
        },
        token => {
            let op = ArithmeticOp::parse(token)
                .ok_or_else(|| CliError::Command(format!("unknown operator '{token}'")))?;
            match lhs {
                Signal::Boolean { flags, .. } => flags.apply(op, rhs)?,
                other => other.series().apply(op, rhs)?,
            }
        }
    };
    if let Some(name) = &args.name {
        result.set_name(name.clone());
    }

    let mut command_result =
        CommandResult::ok(serde_json::to_value(&result)?).with_warnings(loaded.warnings.clone());
    if result.is_empty() && !lhs.series().is_empty() {
        command_result = command_result.with_warning(format!(
            "result '{}' is empty: operands share no timestamps",
            result.name()
        ));
    }
    Ok(command_result)
}

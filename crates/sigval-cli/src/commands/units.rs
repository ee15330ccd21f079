use sigval_warehouse::Warehouse;

use crate::error::CliError;

use super::CommandResult;

pub fn run(warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let units = warehouse.units()?;
    let data = serde_json::json!({ "units": units });
    Ok(CommandResult::ok(data))
}

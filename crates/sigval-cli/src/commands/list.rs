use sigval_warehouse::Warehouse;

use crate::error::CliError;

use super::CommandResult;

pub fn run(warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let results = warehouse.list_results()?;
    let data = serde_json::json!({
        "count": results.len(),
        "results": results,
    });
    Ok(CommandResult::ok(data))
}

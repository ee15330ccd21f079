use serde::Serialize;
use serde_json::Value;
use sigval_core::{ResultKind, UtcDateTime};
use sigval_warehouse::Warehouse;

use crate::cli::LoadArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct LoadResponseData {
    id: i64,
    kind: ResultKind,
    created_at: UtcDateTime,
    result: Value,
}

pub fn run(args: &LoadArgs, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let stored = warehouse.load_result(args.id)?;

    let result = match stored.kind {
        ResultKind::Scalar => serde_json::to_value(warehouse.load_scalar(args.id)?)?,
        ResultKind::Vector => serde_json::to_value(warehouse.load_vector(args.id)?)?,
        ResultKind::Series => serde_json::to_value(warehouse.load_series(args.id)?)?,
        ResultKind::BooleanSeries => {
            serde_json::to_value(warehouse.load_boolean_series(args.id)?)?
        }
        ResultKind::PercentageSeries => {
            serde_json::to_value(warehouse.load_percentage_series(args.id)?)?
        }
        ResultKind::Histogram => serde_json::to_value(warehouse.load_histogram(args.id)?)?,
    };

    let data = serde_json::to_value(LoadResponseData {
        id: stored.id,
        kind: stored.kind,
        created_at: stored.created_at,
        result,
    })?;
    Ok(CommandResult::ok(data))
}

use serde::Serialize;
use sigval_core::ResultKind;
use sigval_warehouse::Warehouse;

use crate::cli::StoreArgs;
use crate::error::CliError;
use crate::input::{read_signals, Signal};

use super::CommandResult;

#[derive(Debug, Serialize)]
struct StoredSignal {
    id: i64,
    name: String,
    kind: ResultKind,
}

pub fn run(args: &StoreArgs, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let loaded = read_signals(&args.input.input)?;
    let selected: Vec<&Signal> = if args.signal.is_empty() {
        loaded.signals.iter().collect()
    } else {
        args.signal
            .iter()
            .map(|name| loaded.find(name))
            .collect::<Result<_, _>>()?
    };

    let mut stored = Vec::with_capacity(selected.len());
    for signal in selected {
        let (id, kind) = match signal {
            Signal::Numeric(series) => (warehouse.store_series(series)?, ResultKind::Series),
            Signal::Boolean { flags, .. } => {
                (warehouse.store_boolean_series(flags)?, ResultKind::BooleanSeries)
            }
            Signal::Percentage(series) => {
                (warehouse.store_percentage_series(series)?, ResultKind::PercentageSeries)
            }
        };
        stored.push(StoredSignal {
            id,
            name: signal.name().to_owned(),
            kind,
        });
    }

    let data = serde_json::json!({
        "db_path": warehouse.db_path(),
        "stored": stored,
    });
    Ok(CommandResult::ok(data).with_warnings(loaded.warnings.clone()))
}

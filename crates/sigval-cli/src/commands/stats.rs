use serde::Serialize;

use crate::cli::StatsArgs;
use crate::error::CliError;
use crate::input::{read_signals, Signal, SignalKind};

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SignalStats<'a> {
    name: &'a str,
    kind: SignalKind,
    unit: &'a str,
    samples: usize,
    range: [f64; 2],
    start: Option<f64>,
    end: Option<f64>,
    mean: Option<f64>,
    std_dev: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
    first_over_threshold: Option<f64>,
    last_over_threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
struct StatsResponseData<'a> {
    threshold: Option<f64>,
    signals: Vec<SignalStats<'a>>,
}

pub fn run(args: &StatsArgs) -> Result<CommandResult, CliError> {
    let loaded = read_signals(&args.input.input)?;
    let selected: Vec<&Signal> = match &args.signal {
        Some(name) => vec![loaded.find(name)?],
        None => loaded.signals.iter().collect(),
    };

    let signals = selected
        .into_iter()
        .map(|signal| {
            let series = signal.series();
            SignalStats {
                name: series.name(),
                kind: signal.kind(),
                unit: series.unit().label.as_str(),
                samples: series.len(),
                range: [series.range_min(), series.range_max()],
                start: series.start_timestamp(),
                end: series.end_timestamp(),
                mean: series.mean(),
                std_dev: series.std_dev(),
                min: series.min(),
                max: series.max(),
                first_over_threshold: series.first_over_threshold(args.threshold),
                last_over_threshold: series.last_over_threshold(args.threshold),
            }
        })
        .collect();

    let data = serde_json::to_value(StatsResponseData {
        threshold: args.threshold,
        signals,
    })?;
    Ok(CommandResult::ok(data).with_warnings(loaded.warnings.clone()))
}

use std::fs;

use serde::Serialize;
use sigval_core::{BinSpec, HistogramSummary};

use crate::cli::HistogramArgs;
use crate::error::CliError;
use crate::input::read_signals;

use super::{plot_options, renderer, CommandResult};

#[derive(Debug, Serialize)]
struct HistogramResponseData<'a> {
    histogram: &'a HistogramSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    chart: Option<String>,
}

pub fn run(args: &HistogramArgs, pretty: bool) -> Result<CommandResult, CliError> {
    let loaded = read_signals(&args.input.input)?;
    let signal = loaded.find(&args.signal)?;

    let bins = if args.edges.is_empty() {
        BinSpec::from(args.bins)
    } else {
        BinSpec::from(args.edges.clone())
    };
    let histogram = signal.series().histogram(bins, args.normalize)?;

    let chart = match &args.chart {
        Some(path) => {
            let rendered = histogram.render(
                renderer(args.render.renderer, pretty).as_ref(),
                &plot_options(&args.render),
            )?;
            fs::write(path, &rendered.bytes)?;
            Some(path.display().to_string())
        }
        None => None,
    };

    let data = serde_json::to_value(HistogramResponseData {
        histogram: &histogram,
        chart,
    })?;
    Ok(CommandResult::ok(data).with_warnings(loaded.warnings.clone()))
}

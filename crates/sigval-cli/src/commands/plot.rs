use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use sigval_core::{ChartFormat, TimeSeries};

use crate::cli::PlotArgs;
use crate::error::CliError;
use crate::input::read_signals;

use super::{plot_options, renderer, CommandResult};

#[derive(Debug, Serialize)]
struct PlotResponseData {
    name: String,
    format: ChartFormat,
    path: PathBuf,
    bytes: usize,
}

pub fn run(args: &PlotArgs, pretty: bool) -> Result<CommandResult, CliError> {
    let loaded = read_signals(&args.input.input)?;
    let master = loaded.find(&args.signal)?.series();
    let companions = args
        .companions
        .iter()
        .map(|name| loaded.find(name).map(|signal| signal.series()))
        .collect::<Result<Vec<&TimeSeries>, _>>()?;

    let renderer = renderer(args.render.renderer, pretty);
    let mut options = plot_options(&args.render);
    options.scatter = args.scatter;

    let mut command_result = CommandResult::ok(serde_json::Value::Null);
    let chart = if args.xy {
        if args.timebase.is_some() {
            command_result = command_result.with_warning("--timebase is ignored for x/y plots");
        }
        master.plot_xy(&companions, renderer.as_ref(), &options)?
    } else {
        let timebase = match &args.timebase {
            Some(name) => Some(loaded.find(name)?.series().timestamps()),
            None => None,
        };
        for companion in &companions {
            if !companion.unit().same_dimension(master.unit()) {
                command_result = command_result.with_warning(format!(
                    "companion '{}' has unit {} instead of {}, not plotted",
                    companion.name(),
                    companion.unit(),
                    master.unit()
                ));
            }
        }
        master.plot(&companions, timebase, renderer.as_ref(), &options)?
    };

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.{}", chart.name, chart.format.extension())));
    fs::write(&path, &chart.bytes)?;

    command_result.data = serde_json::to_value(PlotResponseData {
        name: chart.name,
        format: chart.format,
        path,
        bytes: chart.bytes.len(),
    })?;
    Ok(command_result.with_warnings(loaded.warnings.clone()))
}

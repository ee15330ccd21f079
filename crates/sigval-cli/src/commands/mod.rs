mod arith;
mod compare;
mod histogram;
mod hysteresis;
mod list;
mod load;
mod plot;
mod resample;
mod stats;
mod store;
mod units;

use std::time::Instant;

use serde_json::Value;
use sigval_core::{
    ChartRenderer, ChartSize, Envelope, EnvelopeMeta, JsonChartRenderer, PlotOptions,
    SvgChartRenderer,
};
use sigval_warehouse::{Warehouse, WarehouseConfig};
use tracing::debug;

use crate::cli::{Cli, Command, RenderArgs, RendererKind};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

pub fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();

    let command_result = match &cli.command {
        Command::Stats(args) => stats::run(args)?,
        Command::Arith(args) => arith::run(args)?,
        Command::Compare(args) => compare::run(args)?,
        Command::Resample(args) => resample::run(args)?,
        Command::Hysteresis(args) => hysteresis::run(args)?,
        Command::Histogram(args) => histogram::run(args, cli.pretty)?,
        Command::Plot(args) => plot::run(args, cli.pretty)?,
        Command::Store(args) => store::run(args, &open_warehouse(cli)?)?,
        Command::Load(args) => load::run(args, &open_warehouse(cli)?)?,
        Command::List => list::run(&open_warehouse(cli)?)?,
        Command::Units => units::run(&open_warehouse(cli)?)?,
    };

    let CommandResult { data, warnings } = command_result;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let mut meta = EnvelopeMeta::generate(elapsed_ms);
    for warning in warnings {
        meta.push_warning(warning);
    }

    Envelope::with_errors(meta, data, Vec::new()).map_err(CliError::from)
}

fn open_warehouse(cli: &Cli) -> Result<Warehouse, CliError> {
    let config = match &cli.db {
        Some(path) => WarehouseConfig::with_db_path(path),
        None => WarehouseConfig::default(),
    };
    debug!(path = %config.db_path.display(), "opening warehouse");
    Ok(Warehouse::open(config)?)
}

fn renderer(kind: RendererKind, pretty: bool) -> Box<dyn ChartRenderer> {
    match kind {
        RendererKind::Svg => Box::new(SvgChartRenderer),
        RendererKind::Json => Box::new(JsonChartRenderer { pretty }),
    }
}

fn plot_options(args: &RenderArgs) -> PlotOptions {
    PlotOptions {
        size: ChartSize {
            width: args.width,
            height: args.height,
        },
        ..PlotOptions::default()
    }
}

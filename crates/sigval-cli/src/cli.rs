//! CLI argument definitions for sigval.
//!
//! Every signal command reads a JSON signal document (see [`crate::input`])
//! and prints an envelope on stdout. Diagnostics go to stderr.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stats` | Summary statistics of one or all signals |
//! | `arith` | Sample-wise arithmetic between a signal and a signal or number |
//! | `compare` | Sample-wise comparison into a boolean series |
//! | `resample` | Redefine a signal on another timebase |
//! | `hysteresis` | Two-threshold classification into a boolean series |
//! | `histogram` | Histogram summary of a signal's values |
//! | `plot` | Render a time or x/y chart to a file |
//! | `store` | Persist signals in the warehouse |
//! | `load` | Read a stored result back |
//! | `list` | List stored results |
//! | `units` | List the unit catalog |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings as errors |
//! | `--verbose` | `false` | Debug diagnostics on stderr |
//! | `--db` | `$SIGVAL_HOME/cache/warehouse.duckdb` | Warehouse database file |
//!
//! # Examples
//!
//! ```bash
//! sigval stats --input drive.json --threshold 10
//! sigval arith --input drive.json speed / 3.6 --name speed_ms
//! sigval hysteresis --input drive.json speed --catch 5 --drop 3 --pretty
//! sigval plot --input drive.json speed --with target --output speed.svg
//! sigval store --input drive.json --db /tmp/results.duckdb
//! ```

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// sigval - range-checked signal values with units
#[derive(Debug, Parser)]
#[command(
    name = "sigval",
    author,
    version,
    about = "Range-checked signal values with units",
    long_about = "sigval evaluates time-indexed measurement signals: statistics, \
arithmetic and comparison over aligned timestamps, resampling, hysteresis, \
histograms and charts, with results persisted in a local DuckDB warehouse.\n\
\n\
Use 'sigval <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Emit debug diagnostics on stderr (overridden by SIGVAL_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Warehouse database file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text for terminal display.
    Table,
    /// Single JSON object output.
    Json,
}

/// Chart renderer selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererKind {
    /// Standalone SVG document.
    Svg,
    /// The chart request as JSON, for external renderers.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Summary statistics of one or all signals.
    ///
    /// # Examples
    ///
    ///   sigval stats --input drive.json
    ///   sigval stats --input drive.json --signal speed --threshold 10
    Stats(StatsArgs),

    /// Sample-wise arithmetic over shared timestamps.
    ///
    /// The right-hand side is another signal's name or a number.
    /// Operators: + - * / // max min **
    ///
    /// # Examples
    ///
    ///   sigval arith --input drive.json speed + offset
    ///   sigval arith --input drive.json speed '**' 2
    Arith(ArithArgs),

    /// Sample-wise comparison into a boolean series.
    ///
    /// Operators: lt le eq ne ge gt (or < <= == != >= >)
    Compare(CompareArgs),

    /// Redefine a signal on another signal's timestamps or an explicit list.
    Resample(ResampleArgs),

    /// Two-threshold classification into a boolean series.
    Hysteresis(HysteresisArgs),

    /// Histogram summary of a signal's values.
    Histogram(HistogramArgs),

    /// Render a chart of one signal and its companions.
    Plot(PlotArgs),

    /// Persist signals in the warehouse.
    Store(StoreArgs),

    /// Read a stored result back.
    Load(LoadArgs),

    /// List stored results.
    List,

    /// List the unit catalog.
    Units,
}

/// Input document shared by the signal commands.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// JSON signal document, or '-' for stdin.
    #[arg(long, short)]
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Restrict to one signal.
    #[arg(long)]
    pub signal: Option<String>,

    /// Threshold for the first/last-over-threshold values.
    #[arg(long)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Args)]
pub struct ArithArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Left-hand signal.
    pub lhs: String,

    /// Operator.
    pub op: String,

    /// Right-hand signal name or number.
    #[arg(allow_hyphen_values = true)]
    pub rhs: String,

    /// Name of the result.
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub input: InputArgs,

    pub lhs: String,

    pub op: String,

    /// Right-hand signal name or number.
    #[arg(allow_hyphen_values = true)]
    pub rhs: String,

    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct ResampleArgs {
    #[command(flatten)]
    pub input: InputArgs,

    pub signal: String,

    /// Signal whose timestamps become the new timebase.
    #[arg(long, conflicts_with = "timestamps")]
    pub onto: Option<String>,

    /// Explicit timestamps in microseconds.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub timestamps: Vec<f64>,

    /// Fill value for timestamps without a sample; integer series need an
    /// integer.
    #[arg(long, allow_hyphen_values = true)]
    pub default: Option<String>,
}

#[derive(Debug, Args)]
pub struct HysteresisArgs {
    #[command(flatten)]
    pub input: InputArgs,

    pub signal: String,

    /// Switch-on threshold.
    #[arg(long, allow_hyphen_values = true)]
    pub catch: f64,

    /// Switch-off threshold; must not exceed the catch threshold.
    #[arg(long, allow_hyphen_values = true)]
    pub drop: f64,
}

#[derive(Debug, Args)]
pub struct HistogramArgs {
    #[command(flatten)]
    pub input: InputArgs,

    pub signal: String,

    /// Number of equal-width bins, at most `sigval_core::MAX_BINS`.
    #[arg(
        long,
        default_value_t = 10,
        conflicts_with = "edges",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=sigval_core::MAX_BINS as u64)
    )]
    pub bins: usize,

    /// Explicit bin edges.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub edges: Vec<f64>,

    /// Counts as percentages of all counted values.
    #[arg(long, default_value_t = false)]
    pub normalize: bool,

    /// Also render the histogram chart to this file.
    #[arg(long)]
    pub chart: Option<PathBuf>,

    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(Debug, Args)]
pub struct PlotArgs {
    #[command(flatten)]
    pub input: InputArgs,

    pub signal: String,

    /// Companion signals drawn alongside (or on the y axis with --xy).
    #[arg(long = "with", value_delimiter = ',')]
    pub companions: Vec<String>,

    /// Plot the companions against the signal instead of against time.
    #[arg(long, default_value_t = false)]
    pub xy: bool,

    /// Signal whose timestamps become the time axis.
    #[arg(long)]
    pub timebase: Option<String>,

    /// Draw markers instead of lines.
    #[arg(long, default_value_t = false)]
    pub scatter: bool,

    /// Output file; defaults to '<signal>.<svg|json>'.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub render: RenderArgs,
}

/// Chart output options.
#[derive(Debug, Args)]
pub struct RenderArgs {
    #[arg(long, value_enum, default_value_t = RendererKind::Svg)]
    pub renderer: RendererKind,

    /// Image width in pixels.
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Image height in pixels.
    #[arg(long, default_value_t = 480)]
    pub height: u32,
}

#[derive(Debug, Args)]
pub struct StoreArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Store only these signals.
    #[arg(long, value_delimiter = ',')]
    pub signal: Vec<String>,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Result id.
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_arith_with_global_flags() {
        let cli = Cli::try_parse_from([
            "sigval", "arith", "--input", "drive.json", "speed", "/", "3.6", "--pretty", "--strict",
        ])
        .expect("arguments should parse");

        assert!(cli.pretty);
        assert!(cli.strict);
        let Command::Arith(args) = cli.command else {
            panic!("expected arith");
        };
        assert_eq!((args.lhs.as_str(), args.op.as_str(), args.rhs.as_str()), ("speed", "/", "3.6"));
    }

    #[test]
    fn resample_rejects_both_timebases() {
        let err = Cli::try_parse_from([
            "sigval", "resample", "-i", "d.json", "speed", "--onto", "target", "--timestamps", "0,1",
        ])
        .expect_err("must fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn histogram_bins_are_bounded() {
        let cli = Cli::try_parse_from(["sigval", "histogram", "-i", "d.json", "speed", "--bins", "10000"])
            .expect("arguments should parse");
        let Command::Histogram(args) = cli.command else {
            panic!("expected histogram");
        };
        assert_eq!(args.bins, 10_000);

        for bins in ["0", "10000000000"] {
            let err = Cli::try_parse_from(["sigval", "histogram", "-i", "d.json", "speed", "--bins", bins])
                .expect_err("must fail");
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }
}

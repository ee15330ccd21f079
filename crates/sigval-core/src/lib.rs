//! Core value model for sigval.
//!
//! This crate contains:
//! - Units with composition and dimension checks
//! - Scalar values, range-bounded vectors and time-indexed series
//! - Series algebra over aligned timestamps (arithmetic, comparison,
//!   logic, resampling, hysteresis)
//! - Histogram summaries
//! - The pack contract used for persistence, and the unit catalog seam
//! - The chart rendering seam and the response envelope
//!
//! | Container | Range | Time-indexed | Pack layout |
//! |-----------|-------|--------------|-------------|
//! | [`ScalarValue`] | none | no | `[value]` |
//! | [`BoundedVector`] | mandatory | no | `[min, max, values...]` |
//! | [`TimeSeries`] | mandatory | yes | `[min, max, values...]` |
//! | [`BooleanTimeSeries`] | `[0, 1]` | yes | `[0, 1, values...]` |
//! | [`PercentageTimeSeries`] | `[0, 100]` | yes | `[0, 100, values...]` |
//! | [`HistogramSummary`] | n/a | no | `[max, min, sigma, mean, (edge, count)...]` |

pub mod catalog;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod histogram;
pub mod pack;
pub mod plot;
pub mod signal;

// Values
pub use domain::{
    known_label, BoundedVector, BoundedVectorBuilder, Number, ScalarValue, Unit, UtcDateTime,
    ValueDomain, KNOWN_UNITS,
};
pub use histogram::{BinSpec, HistogramSummary, PlotConfig, MAX_BINS};
pub use signal::arithmetic::ArithmeticOp;
pub use signal::compare::CompareOp;
pub use signal::operand::Operand;
pub use signal::{
    BooleanTimeSeries, PercentageTimeSeries, SeriesValues, TimeSeries, TimeSeriesBuilder,
    Timestamp,
};

// Persistence seams
pub use catalog::{CatalogError, InMemoryUnitCatalog, UnitCatalog, UnitIdCache, UnitKey, UnitRecord};
pub use pack::{Pack, Packed, ResultKind};

// Charts
pub use plot::{
    BarOrientation, BoxStats, ChartFormat, ChartKind, ChartRenderer, ChartRequest, ChartSeries,
    ChartSize, Extent, JsonChartRenderer, PlotOptions, RenderedChart, SvgChartRenderer,
};

// Envelope and errors
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};
pub use error::{CoreError, PackError, PlotError, SignalError, UnitError, ValidationError};

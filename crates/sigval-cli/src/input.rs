//! JSON signal documents.
//!
//! ```json
//! {
//!   "signals": [
//!     { "name": "speed", "unit": "meters_per_second", "values": [0, 3.5, 7],
//!       "timestamps": [0, 1000000, 2000000], "range": [0, 60] },
//!     { "name": "braking", "kind": "boolean", "values": [0, 1, 1],
//!       "timestamps": [0, 1000000, 2000000] }
//!   ]
//! }
//! ```
//!
//! `unit` is a unit name and defaults to `none`. `range` is required for
//! numeric signals; boolean and percentage signals have fixed ranges.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sigval_core::{
    BooleanTimeSeries, Number, Operand, PercentageTimeSeries, TimeSeries, Timestamp, Unit,
};

use crate::error::CliError;

#[derive(Debug, Clone, Deserialize)]
pub struct SignalDocument {
    pub signals: Vec<SignalSpec>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    #[default]
    Numeric,
    Boolean,
    Percentage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalSpec {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub kind: SignalKind,
    pub values: Vec<Number>,
    pub timestamps: Vec<Timestamp>,
    #[serde(default)]
    pub range: Option<[Number; 2]>,
    #[serde(default)]
    pub default: Option<Number>,
}

/// A signal built from its spec.
///
/// Boolean signals carry a plain numeric copy for read-only views (stats,
/// plots, histograms) and for use as a right-hand operand. Arithmetic with
/// a boolean on the left always goes through `flags`.
#[derive(Debug, Clone)]
pub enum Signal {
    Numeric(TimeSeries),
    Boolean {
        flags: BooleanTimeSeries,
        numeric: TimeSeries,
    },
    Percentage(PercentageTimeSeries),
}

impl Signal {
    pub fn series(&self) -> &TimeSeries {
        match self {
            Self::Numeric(series) => series,
            Self::Boolean { numeric, .. } => numeric,
            Self::Percentage(series) => series.as_series(),
        }
    }

    pub fn name(&self) -> &str {
        self.series().name()
    }

    pub fn kind(&self) -> SignalKind {
        match self {
            Self::Numeric(_) => SignalKind::Numeric,
            Self::Boolean { .. } => SignalKind::Boolean,
            Self::Percentage(_) => SignalKind::Percentage,
        }
    }

    pub fn operand(&self) -> Operand<'_> {
        Operand::Series(self.series())
    }
}

/// Signals of a document plus construction warnings.
#[derive(Debug, Clone)]
pub struct LoadedSignals {
    pub signals: Vec<Signal>,
    pub warnings: Vec<String>,
}

impl LoadedSignals {
    pub fn find(&self, name: &str) -> Result<&Signal, CliError> {
        self.signals
            .iter()
            .find(|signal| signal.name() == name)
            .ok_or_else(|| CliError::Command(format!("signal '{name}' not found in input")))
    }

    /// A signal reference or a numeric literal.
    pub fn operand(&self, token: &str) -> Result<Operand<'_>, CliError> {
        if let Some(number) = parse_number(token) {
            return Ok(Operand::Number(number));
        }
        self.find(token).map(Signal::operand)
    }
}

pub fn read_signals(path: &Path) -> Result<LoadedSignals, CliError> {
    let text = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(path)?
    };
    parse_signals(&text)
}

pub fn parse_signals(text: &str) -> Result<LoadedSignals, CliError> {
    let document: SignalDocument =
        serde_json::from_str(text).map_err(|error| CliError::Input(error.to_string()))?;

    let mut signals = Vec::with_capacity(document.signals.len());
    let mut warnings = Vec::new();
    for spec in document.signals {
        if signals.iter().any(|signal: &Signal| signal.name() == spec.name) {
            return Err(CliError::Input(format!("duplicate signal name '{}'", spec.name)));
        }
        if spec.values.len() != spec.timestamps.len() {
            warnings.push(format!(
                "signal '{}': {} values for {} timestamps, truncated to the shorter",
                spec.name,
                spec.values.len(),
                spec.timestamps.len()
            ));
        }
        let signal = build_signal(spec)?;
        signals.push(signal);
    }

    Ok(LoadedSignals { signals, warnings })
}

fn build_signal(spec: SignalSpec) -> Result<Signal, CliError> {
    let SignalSpec {
        name,
        unit,
        kind,
        values,
        timestamps,
        range,
        default,
    } = spec;

    let signal = match kind {
        SignalKind::Numeric => {
            let Some([min, max]) = range else {
                return Err(CliError::Input(format!("numeric signal '{name}' needs a range")));
            };
            let unit = unit.as_deref().map_or_else(Unit::none, Unit::from_name);
            Signal::Numeric(TimeSeries::new(name, unit, values, timestamps, min, max, default)?)
        }
        SignalKind::Boolean => {
            let flags = BooleanTimeSeries::new(name, values, timestamps)?;
            let numeric = numeric_copy(&flags)?;
            Signal::Boolean { flags, numeric }
        }
        SignalKind::Percentage => {
            Signal::Percentage(PercentageTimeSeries::new(name, values, timestamps, default)?)
        }
    };
    Ok(signal)
}

fn numeric_copy(flags: &BooleanTimeSeries) -> Result<TimeSeries, CliError> {
    let values: Vec<Number> = flags.values().iter().map(|value| Number::Int(*value as i64)).collect();
    let series = TimeSeries::new(
        flags.name(),
        flags.unit().clone(),
        values,
        flags.timestamps().to_vec(),
        0,
        1,
        Some(Number::Int(0)),
    )?;
    Ok(series)
}

/// Integers stay integers so that they keep the integer domain.
pub fn parse_number(token: &str) -> Option<Number> {
    let token = token.trim();
    if let Ok(value) = token.parse::<i64>() {
        return Some(Number::Int(value));
    }
    token
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(Number::Float)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRIVE: &str = r#"{
        "signals": [
            { "name": "speed", "unit": "meters_per_second", "values": [0, 3.5, 7],
              "timestamps": [0, 1000000, 2000000], "range": [0, 60] },
            { "name": "braking", "kind": "boolean", "values": [0, 1, 1, 0],
              "timestamps": [0, 1000000, 2000000] }
        ]
    }"#;

    #[test]
    fn builds_signals_of_each_kind() {
        let loaded = parse_signals(DRIVE).expect("document should parse");

        let speed = loaded.find("speed").expect("speed");
        assert_eq!(speed.kind(), SignalKind::Numeric);
        assert_eq!(speed.series().unit().label, "m/s");
        assert_eq!(speed.series().values(), &[0.0, 3.5, 7.0]);

        let braking = loaded.find("braking").expect("braking");
        assert_eq!(braking.kind(), SignalKind::Boolean);
        assert_eq!(braking.series().len(), 3);
        assert_eq!(loaded.warnings.len(), 1);
    }

    #[test]
    fn boolean_signal_keeps_guardrails_next_to_its_numeric_copy() {
        let loaded = parse_signals(DRIVE).expect("document should parse");

        let Signal::Boolean { flags, numeric } = loaded.find("braking").expect("braking") else {
            panic!("braking should load as a boolean signal");
        };
        assert_eq!(numeric.values(), flags.values());
        assert_eq!(numeric.timestamps(), flags.timestamps());
        assert_eq!(numeric.unit(), flags.unit());
        assert!(flags.apply(sigval_core::ArithmeticOp::Add, flags).is_err());
    }

    #[test]
    fn numeric_signal_without_range_is_rejected() {
        let err = parse_signals(
            r#"{"signals": [{"name": "x", "values": [1], "timestamps": [0]}]}"#,
        )
        .expect_err("must fail");
        assert!(matches!(err, CliError::Input(_)));
    }

    #[test]
    fn operand_tokens_resolve_to_numbers_or_signals() {
        let loaded = parse_signals(DRIVE).expect("document should parse");

        assert!(matches!(loaded.operand("3"), Ok(Operand::Number(Number::Int(3)))));
        assert!(matches!(loaded.operand("-2.5"), Ok(Operand::Number(Number::Float(_)))));
        assert!(matches!(loaded.operand("speed"), Ok(Operand::Series(_))));
        assert!(matches!(loaded.operand("nan"), Err(CliError::Command(_))));
    }
}

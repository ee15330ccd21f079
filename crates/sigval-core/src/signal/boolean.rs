//! Series constrained to `{0, 1}`.
//!
//! Logical operators are the only algebra allowed. Arithmetic, negation,
//! ordering comparisons and element-wise min/max are refused with
//! [`SignalError::NotPossibleForBoolean`]; equality comparisons still work.

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Sub};

use serde::Serialize;
use tracing::{error, warn};

use super::arithmetic::ArithmeticOp;
use super::compare::CompareOp;
use super::operand::Operand;
use super::{intersect, TimeSeries, Timestamp};
use crate::pack::{Pack, Packed, ResultKind};
use crate::{Number, PackError, SignalError, Unit, ValidationError, ValueDomain};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BooleanTimeSeries {
    series: TimeSeries,
}

impl BooleanTimeSeries {
    /// Builds a boolean series from numbers; nonzero values become 1.
    pub fn new(
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Number>>,
        timestamps: Vec<Timestamp>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let mut coerced = 0_usize;
        let values: Vec<Number> = values
            .into_iter()
            .map(|value| {
                let raw = value.into().as_f64();
                if raw != 0.0 && raw != 1.0 {
                    coerced += 1;
                }
                Number::Int(i64::from(raw != 0.0))
            })
            .collect();
        if coerced > 0 {
            warn!(series = %name, coerced, "non-binary values coerced to 1");
        }

        let series = TimeSeries::new(
            name,
            Unit::binary(),
            values,
            timestamps,
            0,
            1,
            Some(Number::Int(0)),
        )?;
        Ok(Self { series })
    }

    pub fn from_bools(
        name: impl Into<String>,
        values: &[bool],
        timestamps: Vec<Timestamp>,
    ) -> Result<Self, ValidationError> {
        Self::new(name, values.iter().copied(), timestamps)
    }

    /// Values must already be 0 or 1 and timestamps sorted and unique.
    pub(crate) fn from_parts(name: String, values: Vec<f64>, timestamps: Vec<Timestamp>) -> Self {
        Self {
            series: TimeSeries::from_parts(
                name,
                Unit::binary(),
                values,
                timestamps,
                0.0,
                1.0,
                ValueDomain::Integer,
                0.0,
            ),
        }
    }

    fn wrap(series: TimeSeries) -> Self {
        Self { series }
    }

    /// The numeric view. Crate-private so the guardrails cannot be skipped.
    pub(crate) fn as_series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn name(&self) -> &str {
        self.series.name()
    }

    pub fn unit(&self) -> &Unit {
        self.series.unit()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.series.set_name(name);
    }

    pub fn values(&self) -> &[f64] {
        self.series.values()
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        self.series.timestamps()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn value_at(&self, timestamp: Timestamp) -> Option<f64> {
        self.series.value_at(timestamp)
    }

    pub fn is_true_at(&self, timestamp: Timestamp) -> Option<bool> {
        self.value_at(timestamp).map(|value| value == 1.0)
    }

    pub fn start_timestamp(&self) -> Option<Timestamp> {
        self.series.start_timestamp()
    }

    pub fn end_timestamp(&self) -> Option<Timestamp> {
        self.series.end_timestamp()
    }

    /// Share of samples that are 1.
    pub fn mean(&self) -> Option<f64> {
        self.series.mean()
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.series.std_dev()
    }

    pub fn max(&self) -> Option<f64> {
        self.series.max()
    }

    pub fn min(&self) -> Option<f64> {
        self.series.min()
    }

    pub fn add_sample(&mut self, timestamp: Timestamp, value: bool) -> bool {
        self.series.add_sample(timestamp, value)
    }

    pub fn and(&self, other: &BooleanTimeSeries) -> BooleanTimeSeries {
        self.logical(other, "and", |a, b| a && b)
    }

    pub fn or(&self, other: &BooleanTimeSeries) -> BooleanTimeSeries {
        self.logical(other, "or", |a, b| a || b)
    }

    pub fn xor(&self, other: &BooleanTimeSeries) -> BooleanTimeSeries {
        self.logical(other, "xor", |a, b| a != b)
    }

    pub fn logical_not(&self) -> BooleanTimeSeries {
        let values = self
            .values()
            .iter()
            .map(|value| if *value == 1.0 { 0.0 } else { 1.0 })
            .collect();
        Self::from_parts(
            format!("not_{}", self.name()),
            values,
            self.timestamps().to_vec(),
        )
    }

    fn logical(
        &self,
        other: &BooleanTimeSeries,
        word: &str,
        combine: fn(bool, bool) -> bool,
    ) -> BooleanTimeSeries {
        let pairs = intersect(self.timestamps(), other.timestamps());
        let mut values = Vec::with_capacity(pairs.len());
        let mut timestamps = Vec::with_capacity(pairs.len());
        for (i, j) in pairs {
            let holds = combine(self.values()[i] == 1.0, other.values()[j] == 1.0);
            values.push(if holds { 1.0 } else { 0.0 });
            timestamps.push(self.timestamps()[i]);
        }
        Self::from_parts(
            format!("{}_{word}_{}", self.name(), other.name()),
            values,
            timestamps,
        )
    }

    pub fn when(&self, condition: &BooleanTimeSeries) -> BooleanTimeSeries {
        Self::wrap(self.series.when(condition))
    }

    /// Like [`TimeSeries::resample`]; a fill value must be 0 or 1.
    pub fn resample(
        &self,
        new_timestamps: &[Timestamp],
        default_value: Option<Number>,
    ) -> Result<BooleanTimeSeries, SignalError> {
        let default_value = match default_value {
            None => None,
            Some(value) => {
                let raw = value.as_f64();
                if raw != 0.0 && raw != 1.0 {
                    error!(series = %self.name(), default = raw, "boolean default must be 0 or 1");
                    return Err(SignalError::InvalidBinaryDefault {
                        name: self.name().to_owned(),
                        value: raw,
                    });
                }
                Some(Number::Int(raw as i64))
            }
        };
        self.series
            .resample(new_timestamps, default_value)
            .map(Self::wrap)
    }

    pub fn split_runs_over_threshold(&self, threshold: Option<f64>) -> Vec<BooleanTimeSeries> {
        self.series
            .split_runs_over_threshold(threshold)
            .into_iter()
            .map(Self::wrap)
            .collect()
    }

    pub fn subset_for_interval(
        &self,
        start: Option<Timestamp>,
        stop: Option<Timestamp>,
    ) -> Result<BooleanTimeSeries, SignalError> {
        self.series
            .subset_for_interval(start, stop)
            .map(Self::wrap)
    }

    /// Equality comparisons only.
    pub fn compare<'b>(
        &self,
        op: CompareOp,
        rhs: impl Into<Operand<'b>>,
    ) -> Result<BooleanTimeSeries, SignalError> {
        if op.is_ordering() {
            return Err(self.refuse(op.symbol()));
        }
        self.series.compare(op, rhs)
    }

    /// Always refused.
    pub fn apply<'b>(
        &self,
        op: ArithmeticOp,
        _rhs: impl Into<Operand<'b>>,
    ) -> Result<TimeSeries, SignalError> {
        Err(self.refuse(op.symbol()))
    }

    /// Always refused.
    pub fn pow<'b>(&self, _exponent: impl Into<Operand<'b>>) -> Result<TimeSeries, SignalError> {
        Err(self.refuse("**"))
    }

    /// Always refused.
    pub fn negate(&self) -> Result<TimeSeries, SignalError> {
        Err(self.refuse("unary -"))
    }

    /// Always refused.
    pub fn elementwise_max<'b>(
        &self,
        _rhs: impl Into<Operand<'b>>,
    ) -> Result<TimeSeries, SignalError> {
        Err(self.refuse("max"))
    }

    /// Always refused.
    pub fn elementwise_min<'b>(
        &self,
        _rhs: impl Into<Operand<'b>>,
    ) -> Result<TimeSeries, SignalError> {
        Err(self.refuse("min"))
    }

    fn refuse(&self, op: &'static str) -> SignalError {
        error!(series = %self.name(), op, "operation is not possible for boolean series");
        SignalError::NotPossibleForBoolean {
            op,
            name: self.name().to_owned(),
        }
    }

    pub fn unpack(&mut self, packed: &Packed, timestamps: Vec<Timestamp>) -> Result<(), PackError> {
        self.series.unpack(packed, timestamps)
    }
}

impl Pack for BooleanTimeSeries {
    fn pack(&self) -> Packed {
        self.series.pack()
    }

    fn kind(&self) -> ResultKind {
        ResultKind::BooleanSeries
    }
}

impl BitAnd for &BooleanTimeSeries {
    type Output = BooleanTimeSeries;

    fn bitand(self, rhs: Self) -> BooleanTimeSeries {
        self.and(rhs)
    }
}

impl BitOr for &BooleanTimeSeries {
    type Output = BooleanTimeSeries;

    fn bitor(self, rhs: Self) -> BooleanTimeSeries {
        self.or(rhs)
    }
}

impl BitXor for &BooleanTimeSeries {
    type Output = BooleanTimeSeries;

    fn bitxor(self, rhs: Self) -> BooleanTimeSeries {
        self.xor(rhs)
    }
}

impl Not for &BooleanTimeSeries {
    type Output = BooleanTimeSeries;

    fn not(self) -> BooleanTimeSeries {
        self.logical_not()
    }
}

impl Neg for &BooleanTimeSeries {
    type Output = Result<TimeSeries, SignalError>;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

macro_rules! refused_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<'b, R: Into<Operand<'b>>> $trait<R> for &'b BooleanTimeSeries {
            type Output = Result<TimeSeries, SignalError>;

            fn $method(self, rhs: R) -> Self::Output {
                self.apply($op, rhs)
            }
        }
    };
}

refused_binary_op!(Add, add, ArithmeticOp::Add);
refused_binary_op!(Sub, sub, ArithmeticOp::Sub);
refused_binary_op!(Mul, mul, ArithmeticOp::Mul);
refused_binary_op!(Div, div, ArithmeticOp::Div);

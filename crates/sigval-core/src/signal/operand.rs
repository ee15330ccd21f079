use std::borrow::Cow;

use tracing::error;

use super::{BooleanTimeSeries, PercentageTimeSeries, TimeSeries};
use crate::{Number, ScalarValue, SignalError, Unit, ValueDomain};

/// Right-hand side of a series operation.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Number(Number),
    Scalar(&'a ScalarValue),
    Series(&'a TimeSeries),
    /// A boolean series used as a plain 0/1 operand.
    Flags(&'a BooleanTimeSeries),
}

impl<'a> Operand<'a> {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Scalar(_) => "scalar value",
            Self::Series(_) => "time series",
            Self::Flags(_) => "boolean time series",
        }
    }

    /// The numeric view of a series operand.
    pub(crate) fn series(&self) -> Option<&'a TimeSeries> {
        match self {
            Self::Series(series) => Some(series),
            Self::Flags(flags) => Some(flags.as_series()),
            Self::Number(_) | Self::Scalar(_) => None,
        }
    }

    /// Unit carried into `*`, `/` and `**` results. Plain numbers carry none.
    pub(crate) fn unit(&self) -> Option<&Unit> {
        match self {
            Self::Number(_) => None,
            Self::Scalar(scalar) => Some(&scalar.unit),
            Self::Series(series) => Some(series.unit()),
            Self::Flags(flags) => Some(flags.unit()),
        }
    }

    /// The constant value of a number or scalar operand.
    pub(crate) fn constant(&self, op: &'static str, owner: &str) -> Result<Number, SignalError> {
        match self {
            Self::Number(number) => Ok(*number),
            Self::Scalar(scalar) => scalar.value.map(Number::Float).ok_or_else(|| {
                error!(series = %owner, op, scalar = %scalar.name, "scalar operand has no value");
                SignalError::UnsupportedOperand {
                    op,
                    operand: "absent scalar value",
                    name: owner.to_owned(),
                }
            }),
            Self::Series(_) | Self::Flags(_) => {
                error!(series = %owner, op, "operand must be a number or a scalar value");
                Err(SignalError::UnsupportedOperand {
                    op,
                    operand: self.describe(),
                    name: owner.to_owned(),
                })
            }
        }
    }

    fn label(&self) -> String {
        match self {
            Self::Number(number) => number.to_string(),
            Self::Scalar(scalar) => scalar.name.clone(),
            Self::Series(series) => series.name().to_owned(),
            Self::Flags(flags) => flags.name().to_owned(),
        }
    }
}

impl From<Number> for Operand<'_> {
    fn from(value: Number) -> Self {
        Self::Number(value)
    }
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Self::Number(Number::Float(value))
    }
}

impl From<i64> for Operand<'_> {
    fn from(value: i64) -> Self {
        Self::Number(Number::Int(value))
    }
}

impl From<i32> for Operand<'_> {
    fn from(value: i32) -> Self {
        Self::Number(Number::from(value))
    }
}

impl<'a> From<&'a ScalarValue> for Operand<'a> {
    fn from(value: &'a ScalarValue) -> Self {
        Self::Scalar(value)
    }
}

impl<'a> From<&'a TimeSeries> for Operand<'a> {
    fn from(value: &'a TimeSeries) -> Self {
        Self::Series(value)
    }
}

impl<'a> From<&'a BooleanTimeSeries> for Operand<'a> {
    fn from(value: &'a BooleanTimeSeries) -> Self {
        Self::Flags(value)
    }
}

impl<'a> From<&'a PercentageTimeSeries> for Operand<'a> {
    fn from(value: &'a PercentageTimeSeries) -> Self {
        Self::Series(value.as_series())
    }
}

impl TimeSeries {
    /// Brings an operand onto a common footing with `self`: series pass
    /// through, constants become a series over `self`'s timestamps whose
    /// range is the constant itself.
    pub(crate) fn lift<'a>(
        &self,
        op: &'static str,
        operand: Operand<'a>,
    ) -> Result<(Cow<'a, TimeSeries>, String), SignalError> {
        if let Some(series) = operand.series() {
            return Ok((Cow::Borrowed(series), series.name().to_owned()));
        }

        let constant = operand.constant(op, self.name())?;
        let value = constant.as_f64();
        let domain = match operand {
            Operand::Scalar(_) => ValueDomain::Float,
            _ => constant.domain(),
        };
        let label = operand.label();
        let lifted = TimeSeries::from_parts(
            label.clone(),
            operand.unit().cloned().unwrap_or_default(),
            vec![value; self.len()],
            self.timestamps().to_vec(),
            value,
            value,
            domain,
            value,
        );
        Ok((Cow::Owned(lifted), label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> TimeSeries {
        TimeSeries::new(
            "speed",
            Unit::from_name("meters_per_second"),
            vec![1.0, 2.0],
            vec![10.0, 20.0],
            0,
            10,
            None,
        )
        .expect("valid series")
    }

    #[test]
    fn lifts_numbers_to_constant_series() {
        let base = series();
        let (lifted, label) = base.lift("+", Operand::from(3)).expect("lift");

        assert_eq!(label, "3");
        assert_eq!(lifted.values(), &[3.0, 3.0]);
        assert_eq!(lifted.timestamps(), base.timestamps());
        assert_eq!((lifted.range_min(), lifted.range_max()), (3.0, 3.0));
        assert_eq!(lifted.domain(), ValueDomain::Integer);
    }

    #[test]
    fn absent_scalar_is_rejected() {
        let scalar = ScalarValue::new("gap", Unit::none(), None);
        let err = series()
            .lift("*", Operand::from(&scalar))
            .expect_err("must fail");
        assert!(matches!(err, SignalError::UnsupportedOperand { .. }));
    }

    #[test]
    fn series_operands_are_borrowed() {
        let base = series();
        let other = series();
        let (lifted, label) = base.lift("-", Operand::from(&other)).expect("lift");
        assert!(matches!(lifted, Cow::Borrowed(_)));
        assert_eq!(label, "speed");
    }

    #[test]
    fn boolean_operands_stay_wrapped() {
        let flags = BooleanTimeSeries::from_bools("moving", &[true, false], vec![10.0, 20.0])
            .expect("valid boolean series");

        let operand = Operand::from(&flags);
        assert!(matches!(operand, Operand::Flags(_)));

        let (lifted, label) = series().lift("*", operand).expect("lift");
        assert_eq!(label, "moving");
        assert_eq!(lifted.values(), &[1.0, 0.0]);
    }
}

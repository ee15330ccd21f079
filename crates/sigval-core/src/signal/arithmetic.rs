//! Element-wise arithmetic over aligned timestamps.
//!
//! Result ranges are derived from the operand ranges only, never from the
//! data:
//!
//! | Operation | Result range |
//! |-----------|--------------|
//! | `+ - *` | min/max over the four corner combinations |
//! | `/ //` | corners when the divisor range excludes zero, else the domain's max magnitude |
//! | `max`, `min` | bound-wise max/min |
//! | `**` | min/max over `0`, `min^e`, `max^e` |
//! | `abs` | `[0 or min(|lo|,|hi|), max(|lo|,|hi|)]` |

use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::operand::Operand;
use super::{intersect, TimeSeries};
use crate::{Number, ScalarValue, SignalError, ValueDomain};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Max,
    Min,
}

impl ArithmeticOp {
    pub const ALL: [Self; 7] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::FloorDiv,
        Self::Max,
        Self::Min,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::FloorDiv => "floor_div",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    /// Accepts either the symbol or the word form.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.symbol() == value || op.as_str().eq_ignore_ascii_case(value))
    }

    fn is_division(self) -> bool {
        matches!(self, Self::Div | Self::FloorDiv)
    }

    fn evaluate(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
            Self::FloorDiv => (a / b).floor(),
            Self::Max => nan_aware(a, b, f64::max),
            Self::Min => nan_aware(a, b, f64::min),
        }
    }

    fn result_name(self, left: &str, right: &str) -> String {
        match self {
            Self::Add | Self::Sub | Self::Mul => format!("{left}_{}_{right}", self.symbol()),
            Self::Div | Self::FloorDiv => format!("({left}_{}_{right})", self.symbol()),
            Self::Max | Self::Min => format!("{}({left},{right})", self.symbol()),
        }
    }

    fn result_range(self, left: (f64, f64), right: (f64, f64), domain: ValueDomain) -> (f64, f64) {
        match self {
            Self::Max => (left.0.max(right.0), left.1.max(right.1)),
            Self::Min => (left.0.min(right.0), left.1.min(right.1)),
            Self::Div | Self::FloorDiv if right.0 <= 0.0 && right.1 >= 0.0 => unbounded(domain),
            _ => corner_range(
                [
                    self.evaluate(left.0, right.0),
                    self.evaluate(left.0, right.1),
                    self.evaluate(left.1, right.0),
                    self.evaluate(left.1, right.1),
                ],
                domain,
            ),
        }
    }
}

impl std::fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl TimeSeries {
    /// Applies `op` sample-wise over the timestamps shared with `rhs`.
    ///
    /// Plain numbers and scalar values are lifted to a constant series over
    /// `self`'s timestamps first. Samples whose divisor is zero are skipped;
    /// a constant zero divisor is an error.
    pub fn apply<'b>(
        &self,
        op: ArithmeticOp,
        rhs: impl Into<Operand<'b>>,
    ) -> Result<TimeSeries, SignalError> {
        let rhs = rhs.into();
        if op.is_division() && rhs.series().is_none() {
            let divisor = rhs.constant(op.symbol(), self.name())?.as_f64();
            if divisor == 0.0 {
                error!(series = %self.name(), op = op.symbol(), "division by zero");
                return Err(SignalError::DivisionByZero {
                    name: self.name().to_owned(),
                });
            }
        }

        let (other, label) = self.lift(op.symbol(), rhs)?;
        let domain = match op {
            ArithmeticOp::Div => ValueDomain::Float,
            _ => self.domain().combine(other.domain()),
        };
        let (range_min, range_max) = op.result_range(
            (self.range_min(), self.range_max()),
            (other.range_min(), other.range_max()),
            domain,
        );

        let pairs = intersect(self.timestamps(), other.timestamps());
        let mut values = Vec::with_capacity(pairs.len());
        let mut timestamps = Vec::with_capacity(pairs.len());
        let mut skipped = 0_usize;
        for (i, j) in pairs {
            let (a, b) = (self.values()[i], other.values()[j]);
            if op.is_division() && b == 0.0 {
                skipped += 1;
                continue;
            }
            values.push(op.evaluate(a, b));
            timestamps.push(self.timestamps()[i]);
        }
        if skipped > 0 {
            warn!(
                series = %self.name(),
                divisor = %label,
                skipped,
                "samples with a zero divisor skipped"
            );
        }

        let unit = match (op, rhs.unit()) {
            (ArithmeticOp::Mul, Some(unit)) => self.unit().compose_multiply(unit),
            (ArithmeticOp::Div | ArithmeticOp::FloorDiv, Some(unit)) => {
                self.unit().compose_divide(unit)
            }
            _ => self.unit().clone(),
        };

        Ok(TimeSeries::from_parts(
            op.result_name(self.name(), &label),
            unit,
            values,
            timestamps,
            range_min,
            range_max,
            domain,
            clamp_default(self.default_value(), range_min, range_max),
        ))
    }

    pub fn floor_div<'b>(&self, rhs: impl Into<Operand<'b>>) -> Result<TimeSeries, SignalError> {
        self.apply(ArithmeticOp::FloorDiv, rhs)
    }

    /// NaN-propagating sample-wise maximum.
    pub fn elementwise_max<'b>(
        &self,
        rhs: impl Into<Operand<'b>>,
    ) -> Result<TimeSeries, SignalError> {
        self.apply(ArithmeticOp::Max, rhs)
    }

    /// NaN-propagating sample-wise minimum.
    pub fn elementwise_min<'b>(
        &self,
        rhs: impl Into<Operand<'b>>,
    ) -> Result<TimeSeries, SignalError> {
        self.apply(ArithmeticOp::Min, rhs)
    }

    /// Raises every sample to a constant exponent. Series exponents are
    /// rejected.
    pub fn pow<'b>(&self, exponent: impl Into<Operand<'b>>) -> Result<TimeSeries, SignalError> {
        let exponent = exponent.into();
        let number = exponent.constant("**", self.name())?;
        let e = number.as_f64();
        if !e.is_finite() {
            error!(series = %self.name(), exponent = e, "exponent must be finite");
            return Err(SignalError::UnsupportedOperand {
                op: "**",
                operand: "non-finite exponent",
                name: self.name().to_owned(),
            });
        }

        let domain = if self.domain() == ValueDomain::Integer && number.is_integral() && e >= 0.0 {
            ValueDomain::Integer
        } else {
            ValueDomain::Float
        };
        let (lo, hi) = (self.range_min(), self.range_max());
        let (range_min, range_max) = if e < 0.0 && lo <= 0.0 && hi >= 0.0 {
            unbounded(domain)
        } else {
            corner_range([0.0, lo.powf(e), hi.powf(e)], domain)
        };

        let unit = self.unit().compose_power(e).unwrap_or_else(|err| {
            warn!(series = %self.name(), %err, "unit kept unchanged");
            self.unit().clone()
        });
        let label = match exponent {
            Operand::Scalar(scalar) => scalar.name.clone(),
            _ => number.to_string(),
        };

        Ok(TimeSeries::from_parts(
            format!("({}_**_{label})", self.name()),
            unit,
            self.values().iter().map(|value| value.powf(e)).collect(),
            self.timestamps().to_vec(),
            range_min,
            range_max,
            domain,
            clamp_default(self.default_value().powf(e), range_min, range_max),
        ))
    }

    /// Magnitude of every sample.
    pub fn abs(&self) -> TimeSeries {
        let (lo, hi) = (self.range_min(), self.range_max());
        let range_min = if lo <= 0.0 && hi >= 0.0 {
            0.0
        } else {
            lo.abs().min(hi.abs())
        };
        let range_max = lo.abs().max(hi.abs());

        TimeSeries::from_parts(
            format!("abs({})", self.name()),
            self.unit().clone(),
            self.values().iter().map(|value| value.abs()).collect(),
            self.timestamps().to_vec(),
            range_min,
            range_max,
            self.domain(),
            clamp_default(self.default_value().abs(), range_min, range_max),
        )
    }

    /// Sign-flipped copy with the range mirrored.
    pub fn negate(&self) -> TimeSeries {
        TimeSeries::from_parts(
            format!("-{}", self.name()),
            self.unit().clone(),
            self.values().iter().map(|value| -value).collect(),
            self.timestamps().to_vec(),
            -self.range_max(),
            -self.range_min(),
            self.domain(),
            -self.default_value(),
        )
    }

    /// Unary plus: an unchanged copy.
    pub fn positive(&self) -> TimeSeries {
        self.clone()
    }
}

impl Neg for &TimeSeries {
    type Output = TimeSeries;

    fn neg(self) -> TimeSeries {
        self.negate()
    }
}

macro_rules! series_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl $trait<&TimeSeries> for &TimeSeries {
            type Output = Result<TimeSeries, SignalError>;

            fn $method(self, rhs: &TimeSeries) -> Self::Output {
                self.apply($op, rhs)
            }
        }

        impl $trait<&ScalarValue> for &TimeSeries {
            type Output = Result<TimeSeries, SignalError>;

            fn $method(self, rhs: &ScalarValue) -> Self::Output {
                self.apply($op, rhs)
            }
        }

        impl $trait<Number> for &TimeSeries {
            type Output = Result<TimeSeries, SignalError>;

            fn $method(self, rhs: Number) -> Self::Output {
                self.apply($op, rhs)
            }
        }

        impl $trait<f64> for &TimeSeries {
            type Output = Result<TimeSeries, SignalError>;

            fn $method(self, rhs: f64) -> Self::Output {
                self.apply($op, rhs)
            }
        }

        impl $trait<i64> for &TimeSeries {
            type Output = Result<TimeSeries, SignalError>;

            fn $method(self, rhs: i64) -> Self::Output {
                self.apply($op, rhs)
            }
        }
    };
}

series_binary_op!(Add, add, ArithmeticOp::Add);
series_binary_op!(Sub, sub, ArithmeticOp::Sub);
series_binary_op!(Mul, mul, ArithmeticOp::Mul);
series_binary_op!(Div, div, ArithmeticOp::Div);

/// NaN on either side wins.
fn nan_aware(a: f64, b: f64, pick: fn(f64, f64) -> f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        pick(a, b)
    }
}

fn unbounded(domain: ValueDomain) -> (f64, f64) {
    let magnitude = domain.max_magnitude();
    (-magnitude, magnitude)
}

/// Min/max of the candidates, ignoring NaN. Falls back to the unbounded
/// range when no candidate is usable.
pub(crate) fn corner_range<const N: usize>(corners: [f64; N], domain: ValueDomain) -> (f64, f64) {
    let usable = corners.into_iter().filter(|value| !value.is_nan());
    let (lo, hi) = usable.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), value| {
        (lo.min(value), hi.max(value))
    });
    if lo > hi {
        unbounded(domain)
    } else {
        (lo, hi)
    }
}

/// Clamp that tolerates NaN bounds.
pub(crate) fn clamp_default(value: f64, range_min: f64, range_max: f64) -> f64 {
    value.max(range_min).min(range_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Unit;

    fn meters(name: &str, values: Vec<f64>, timestamps: Vec<f64>, min: f64, max: f64) -> TimeSeries {
        TimeSeries::new(name, Unit::from_name("meter"), values, timestamps, min, max, None)
            .expect("valid series")
    }

    #[test]
    fn adds_over_intersection_only() {
        let a = meters(
            "a",
            vec![1.0, 2.0, 3.0, 4.0],
            vec![100.0, 200.0, 300.0, 400.0],
            0.0,
            5.0,
        );
        let b = meters(
            "b",
            vec![10.0, 20.0, 30.0, 40.0],
            vec![110.0, 200.0, 220.0, 300.0],
            0.0,
            50.0,
        );

        let sum = (&a + &b).expect("sum");
        assert_eq!(sum.name(), "a_+_b");
        assert_eq!(sum.timestamps(), &[200.0, 300.0]);
        assert_eq!(sum.values(), &[22.0, 43.0]);
        assert_eq!((sum.range_min(), sum.range_max()), (0.0, 55.0));
        assert_eq!(sum.unit(), a.unit());
    }

    #[test]
    fn multiplication_covers_sign_corners() {
        let a = meters("a", vec![1.0], vec![1.0], -2.0, 3.0);
        let b = meters("b", vec![2.0], vec![1.0], -5.0, 4.0);

        let product = (&a * &b).expect("product");
        assert_eq!((product.range_min(), product.range_max()), (-15.0, 12.0));
        assert_eq!(product.unit().label, "m*m");
    }

    #[test]
    fn division_skips_zero_divisor_samples() {
        let a = meters("a", vec![10.0, 8.0, 6.0], vec![1.0, 2.0, 3.0], 0.0, 10.0);
        let b = meters("b", vec![2.0, 0.0, 3.0], vec![1.0, 2.0, 3.0], 0.0, 5.0);

        let quotient = (&a / &b).expect("quotient");
        assert_eq!(quotient.name(), "(a_/_b)");
        assert_eq!(quotient.timestamps(), &[1.0, 3.0]);
        assert_eq!(quotient.values(), &[5.0, 2.0]);
        assert_eq!(quotient.range_max(), f64::MAX);
        assert_eq!(quotient.range_min(), -f64::MAX);
        assert_eq!(quotient.domain(), ValueDomain::Float);
    }

    #[test]
    fn scalar_division_uses_corner_range() {
        let a = meters("a", vec![2.0, 4.0], vec![1.0, 2.0], 0.0, 10.0);

        let halved = (&a / 2.0).expect("quotient");
        assert_eq!(halved.values(), &[1.0, 2.0]);
        assert_eq!((halved.range_min(), halved.range_max()), (0.0, 5.0));
        assert_eq!(halved.unit(), a.unit());

        let flipped = (&a / -2.0).expect("quotient");
        assert_eq!((flipped.range_min(), flipped.range_max()), (-5.0, -0.0));

        let err = (&a / 0.0).expect_err("must fail");
        assert!(matches!(err, SignalError::DivisionByZero { .. }));
    }

    #[test]
    fn floor_division_of_integers_stays_integer() {
        let a = TimeSeries::new("a", Unit::none(), vec![7, 9], vec![1.0, 2.0], 0, 10, None)
            .expect("valid series");

        let result = a.floor_div(2).expect("floor div");
        assert_eq!(result.values(), &[3.0, 4.0]);
        assert_eq!(result.domain(), ValueDomain::Integer);
        assert_eq!((result.range_min(), result.range_max()), (0.0, 5.0));
        assert_eq!(result.name(), "(a_//_2)");
    }

    #[test]
    fn elementwise_max_propagates_nan() {
        let a = meters("a", vec![1.0, f64::NAN, 5.0], vec![1.0, 2.0, 3.0], 0.0, 5.0);
        let b = meters("b", vec![3.0, 2.0, 4.0], vec![1.0, 2.0, 3.0], 2.0, 8.0);

        let max = a.elementwise_max(&b).expect("max");
        assert_eq!(max.name(), "max(a,b)");
        assert_eq!(max.values()[0], 3.0);
        assert!(max.values()[1].is_nan());
        assert_eq!(max.values()[2], 5.0);
        assert_eq!((max.range_min(), max.range_max()), (2.0, 8.0));

        let min = a.elementwise_min(&b).expect("min");
        assert_eq!((min.range_min(), min.range_max()), (0.0, 5.0));
    }

    #[test]
    fn power_requires_constant_exponent() {
        let a = meters("a", vec![-2.0, 3.0], vec![1.0, 2.0], -2.0, 3.0);

        let squared = a.pow(2).expect("pow");
        assert_eq!(squared.values(), &[4.0, 9.0]);
        assert_eq!((squared.range_min(), squared.range_max()), (0.0, 9.0));
        assert_eq!(squared.name(), "(a_**_2)");

        let err = a.pow(&a).expect_err("must fail");
        assert!(matches!(err, SignalError::UnsupportedOperand { .. }));
    }

    #[test]
    fn abs_and_negation_rederive_ranges() {
        let a = meters("a", vec![-3.0, 1.0], vec![1.0, 2.0], -4.0, 2.0);

        let magnitude = a.abs();
        assert_eq!(magnitude.values(), &[3.0, 1.0]);
        assert_eq!((magnitude.range_min(), magnitude.range_max()), (0.0, 4.0));

        let shifted = meters("b", vec![3.0], vec![1.0], 2.0, 5.0);
        assert_eq!(shifted.abs().range_min(), 2.0);

        let negated = -&a;
        assert_eq!(negated.name(), "-a");
        assert_eq!(negated.values(), &[3.0, -1.0]);
        assert_eq!((negated.range_min(), negated.range_max()), (-2.0, 4.0));
        assert_eq!(a.positive(), a);
    }

    #[test]
    fn parses_symbols_and_words() {
        assert_eq!(ArithmeticOp::parse("//"), Some(ArithmeticOp::FloorDiv));
        assert_eq!(ArithmeticOp::parse("MUL"), Some(ArithmeticOp::Mul));
        assert_eq!(ArithmeticOp::parse("%"), None);
    }
}

use serde::{Deserialize, Serialize};

use super::operand::Operand;
use super::{intersect, BooleanTimeSeries, TimeSeries};
use crate::SignalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl CompareOp {
    pub const ALL: [Self; 6] = [Self::Lt, Self::Le, Self::Eq, Self::Ne, Self::Ge, Self::Gt];

    /// Short tag used in result names.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Ge => "ge",
            Self::Gt => "gt",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Gt => ">",
        }
    }

    /// Accepts the tag or the symbol.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.symbol() == value || op.tag().eq_ignore_ascii_case(value))
    }

    pub fn is_ordering(self) -> bool {
        !matches!(self, Self::Eq | Self::Ne)
    }

    pub(crate) fn holds(self, a: f64, b: f64) -> bool {
        match self {
            Self::Lt => a < b,
            Self::Le => a <= b,
            Self::Eq => a == b,
            Self::Ne => a != b,
            Self::Ge => a >= b,
            Self::Gt => a > b,
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl TimeSeries {
    /// Sample-wise comparison over the shared timestamps, named
    /// `"{self} {tag} {rhs}"`.
    pub fn compare<'b>(
        &self,
        op: CompareOp,
        rhs: impl Into<Operand<'b>>,
    ) -> Result<BooleanTimeSeries, SignalError> {
        let (other, label) = self.lift(op.symbol(), rhs.into())?;

        let pairs = intersect(self.timestamps(), other.timestamps());
        let mut values = Vec::with_capacity(pairs.len());
        let mut timestamps = Vec::with_capacity(pairs.len());
        for (i, j) in pairs {
            let holds = op.holds(self.values()[i], other.values()[j]);
            values.push(if holds { 1.0 } else { 0.0 });
            timestamps.push(self.timestamps()[i]);
        }

        Ok(BooleanTimeSeries::from_parts(
            format!("{} {} {label}", self.name(), op.tag()),
            values,
            timestamps,
        ))
    }

    pub fn less_than<'b>(
        &self,
        rhs: impl Into<Operand<'b>>,
    ) -> Result<BooleanTimeSeries, SignalError> {
        self.compare(CompareOp::Lt, rhs)
    }

    pub fn less_equal<'b>(
        &self,
        rhs: impl Into<Operand<'b>>,
    ) -> Result<BooleanTimeSeries, SignalError> {
        self.compare(CompareOp::Le, rhs)
    }

    pub fn equal_to<'b>(
        &self,
        rhs: impl Into<Operand<'b>>,
    ) -> Result<BooleanTimeSeries, SignalError> {
        self.compare(CompareOp::Eq, rhs)
    }

    pub fn not_equal_to<'b>(
        &self,
        rhs: impl Into<Operand<'b>>,
    ) -> Result<BooleanTimeSeries, SignalError> {
        self.compare(CompareOp::Ne, rhs)
    }

    pub fn greater_equal<'b>(
        &self,
        rhs: impl Into<Operand<'b>>,
    ) -> Result<BooleanTimeSeries, SignalError> {
        self.compare(CompareOp::Ge, rhs)
    }

    pub fn greater_than<'b>(
        &self,
        rhs: impl Into<Operand<'b>>,
    ) -> Result<BooleanTimeSeries, SignalError> {
        self.compare(CompareOp::Gt, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ScalarValue, Unit};

    fn speed() -> TimeSeries {
        TimeSeries::new(
            "speed",
            Unit::from_name("meters_per_second"),
            vec![1.0, 5.0, 3.0, f64::NAN],
            vec![10.0, 20.0, 30.0, 40.0],
            0.0,
            10.0,
            None,
        )
        .expect("valid series")
    }

    #[test]
    fn compares_against_a_constant() {
        let over = speed().greater_than(2).expect("comparison");
        assert_eq!(over.name(), "speed gt 2");
        assert_eq!(over.values(), &[0.0, 1.0, 1.0, 0.0]);
        assert_eq!(over.timestamps(), &[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(over.as_series().unit(), &Unit::binary());
    }

    #[test]
    fn compares_aligned_series() {
        let limit = TimeSeries::new(
            "limit",
            Unit::from_name("meters_per_second"),
            vec![2.0, 3.0],
            vec![20.0, 30.0],
            0.0,
            10.0,
            None,
        )
        .expect("valid series");

        let at_most = speed().less_equal(&limit).expect("comparison");
        assert_eq!(at_most.name(), "speed le limit");
        assert_eq!(at_most.timestamps(), &[20.0, 30.0]);
        assert_eq!(at_most.values(), &[0.0, 1.0]);
    }

    #[test]
    fn scalar_operands_use_their_name() {
        let threshold = ScalarValue::from_number("v_max", Unit::none(), 3.0);
        let equal = speed().equal_to(&threshold).expect("comparison");
        assert_eq!(equal.name(), "speed eq v_max");
        assert_eq!(equal.values(), &[0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn parses_tags_and_symbols() {
        assert_eq!(CompareOp::parse(">="), Some(CompareOp::Ge));
        assert_eq!(CompareOp::parse("ne"), Some(CompareOp::Ne));
        assert!(CompareOp::Lt.is_ordering());
        assert!(!CompareOp::Eq.is_ordering());
    }
}

use serde::Serialize;
use tracing::error;

use super::{SeriesValues, TimeSeries, Timestamp};
use crate::pack::{Pack, Packed, ResultKind};
use crate::{Number, PackError, SignalError, Unit, ValidationError};

/// A series in percent, range fixed to `[0, 100]`.
///
/// Sign changes make no sense for a share, so negation and unary plus are
/// refused. Everything else goes through [`PercentageTimeSeries::as_series`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PercentageTimeSeries {
    series: TimeSeries,
}

impl PercentageTimeSeries {
    pub fn new(
        name: impl Into<String>,
        values: impl Into<SeriesValues>,
        timestamps: Vec<Timestamp>,
        default_value: Option<Number>,
    ) -> Result<Self, ValidationError> {
        let series = TimeSeries::new(
            name,
            Unit::percentage(),
            values,
            timestamps,
            0,
            100,
            default_value,
        )?;
        Ok(Self { series })
    }

    pub fn as_series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn into_series(self) -> TimeSeries {
        self.series
    }

    pub fn name(&self) -> &str {
        self.series.name()
    }

    pub fn values(&self) -> &[f64] {
        self.series.values()
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        self.series.timestamps()
    }

    pub fn negate(&self) -> Result<TimeSeries, SignalError> {
        Err(self.refuse("unary -"))
    }

    pub fn positive(&self) -> Result<TimeSeries, SignalError> {
        Err(self.refuse("unary +"))
    }

    fn refuse(&self, op: &'static str) -> SignalError {
        error!(series = %self.name(), op, "operation is not possible for percentage series");
        SignalError::NotPossibleForPercentage {
            op,
            name: self.name().to_owned(),
        }
    }

    pub fn unpack(&mut self, packed: &Packed, timestamps: Vec<Timestamp>) -> Result<(), PackError> {
        self.series.unpack(packed, timestamps)
    }
}

impl Pack for PercentageTimeSeries {
    fn pack(&self) -> Packed {
        self.series.pack()
    }

    fn kind(&self) -> ResultKind {
        ResultKind::PercentageSeries
    }
}

impl std::ops::Neg for &PercentageTimeSeries {
    type Output = Result<TimeSeries, SignalError>;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share() -> PercentageTimeSeries {
        PercentageTimeSeries::new("share", vec![12.5, 80.0, 120.0], vec![1.0, 2.0, 3.0], None)
            .expect("valid percentage series")
    }

    #[test]
    fn range_is_fixed_to_percent() {
        let share = share();
        assert_eq!(share.values(), &[12.5, 80.0]);
        assert_eq!(share.as_series().range_max(), 100.0);
        assert_eq!(share.as_series().unit().label, "%");
        assert_eq!(share.kind(), ResultKind::PercentageSeries);
    }

    #[test]
    fn sign_operators_are_refused() {
        let share = share();
        let err = (-&share).expect_err("must fail");
        assert!(matches!(err, SignalError::NotPossibleForPercentage { .. }));

        let err = share.positive().expect_err("must fail");
        assert!(matches!(err, SignalError::NotPossibleForPercentage { .. }));
    }

    #[test]
    fn numeric_view_supports_arithmetic() {
        let share = share();
        let fraction = (share.as_series() / 100.0).expect("quotient");
        assert_eq!(fraction.values(), &[0.125, 0.8]);
    }
}

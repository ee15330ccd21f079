//! Time-indexed, range-bounded series and their algebra.
//!
//! A [`TimeSeries`] is a [`BoundedVector`] whose values are paired
//! one-to-one with unique, ascending timestamps. Every binary operation
//! works on the intersection of the operands' timestamps and returns a new
//! series whose range is re-derived from the operand ranges.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`operand`] | right-hand operands (numbers, scalars, series) |
//! | [`arithmetic`] | `+ - * / // **`, min/max, negation, absolute value |
//! | [`compare`] | comparisons producing boolean series |
//! | [`transform`] | masking, resampling, hysteresis, run splitting, slicing |
//! | [`plotting`] | chart requests for time and x/y plots |
//! | [`boolean`] | [`BooleanTimeSeries`] |
//! | [`percentage`] | [`PercentageTimeSeries`] |

pub mod arithmetic;
pub mod boolean;
pub mod compare;
pub mod operand;
pub mod percentage;
pub mod plotting;
pub mod transform;

use serde::Serialize;
use tracing::{error, warn};

use crate::domain::vector::{split_range, validate_name, validate_range};
use crate::histogram::{BinSpec, HistogramSummary};
use crate::pack::{Pack, Packed, ResultKind};
use crate::{
    BoundedVector, Number, PackError, ScalarValue, SignalError, Unit, ValidationError, ValueDomain,
};

pub use boolean::BooleanTimeSeries;
pub use percentage::PercentageTimeSeries;

/// Sample timestamp (microseconds in recorded data).
pub type Timestamp = f64;

/// Values handed to a series constructor.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValues {
    List(Vec<Number>),
    /// One value repeated at every timestamp.
    Broadcast(Number),
}

impl From<Vec<Number>> for SeriesValues {
    fn from(values: Vec<Number>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<f64>> for SeriesValues {
    fn from(values: Vec<f64>) -> Self {
        Self::List(values.into_iter().map(Number::Float).collect())
    }
}

impl From<Vec<i64>> for SeriesValues {
    fn from(values: Vec<i64>) -> Self {
        Self::List(values.into_iter().map(Number::Int).collect())
    }
}

impl From<Vec<i32>> for SeriesValues {
    fn from(values: Vec<i32>) -> Self {
        Self::List(values.into_iter().map(Number::from).collect())
    }
}

impl From<&[f64]> for SeriesValues {
    fn from(values: &[f64]) -> Self {
        Self::List(values.iter().copied().map(Number::Float).collect())
    }
}

impl From<Number> for SeriesValues {
    fn from(value: Number) -> Self {
        Self::Broadcast(value)
    }
}

impl From<f64> for SeriesValues {
    fn from(value: f64) -> Self {
        Self::Broadcast(Number::Float(value))
    }
}

impl From<i64> for SeriesValues {
    fn from(value: i64) -> Self {
        Self::Broadcast(Number::Int(value))
    }
}

impl From<&ScalarValue> for SeriesValues {
    fn from(scalar: &ScalarValue) -> Self {
        Self::Broadcast(Number::Float(scalar.value.unwrap_or(f64::NAN)))
    }
}

/// Range-bounded values paired with unique ascending timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    #[serde(flatten)]
    vector: BoundedVector,
    timestamps: Vec<Timestamp>,
    default_value: f64,
}

impl TimeSeries {
    /// Builds a series from parallel value and timestamp lists.
    ///
    /// - Lists of unequal length are truncated to the shorter one.
    /// - Samples are sorted by timestamp; duplicate timestamps keep their
    ///   first sample.
    /// - The element domain follows `default_value` when given, otherwise
    ///   the promoted type of `values`, otherwise the type of `range_min`.
    ///   Values the domain cannot hold are dropped and logged.
    /// - Values outside the range are dropped and logged; NaN is kept as a
    ///   missing sample.
    /// - `default_value` defaults to `range_min` and is clamped into the
    ///   range.
    pub fn new(
        name: impl Into<String>,
        unit: Unit,
        values: impl Into<SeriesValues>,
        timestamps: Vec<Timestamp>,
        range_min: impl Into<Number>,
        range_max: impl Into<Number>,
        default_value: Option<Number>,
    ) -> Result<Self, ValidationError> {
        let name = validate_name(name.into())?;
        let (range_min, range_max) = (range_min.into(), range_max.into());
        validate_range(&name, range_min.as_f64(), range_max.as_f64())?;
        if default_value.is_some_and(|value| !value.as_f64().is_finite()) {
            return Err(ValidationError::NonFiniteValue {
                field: "default_value",
            });
        }

        let values = match values.into() {
            SeriesValues::List(values) => values,
            SeriesValues::Broadcast(value) => vec![value; timestamps.len()],
        };
        let domain = default_value
            .map(Number::domain)
            .or_else(|| ValueDomain::promoted(&values))
            .unwrap_or(range_min.domain());

        let samples = normalize_samples(&name, values, timestamps);
        let mut vector = BoundedVector::from_parts(
            name,
            unit,
            Vec::with_capacity(samples.len()),
            range_min.as_f64(),
            range_max.as_f64(),
            domain,
        );
        let mut kept_timestamps = Vec::with_capacity(samples.len());
        let mut promoted = 0_usize;

        for (timestamp, value) in samples {
            let raw = value.as_f64();
            if raw.is_nan() {
                vector.values_mut().push(raw);
                kept_timestamps.push(timestamp);
                continue;
            }
            if !domain.accepts(value) {
                error!(
                    series = %vector.name(),
                    timestamp,
                    value = %value,
                    domain = %domain,
                    "value does not match the series domain, dropped"
                );
                continue;
            }
            if domain == ValueDomain::Float && value.domain() == ValueDomain::Integer {
                promoted += 1;
            }
            if let Some(accepted) = vector.admit(value) {
                vector.values_mut().push(accepted);
                kept_timestamps.push(timestamp);
            }
        }

        if promoted > 0 && default_value.is_some() {
            warn!(
                series = %vector.name(),
                promoted,
                "integer values stored as float to match the default value"
            );
        }

        let default_value = resolve_default(
            vector.name(),
            default_value,
            domain,
            vector.range_min(),
            vector.range_max(),
        );

        Ok(Self {
            vector,
            timestamps: kept_timestamps,
            default_value,
        })
    }

    pub fn builder(name: impl Into<String>) -> TimeSeriesBuilder {
        TimeSeriesBuilder::new(name)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        name: String,
        unit: Unit,
        values: Vec<f64>,
        timestamps: Vec<Timestamp>,
        range_min: f64,
        range_max: f64,
        domain: ValueDomain,
        default_value: f64,
    ) -> Self {
        Self {
            vector: BoundedVector::from_parts(name, unit, values, range_min, range_max, domain),
            timestamps,
            default_value,
        }
    }

    /// Same metadata as `self`, different samples.
    pub(crate) fn with_samples(
        &self,
        name: String,
        values: Vec<f64>,
        timestamps: Vec<Timestamp>,
    ) -> Self {
        Self::from_parts(
            name,
            self.unit().clone(),
            values,
            timestamps,
            self.range_min(),
            self.range_max(),
            self.domain(),
            self.default_value,
        )
    }

    pub fn name(&self) -> &str {
        self.vector.name()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.vector.set_name(name);
    }

    pub fn unit(&self) -> &Unit {
        self.vector.unit()
    }

    pub fn values(&self) -> &[f64] {
        self.vector.values()
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn samples(&self) -> impl Iterator<Item = (Timestamp, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.vector.values().iter().copied())
    }

    pub fn range_min(&self) -> f64 {
        self.vector.range_min()
    }

    pub fn range_max(&self) -> f64 {
        self.vector.range_max()
    }

    pub fn domain(&self) -> ValueDomain {
        self.vector.domain()
    }

    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The values without their timestamps.
    pub fn as_vector(&self) -> &BoundedVector {
        &self.vector
    }

    pub fn into_vector(self) -> BoundedVector {
        self.vector
    }

    pub fn start_timestamp(&self) -> Option<Timestamp> {
        self.timestamps.first().copied()
    }

    pub fn end_timestamp(&self) -> Option<Timestamp> {
        self.timestamps.last().copied()
    }

    pub fn mean(&self) -> Option<f64> {
        self.vector.mean()
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.vector.std_dev()
    }

    pub fn max(&self) -> Option<f64> {
        self.vector.max()
    }

    pub fn min(&self) -> Option<f64> {
        self.vector.min()
    }

    pub fn first_over_threshold(&self, threshold: Option<f64>) -> Option<f64> {
        self.vector.first_over_threshold(threshold)
    }

    pub fn last_over_threshold(&self, threshold: Option<f64>) -> Option<f64> {
        self.vector.last_over_threshold(threshold)
    }

    pub fn histogram(
        &self,
        bins: impl Into<BinSpec>,
        normalize: bool,
    ) -> Result<HistogramSummary, SignalError> {
        self.vector.histogram(bins, normalize)
    }

    /// Index of an exact timestamp match.
    pub fn position_of(&self, timestamp: Timestamp) -> Option<usize> {
        let index = self.timestamps.partition_point(|at| *at < timestamp);
        (self.timestamps.get(index) == Some(&timestamp)).then_some(index)
    }

    /// Value at an exact timestamp; no interpolation.
    pub fn value_at(&self, timestamp: Timestamp) -> Option<f64> {
        self.position_of(timestamp)
            .and_then(|index| self.vector.get(index))
    }

    /// Timestamps converted from microseconds to seconds relative to
    /// `origin`, rounded to two decimals.
    pub fn times_in_seconds(&self, origin: Timestamp) -> Vec<f64> {
        self.timestamps
            .iter()
            .map(|timestamp| ((timestamp - origin) / 1e6 * 100.0).round() / 100.0)
            .collect()
    }

    /// Inserts a sample in timestamp order. Duplicate timestamps and values
    /// the series cannot hold are rejected.
    pub fn add_sample(&mut self, timestamp: Timestamp, value: impl Into<Number>) -> bool {
        if timestamp.is_nan() {
            warn!(series = %self.name(), "NaN timestamp, sample not added");
            return false;
        }
        if self.position_of(timestamp).is_some() {
            warn!(
                series = %self.name(),
                timestamp,
                "timestamp already exists, value not changed"
            );
            return false;
        }

        let index = self.timestamps.partition_point(|at| *at < timestamp);
        if !self.vector.insert(Some(index), value) {
            return false;
        }
        self.timestamps.insert(index, timestamp);
        true
    }

    /// List form of [`TimeSeries::add_sample`]. An integer series drops
    /// non-integral values with a warning and keeps going. Returns whether
    /// any sample was added.
    pub fn add_samples(&mut self, samples: &[(Timestamp, Number)]) -> bool {
        let mut added = false;
        for (timestamp, value) in samples {
            if !self.domain().accepts(*value) {
                warn!(
                    series = %self.name(),
                    timestamp,
                    value = %value,
                    "non-integral value skipped for integer series"
                );
                continue;
            }
            added |= self.add_sample(*timestamp, *value);
        }
        added
    }

    /// Overwrites the value at an existing timestamp, or adds a new sample.
    pub fn set_value_at(&mut self, timestamp: Timestamp, value: impl Into<Number>) -> bool {
        match self.position_of(timestamp) {
            Some(index) => self.vector.set(index, value),
            None => self.add_sample(timestamp, value),
        }
    }

    /// Strips samples whose value lies outside the range. Returns how many
    /// were removed.
    pub fn remove_out_of_range(&mut self) -> usize {
        let keep: Vec<bool> = self
            .values()
            .iter()
            .map(|value| self.vector.contains_in_range(*value))
            .collect();
        let removed = keep.iter().filter(|kept| !**kept).count();
        if removed > 0 {
            let mut mask = keep.iter();
            self.timestamps
                .retain(|_| mask.next().copied().unwrap_or(false));
            self.vector.retain_mask(&keep);
        }
        removed
    }

    /// Restores range and values from a pack; timestamps come from the
    /// separate channel and must match the value count.
    pub fn unpack(
        &mut self,
        packed: &Packed,
        timestamps: Vec<Timestamp>,
    ) -> Result<(), PackError> {
        let (_, _, values) = split_range(packed, "series")?;
        if values.len() != timestamps.len() {
            return Err(PackError::TimestampMismatch {
                timestamps: timestamps.len(),
                values: values.len(),
            });
        }

        self.vector.unpack(packed)?;
        self.timestamps = timestamps;
        self.default_value =
            arithmetic::clamp_default(self.default_value, self.range_min(), self.range_max());
        Ok(())
    }

    /// Nonzero values become 1.
    pub fn to_boolean(&self) -> BooleanTimeSeries {
        let values = self
            .values()
            .iter()
            .map(|value| if *value != 0.0 { 1.0 } else { 0.0 })
            .collect();
        BooleanTimeSeries::from_parts(self.name().to_owned(), values, self.timestamps.clone())
    }

    #[cfg(test)]
    pub(crate) fn vector_mut(&mut self) -> &mut BoundedVector {
        &mut self.vector
    }
}

impl Pack for TimeSeries {
    fn pack(&self) -> Packed {
        self.vector.pack()
    }

    fn kind(&self) -> ResultKind {
        ResultKind::Series
    }
}

/// Builder that surfaces a missing range as a construction error.
#[derive(Debug, Clone)]
pub struct TimeSeriesBuilder {
    name: String,
    unit: Unit,
    values: SeriesValues,
    timestamps: Vec<Timestamp>,
    range: Option<(Number, Number)>,
    default_value: Option<Number>,
}

impl TimeSeriesBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: Unit::none(),
            values: SeriesValues::List(Vec::new()),
            timestamps: Vec::new(),
            range: None,
            default_value: None,
        }
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn values(mut self, values: impl Into<SeriesValues>) -> Self {
        self.values = values.into();
        self
    }

    pub fn timestamps(mut self, timestamps: Vec<Timestamp>) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn range(mut self, min: impl Into<Number>, max: impl Into<Number>) -> Self {
        self.range = Some((min.into(), max.into()));
        self
    }

    pub fn default_value(mut self, value: impl Into<Number>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn build(self) -> Result<TimeSeries, ValidationError> {
        let Some((min, max)) = self.range else {
            return Err(ValidationError::MissingRange { name: self.name });
        };
        TimeSeries::new(
            self.name,
            self.unit,
            self.values,
            self.timestamps,
            min,
            max,
            self.default_value,
        )
    }
}

/// Pairs values with timestamps: truncates to the shorter list, drops NaN
/// timestamps, sorts, and keeps the first sample per timestamp.
fn normalize_samples(
    name: &str,
    values: Vec<Number>,
    timestamps: Vec<Timestamp>,
) -> Vec<(Timestamp, Number)> {
    if values.len() > timestamps.len() {
        warn!(
            series = %name,
            values = values.len(),
            timestamps = timestamps.len(),
            "each value shall have a timestamp, values truncated"
        );
    } else if values.len() < timestamps.len() {
        warn!(
            series = %name,
            values = values.len(),
            timestamps = timestamps.len(),
            "each timestamp shall have a value, timestamps truncated"
        );
    }

    let mut samples: Vec<(Timestamp, Number)> = timestamps
        .into_iter()
        .zip(values)
        .filter(|(timestamp, _)| {
            let valid = !timestamp.is_nan();
            if !valid {
                warn!(series = %name, "NaN timestamp dropped");
            }
            valid
        })
        .collect();

    if samples.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
        samples.sort_by(|left, right| left.0.total_cmp(&right.0));
        let before = samples.len();
        samples.dedup_by(|next, kept| next.0 == kept.0);
        if samples.len() < before {
            warn!(
                series = %name,
                dropped = before - samples.len(),
                "duplicate timestamps dropped"
            );
        }
    }
    samples
}

fn resolve_default(
    name: &str,
    requested: Option<Number>,
    domain: ValueDomain,
    range_min: f64,
    range_max: f64,
) -> f64 {
    let Some(value) = requested else {
        return match domain {
            ValueDomain::Integer => range_min.ceil(),
            ValueDomain::Float => range_min,
        };
    };

    let raw = value.as_f64();
    let clamped = raw.clamp(range_min, range_max);
    if clamped != raw {
        warn!(
            series = %name,
            default = raw,
            min = range_min,
            max = range_max,
            "default value clamped into range"
        );
    }
    clamped
}

/// Index pairs `(i, j)` with `a[i] == b[j]`, both inputs sorted ascending.
pub(crate) fn intersect(a: &[Timestamp], b: &[Timestamp]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            i += 1;
        } else if b[j] < a[i] {
            j += 1;
        } else {
            pairs.push((i, j));
            i += 1;
            j += 1;
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Unit {
        Unit::from_name("meter")
    }

    fn mixed() -> Vec<Number> {
        vec![1.into(), 2.into(), 3.1.into(), 4.5.into()]
    }

    #[test]
    fn builds_from_parallel_lists() {
        let series = TimeSeries::new(
            "x",
            unit(),
            mixed(),
            vec![100.0, 200.0, 300.0, 400.0],
            0.0,
            10.0,
            None,
        )
        .expect("valid series");

        assert_eq!(series.len(), 4);
        assert_eq!(series.domain(), ValueDomain::Float);
        assert_eq!(series.default_value(), 0.0);
        assert_eq!(series.value_at(300.0), Some(3.1));
        assert_eq!(series.value_at(250.0), None);
        assert_eq!(series.start_timestamp(), Some(100.0));
        assert_eq!(series.end_timestamp(), Some(400.0));
    }

    #[test]
    fn truncates_mismatched_lengths() {
        let longer_values =
            TimeSeries::new("a", unit(), vec![1, 2, 3], vec![10.0, 20.0], 0, 10, None)
                .expect("valid series");
        assert_eq!(longer_values.values(), &[1.0, 2.0]);
        assert_eq!(longer_values.timestamps(), &[10.0, 20.0]);

        let longer_timestamps =
            TimeSeries::new("b", unit(), vec![1], vec![10.0, 20.0], 0, 10, None)
                .expect("valid series");
        assert_eq!(longer_timestamps.timestamps(), &[10.0]);
    }

    #[test]
    fn broadcasts_scalars_to_every_timestamp() {
        let scalar = ScalarValue::from_number("limit", unit(), 2.5);
        let series = TimeSeries::new("c", unit(), &scalar, vec![1.0, 2.0, 3.0], 0, 10, None)
            .expect("valid series");
        assert_eq!(series.values(), &[2.5, 2.5, 2.5]);

        let constant = TimeSeries::new("k", unit(), 4_i64, vec![1.0, 2.0], 0, 10, None)
            .expect("valid series");
        assert_eq!(constant.domain(), ValueDomain::Integer);
        assert_eq!(constant.values(), &[4.0, 4.0]);
    }

    #[test]
    fn default_value_type_decides_domain() {
        let series = TimeSeries::new(
            "d",
            unit(),
            vec![1, 2, 3],
            vec![1.0, 2.0, 3.0],
            0,
            10,
            Some(Number::Float(0.5)),
        )
        .expect("valid series");
        assert_eq!(series.domain(), ValueDomain::Float);
        assert_eq!(series.values(), &[1.0, 2.0, 3.0]);

        let integer = TimeSeries::new(
            "e",
            unit(),
            mixed(),
            vec![1.0, 2.0, 3.0, 4.0],
            0,
            10,
            Some(Number::Int(0)),
        )
        .expect("valid series");
        assert_eq!(integer.domain(), ValueDomain::Integer);
        assert_eq!(integer.values(), &[1.0, 2.0]);
        assert_eq!(integer.timestamps(), &[1.0, 2.0]);
    }

    #[test]
    fn missing_range_and_bad_default_abort_construction() {
        let err = TimeSeries::builder("f")
            .values(vec![1.0])
            .timestamps(vec![1.0])
            .build()
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::MissingRange { .. }));

        let err = TimeSeries::new(
            "g",
            unit(),
            vec![1.0],
            vec![1.0],
            0,
            1,
            Some(Number::Float(f64::INFINITY)),
        )
        .expect_err("must fail");
        assert!(matches!(err, ValidationError::NonFiniteValue { .. }));
    }

    #[test]
    fn default_value_is_clamped_into_range() {
        let series = TimeSeries::builder("h")
            .range(0, 10)
            .default_value(50)
            .build()
            .expect("valid series");
        assert_eq!(series.default_value(), 10.0);
    }

    #[test]
    fn sorts_and_deduplicates_timestamps() {
        let series = TimeSeries::new(
            "i",
            unit(),
            vec![3, 1, 2, 9],
            vec![30.0, 10.0, 20.0, 10.0],
            0,
            10,
            None,
        )
        .expect("valid series");
        assert_eq!(series.timestamps(), &[10.0, 20.0, 30.0]);
        assert_eq!(series.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn construction_drops_out_of_range_samples() {
        let series = TimeSeries::new(
            "j",
            unit(),
            vec![1.0, 20.0, 3.0],
            vec![1.0, 2.0, 3.0],
            0,
            10,
            None,
        )
        .expect("valid series");
        assert_eq!(series.timestamps(), &[1.0, 3.0]);
        assert_eq!(series.len(), series.values().len());
    }

    #[test]
    fn add_sample_keeps_order_and_rejects_duplicates() {
        let mut series =
            TimeSeries::new("k", unit(), vec![1, 3], vec![10.0, 30.0], 0, 10, None)
                .expect("valid series");

        assert!(series.add_sample(20.0, 2));
        assert_eq!(series.timestamps(), &[10.0, 20.0, 30.0]);
        assert_eq!(series.values(), &[1.0, 2.0, 3.0]);

        assert!(!series.add_sample(20.0, 5));
        assert!(!series.add_sample(40.0, 2.5));
        assert!(!series.add_sample(40.0, 11));
        assert_eq!(series.len(), 3);
        assert_eq!(series.values().len(), series.timestamps().len());
    }

    #[test]
    fn integer_series_tolerates_lists_with_fractions() {
        let mut series =
            TimeSeries::new("l", unit(), vec![1], vec![10.0], 0, 10, None).expect("valid series");

        let added = series.add_samples(&[
            (20.0, Number::Int(2)),
            (30.0, Number::Float(2.1)),
            (40.0, Number::Float(4.0)),
        ]);
        assert!(added);
        assert_eq!(series.timestamps(), &[10.0, 20.0, 40.0]);
    }

    #[test]
    fn set_value_at_overwrites_or_inserts() {
        let mut series =
            TimeSeries::new("m", unit(), vec![1.0, 2.0], vec![10.0, 20.0], 0, 10, None)
                .expect("valid series");

        assert!(series.set_value_at(20.0, 7.5));
        assert!(series.set_value_at(15.0, 1.5));
        assert!(!series.set_value_at(10.0, 99.0));
        assert_eq!(series.timestamps(), &[10.0, 15.0, 20.0]);
        assert_eq!(series.values(), &[1.0, 1.5, 7.5]);
    }

    #[test]
    fn converts_microseconds_to_relative_seconds() {
        let series = TimeSeries::new(
            "n",
            unit(),
            vec![1, 2],
            vec![1_000_000.0, 2_345_678.0],
            0,
            10,
            None,
        )
        .expect("valid series");
        assert_eq!(series.times_in_seconds(1_000_000.0), vec![0.0, 1.35]);
    }

    #[test]
    fn pack_round_trips_with_external_timestamps() {
        let series = TimeSeries::new(
            "o",
            unit(),
            mixed(),
            vec![100.0, 200.0, 300.0, 400.0],
            0.0,
            10.0,
            None,
        )
        .expect("valid series");
        let packed = series.pack();
        assert_eq!(packed.values, vec![0.0, 10.0, 1.0, 2.0, 3.1, 4.5]);

        let mut restored = TimeSeries::builder("o")
            .unit(unit())
            .range(0.0, 1.0)
            .build()
            .expect("valid series");
        restored
            .unpack(&packed, series.timestamps().to_vec())
            .expect("unpack");
        assert_eq!(restored, series);

        let err = restored
            .unpack(&packed, vec![1.0])
            .expect_err("must fail");
        assert!(matches!(err, PackError::TimestampMismatch { .. }));
    }

    #[test]
    fn intersects_sorted_timestamps() {
        let pairs = intersect(&[100.0, 200.0, 300.0, 400.0], &[110.0, 200.0, 220.0, 300.0]);
        assert_eq!(pairs, vec![(1, 1), (2, 3)]);
    }

    #[test]
    fn remove_out_of_range_keeps_timestamps_aligned() {
        let mut series = TimeSeries::new("p", unit(), vec![1.0, 2.0], vec![1.0, 2.0], 0, 10, None)
            .expect("valid series");
        series.vector_mut().values_mut()[0] = 50.0;

        assert_eq!(series.remove_out_of_range(), 1);
        assert_eq!(series.timestamps(), &[2.0]);
        assert_eq!(series.remove_out_of_range(), 0);
    }
}

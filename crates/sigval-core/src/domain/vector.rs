use serde::Serialize;
use tracing::{debug, warn};

use crate::histogram::{BinSpec, HistogramSummary};
use crate::pack::{Pack, Packed, ResultKind};
use crate::plot::{BoxStats, ChartKind, ChartRenderer, ChartRequest, ChartSeries, PlotOptions, RenderedChart};
use crate::{Number, PackError, PlotError, SignalError, Unit, ValidationError, ValueDomain};

/// Ordered values with a mandatory static range `[range_min, range_max]`.
///
/// The element domain is fixed at construction. Insertions outside the range
/// or with a lossy type are dropped and logged, never clipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundedVector {
    name: String,
    unit: Unit,
    values: Vec<f64>,
    range_min: f64,
    range_max: f64,
    domain: ValueDomain,
}

impl BoundedVector {
    /// Builds a vector, dropping (and logging) initial values outside the
    /// range. NaN entries are kept as missing samples.
    ///
    /// The domain is the promoted type of `values`, or the type of
    /// `range_min` for an empty list.
    pub fn new(
        name: impl Into<String>,
        unit: Unit,
        values: impl IntoIterator<Item = impl Into<Number>>,
        range_min: impl Into<Number>,
        range_max: impl Into<Number>,
    ) -> Result<Self, ValidationError> {
        let name = validate_name(name.into())?;
        let (range_min, range_max) = (range_min.into(), range_max.into());
        validate_range(&name, range_min.as_f64(), range_max.as_f64())?;

        let values: Vec<Number> = values.into_iter().map(Into::into).collect();
        let domain = ValueDomain::promoted(&values).unwrap_or(range_min.domain());

        let mut vector = Self::from_parts(
            name,
            unit,
            Vec::with_capacity(values.len()),
            range_min.as_f64(),
            range_max.as_f64(),
            domain,
        );
        for value in values {
            let raw = value.as_f64();
            if raw.is_nan() {
                vector.values.push(raw);
            } else if let Some(accepted) = vector.admit(value) {
                vector.values.push(accepted);
            }
        }

        Ok(vector)
    }

    pub fn builder(name: impl Into<String>) -> BoundedVectorBuilder {
        BoundedVectorBuilder::new(name)
    }

    /// Builds a vector from raw values without range filtering. Use
    /// [`BoundedVector::remove_out_of_range`] to clean it afterwards.
    pub fn from_unchecked(
        name: impl Into<String>,
        unit: Unit,
        values: Vec<f64>,
        range_min: f64,
        range_max: f64,
        domain: ValueDomain,
    ) -> Result<Self, ValidationError> {
        let name = validate_name(name.into())?;
        validate_range(&name, range_min, range_max)?;
        Ok(Self::from_parts(
            name, unit, values, range_min, range_max, domain,
        ))
    }

    pub(crate) fn from_parts(
        name: String,
        unit: Unit,
        values: Vec<f64>,
        range_min: f64,
        range_max: f64,
        domain: ValueDomain,
    ) -> Self {
        Self {
            name,
            unit,
            values,
            range_min,
            range_max,
            domain,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn set_unit(&mut self, unit: Unit) {
        self.unit = unit;
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn range_min(&self) -> f64 {
        self.range_min
    }

    pub fn range_max(&self) -> f64 {
        self.range_max
    }

    pub fn domain(&self) -> ValueDomain {
        self.domain
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains_in_range(&self, value: f64) -> bool {
        self.range_min <= value && value <= self.range_max
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Inserts `value` at `index` (end when `None` or past the end).
    pub fn insert(&mut self, index: Option<usize>, value: impl Into<Number>) -> bool {
        self.insert_all(index, [value.into()])
    }

    /// Inserts every admissible value at `index`, keeping their order.
    /// Returns whether at least one value was inserted.
    pub fn insert_all(
        &mut self,
        index: Option<usize>,
        values: impl IntoIterator<Item = impl Into<Number>>,
    ) -> bool {
        let accepted: Vec<f64> = values
            .into_iter()
            .filter_map(|value| self.admit(value.into()))
            .collect();
        if accepted.is_empty() {
            return false;
        }

        let at = index.map_or(self.values.len(), |index| index.min(self.values.len()));
        self.values.splice(at..at, accepted);
        true
    }

    /// Inserts the contents of another vector.
    pub fn extend_from(&mut self, index: Option<usize>, other: &BoundedVector) -> bool {
        let domain = other.domain;
        self.insert_all(
            index,
            other.values.iter().map(|value| number_in(domain, *value)),
        )
    }

    pub fn append(&mut self, value: impl Into<Number>) -> bool {
        self.insert(None, value)
    }

    /// Removes the element at `index`; negative indices count from the end.
    pub fn delete(&mut self, index: isize) -> bool {
        match resolve_index(index, self.values.len()) {
            Some(position) => {
                self.values.remove(position);
                true
            }
            None => false,
        }
    }

    /// Overwrites in place when the value fits; otherwise nothing changes.
    pub fn set(&mut self, index: usize, value: impl Into<Number>) -> bool {
        let value = value.into();
        let raw = value.as_f64();
        if index >= self.values.len() || !self.domain.accepts(value) || !self.contains_in_range(raw)
        {
            return false;
        }

        self.values[index] = raw;
        true
    }

    pub fn mean(&self) -> Option<f64> {
        self.statistic("mean", mean(&self.values))
    }

    /// Population standard deviation.
    pub fn std_dev(&self) -> Option<f64> {
        self.statistic("std_dev", std_dev(&self.values))
    }

    pub fn max(&self) -> Option<f64> {
        self.statistic("max", nan_propagating_fold(&self.values, f64::max))
    }

    pub fn min(&self) -> Option<f64> {
        self.statistic("min", nan_propagating_fold(&self.values, f64::min))
    }

    /// First value strictly above `threshold` (default `range_min`).
    pub fn first_over_threshold(&self, threshold: Option<f64>) -> Option<f64> {
        let threshold = threshold.unwrap_or(self.range_min);
        self.values.iter().copied().find(|value| *value > threshold)
    }

    /// Last value strictly above `threshold` (default `range_min`).
    pub fn last_over_threshold(&self, threshold: Option<f64>) -> Option<f64> {
        let threshold = threshold.unwrap_or(self.range_min);
        self.values.iter().rev().copied().find(|value| *value > threshold)
    }

    /// Trailing run of values above `threshold`, bridging gaps of at most
    /// `max_gap` elements. Values inside bridged gaps are part of the run.
    pub fn last_stable_run_over_threshold(&self, threshold: Option<f64>, max_gap: usize) -> BoundedVector {
        let name = format!("{}_stable_run", self.name);
        let run = stable_run_bounds(&self.values, threshold.unwrap_or(self.range_min), max_gap)
            .map(|(first, last)| self.values[first..=last].to_vec())
            .unwrap_or_default();

        Self::from_parts(
            name,
            self.unit.clone(),
            run,
            self.range_min,
            self.range_max,
            self.domain,
        )
    }

    pub fn histogram(&self, bins: impl Into<BinSpec>, normalize: bool) -> Result<HistogramSummary, SignalError> {
        HistogramSummary::compute(self, bins.into(), normalize)
    }

    /// Strips values outside the range (NaN included). Returns how many
    /// were removed.
    pub fn remove_out_of_range(&mut self) -> usize {
        let before = self.values.len();
        let (min, max) = (self.range_min, self.range_max);
        self.values.retain(|value| min <= *value && *value <= max);

        let removed = before - self.values.len();
        if removed > 0 {
            debug!(vector = %self.name, removed, "removed values outside range");
        }
        removed
    }

    /// Keeps the values whose mask entry is `true`. The mask must match the
    /// vector length.
    pub fn retain_mask(&mut self, mask: &[bool]) -> bool {
        if mask.len() != self.values.len() {
            warn!(
                vector = %self.name,
                mask_len = mask.len(),
                len = self.values.len(),
                "mask length does not match vector length"
            );
            return false;
        }

        let mut keep = mask.iter();
        self.values.retain(|_| keep.next().copied().unwrap_or(false));
        true
    }

    /// Restores range and values from a pack, keeping name and unit.
    pub fn unpack(&mut self, packed: &Packed) -> Result<(), PackError> {
        let (range_min, range_max, values) = split_range(packed, "vector")?;
        self.range_min = range_min;
        self.range_max = range_max;
        self.domain = restored_domain(self.domain, values);
        self.values = values.to_vec();
        Ok(())
    }

    /// Vertical box plot of the values.
    pub fn box_plot(
        &self,
        renderer: &dyn ChartRenderer,
        whisker_ratio: f64,
        options: &PlotOptions,
    ) -> Result<RenderedChart, PlotError> {
        let stats = BoxStats::from_values(&self.values, whisker_ratio)
            .ok_or_else(|| PlotError::EmptyChart(self.name.clone()))?;

        let request = ChartRequest::new(self.name.clone(), ChartKind::Box(stats), options)
            .with_labels("", self.unit.to_string())
            .with_series(vec![ChartSeries::from_values(self.name.clone(), &self.values)]);
        renderer.render(&request)
    }

    pub(crate) fn values_mut(&mut self) -> &mut Vec<f64> {
        &mut self.values
    }

    /// Checks one candidate against domain and range, logging rejections.
    pub(crate) fn admit(&self, value: Number) -> Option<f64> {
        if !self.domain.accepts(value) {
            warn!(
                vector = %self.name,
                value = %value,
                domain = %self.domain,
                "value type does not match vector domain, not inserted"
            );
            return None;
        }

        let raw = value.as_f64();
        if raw.is_nan() {
            warn!(vector = %self.name, "NaN value not inserted");
            None
        } else if raw < self.range_min {
            warn!(
                vector = %self.name,
                value = raw,
                min = self.range_min,
                "value below range_min, not inserted"
            );
            None
        } else if raw > self.range_max {
            warn!(
                vector = %self.name,
                value = raw,
                max = self.range_max,
                "value above range_max, not inserted"
            );
            None
        } else {
            Some(raw)
        }
    }

    fn statistic(&self, statistic: &'static str, result: f64) -> Option<f64> {
        if self.values.is_empty() || result.is_nan() {
            warn!(
                vector = %self.name,
                statistic,
                len = self.values.len(),
                "statistic undefined for empty or NaN vector"
            );
            None
        } else {
            Some(result)
        }
    }
}

impl Pack for BoundedVector {
    fn pack(&self) -> Packed {
        Packed::values_only(pack_range(self.range_min, self.range_max, &self.values))
    }

    fn kind(&self) -> ResultKind {
        ResultKind::Vector
    }
}

/// Builder that surfaces a missing range as a construction error.
#[derive(Debug, Clone)]
pub struct BoundedVectorBuilder {
    name: String,
    unit: Unit,
    values: Vec<Number>,
    range: Option<(Number, Number)>,
}

impl BoundedVectorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: Unit::none(),
            values: Vec::new(),
            range: None,
        }
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn values(mut self, values: impl IntoIterator<Item = impl Into<Number>>) -> Self {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn range(mut self, min: impl Into<Number>, max: impl Into<Number>) -> Self {
        self.range = Some((min.into(), max.into()));
        self
    }

    pub fn build(self) -> Result<BoundedVector, ValidationError> {
        let Some((min, max)) = self.range else {
            return Err(ValidationError::MissingRange { name: self.name });
        };
        BoundedVector::new(self.name, self.unit, self.values, min, max)
    }
}

pub(crate) fn validate_name(name: String) -> Result<String, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name)
}

pub(crate) fn validate_range(name: &str, min: f64, max: f64) -> Result<(), ValidationError> {
    if min.is_nan() {
        return Err(ValidationError::NonFiniteValue { field: "range_min" });
    }
    if max.is_nan() {
        return Err(ValidationError::NonFiniteValue { field: "range_max" });
    }
    if min > max {
        return Err(ValidationError::InvertedRange {
            name: name.to_owned(),
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn number_in(domain: ValueDomain, value: f64) -> Number {
    match domain {
        ValueDomain::Integer if value.fract() == 0.0 => Number::Int(value as i64),
        _ => Number::Float(value),
    }
}

pub(crate) fn resolve_index(index: isize, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        len.checked_sub(index.unsigned_abs())?
    } else {
        index.unsigned_abs()
    };
    (resolved < len).then_some(resolved)
}

pub(crate) fn pack_range(range_min: f64, range_max: f64, values: &[f64]) -> Vec<f64> {
    let mut packed = Vec::with_capacity(values.len() + 2);
    packed.push(range_min);
    packed.push(range_max);
    packed.extend_from_slice(values);
    packed
}

pub(crate) fn split_range<'a>(
    packed: &'a Packed,
    kind: &'static str,
) -> Result<(f64, f64, &'a [f64]), PackError> {
    match packed.values.as_slice() {
        [range_min, range_max, values @ ..] => Ok((*range_min, *range_max, values)),
        _ => Err(PackError::TooShort {
            kind,
            expected: 2,
            actual: packed.values.len(),
        }),
    }
}

/// Keeps an integer domain only while every restored value is integral.
pub(crate) fn restored_domain(current: ValueDomain, values: &[f64]) -> ValueDomain {
    match current {
        ValueDomain::Integer => ValueDomain::from_values(values),
        ValueDomain::Float => ValueDomain::Float,
    }
}

/// `(first, last)` element indices of the trailing stable run.
pub(crate) fn stable_run_bounds(values: &[f64], threshold: f64, max_gap: usize) -> Option<(usize, usize)> {
    let over: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, value)| **value > threshold)
        .map(|(index, _)| index)
        .collect();
    let last = *over.last()?;

    let mut first = last;
    for pair in over.windows(2).rev() {
        if pair[1] - pair[0] > max_gap + 1 {
            break;
        }
        first = pair[0];
    }
    Some((first, last))
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    let mean = mean(values);
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// Fold that returns NaN as soon as any element is NaN.
pub(crate) fn nan_propagating_fold(values: &[f64], pick: fn(f64, f64) -> f64) -> f64 {
    let mut iter = values.iter().copied();
    let Some(first) = iter.next() else {
        return f64::NAN;
    };
    iter.fold(first, |acc, value| {
        if acc.is_nan() || value.is_nan() {
            f64::NAN
        } else {
            pick(acc, value)
        }
    })
}

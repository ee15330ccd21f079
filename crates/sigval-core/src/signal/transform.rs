use tracing::{error, warn};

use super::operand::Operand;
use super::{intersect, BooleanTimeSeries, TimeSeries, Timestamp};
use crate::domain::vector::stable_run_bounds;
use crate::{Number, SignalError, ValueDomain};

impl TimeSeries {
    /// Samples at timestamps shared with `condition` where the condition
    /// holds.
    pub fn when(&self, condition: &BooleanTimeSeries) -> TimeSeries {
        let mask = condition.as_series();
        let (values, timestamps) = intersect(self.timestamps(), mask.timestamps())
            .into_iter()
            .filter(|(_, j)| mask.values()[*j] == 1.0)
            .map(|(i, _)| (self.values()[i], self.timestamps()[i]))
            .unzip();

        self.with_samples(
            format!("{}_when_{}", self.name(), condition.name()),
            values,
            timestamps,
        )
    }

    /// Redefines the series on `new_timestamps`, copying values at existing
    /// timestamps and filling the rest with `default_value` (or the stored
    /// default).
    pub fn resample(
        &self,
        new_timestamps: &[Timestamp],
        default_value: Option<Number>,
    ) -> Result<TimeSeries, SignalError> {
        let fill = match default_value {
            None => self.default_value(),
            Some(value) => self.check_default(value)?,
        };

        let mut timestamps: Vec<Timestamp> = new_timestamps
            .iter()
            .copied()
            .filter(|timestamp| !timestamp.is_nan())
            .collect();
        timestamps.sort_by(f64::total_cmp);
        timestamps.dedup();

        if timestamps == self.timestamps() {
            return Ok(self.clone());
        }

        let values = timestamps
            .iter()
            .map(|timestamp| self.value_at(*timestamp).unwrap_or(fill))
            .collect();
        Ok(self.with_samples(self.name().to_owned(), values, timestamps))
    }

    fn check_default(&self, value: Number) -> Result<f64, SignalError> {
        if self.domain() == ValueDomain::Integer && value.domain() == ValueDomain::Float {
            error!(
                series = %self.name(),
                default = %value,
                "float default value cannot fill an integer series"
            );
            return Err(SignalError::IncompatibleDefault {
                name: self.name().to_owned(),
                value: value.as_f64(),
                domain: self.domain().as_str(),
            });
        }

        let raw = value.as_f64();
        if !self.as_vector().contains_in_range(raw) {
            error!(
                series = %self.name(),
                default = raw,
                min = self.range_min(),
                max = self.range_max(),
                "default value outside the series range"
            );
            return Err(SignalError::DefaultOutOfRange {
                name: self.name().to_owned(),
                value: raw,
                min: self.range_min(),
                max: self.range_max(),
            });
        }
        Ok(raw)
    }

    /// Two-threshold classification: on from the first sample above
    /// `catch` while samples stay at or above `drop`.
    ///
    /// `catch == drop` is a plain `> catch`; `drop > catch` is unsupported.
    pub fn hysteresis<'b>(
        &self,
        catch: impl Into<Operand<'b>>,
        drop: impl Into<Operand<'b>>,
    ) -> Result<BooleanTimeSeries, SignalError> {
        let catch = catch.into().constant("hysteresis", self.name())?;
        let drop = drop.into().constant("hysteresis", self.name())?;
        let (catch_value, drop_value) = (catch.as_f64(), drop.as_f64());

        if drop_value > catch_value {
            error!(
                series = %self.name(),
                catch = catch_value,
                drop = drop_value,
                "hysteresis with drop above catch is not implemented"
            );
            return Err(SignalError::UnsupportedConfiguration {
                name: self.name().to_owned(),
                reason: format!("hysteresis drop {drop} is above catch {catch}"),
            });
        }
        if drop_value == catch_value {
            return self.greater_than(catch);
        }

        let mut active = false;
        let values = self
            .values()
            .iter()
            .map(|value| {
                active = *value > catch_value || (active && *value >= drop_value);
                if active {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();

        Ok(BooleanTimeSeries::from_parts(
            format!(
                "{}_in_hysteresis_between_{catch}_and_{drop}",
                self.name()
            ),
            values,
            self.timestamps().to_vec(),
        ))
    }

    /// Maximal runs of consecutive samples above `threshold` (default:
    /// `range_min`).
    pub fn split_runs_over_threshold(&self, threshold: Option<f64>) -> Vec<TimeSeries> {
        let threshold = threshold.unwrap_or(self.range_min());
        let mut runs = Vec::new();
        let mut start = None;

        for (index, value) in self.values().iter().enumerate() {
            match (start, *value > threshold) {
                (None, true) => start = Some(index),
                (Some(first), false) => {
                    runs.push(self.slice(first, index));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(first) = start {
            runs.push(self.slice(first, self.len()));
        }
        runs
    }

    /// Last run above `threshold` where gaps of at most `max_gap` samples
    /// are bridged.
    pub fn last_stable_run_over_threshold(&self, threshold: Option<f64>, max_gap: usize) -> TimeSeries {
        let threshold = threshold.unwrap_or(self.range_min());
        let name = format!("{}_stable_run", self.name());
        match stable_run_bounds(self.values(), threshold, max_gap) {
            Some((first, last)) => {
                let mut run = self.slice(first, last + 1);
                run.set_name(name);
                run
            }
            None => self.with_samples(name, Vec::new(), Vec::new()),
        }
    }

    /// Samples with timestamps in `[start, stop]`; an absent bound is open.
    ///
    /// Bounds entirely outside the series span are an error, unlike an
    /// interval that merely contains no sample.
    pub fn subset_for_interval(
        &self,
        start: Option<Timestamp>,
        stop: Option<Timestamp>,
    ) -> Result<TimeSeries, SignalError> {
        if start.is_none() && stop.is_none() {
            return Ok(self.clone());
        }

        let (Some(first), Some(last)) = (self.start_timestamp(), self.end_timestamp()) else {
            let bound = start.or(stop).unwrap_or(f64::NAN);
            error!(series = %self.name(), bound, "cannot cut an interval out of an empty series");
            return Err(SignalError::IntervalOutOfBounds {
                name: self.name().to_owned(),
                bound,
            });
        };

        if let Some(bound) = start.filter(|start| *start > last) {
            error!(series = %self.name(), bound, last, "interval starts after the series ends");
            return Err(SignalError::IntervalOutOfBounds {
                name: self.name().to_owned(),
                bound,
            });
        }
        if let Some(bound) = stop.filter(|stop| *stop < first) {
            error!(series = %self.name(), bound, first, "interval stops before the series starts");
            return Err(SignalError::IntervalOutOfBounds {
                name: self.name().to_owned(),
                bound,
            });
        }

        let from = start.map_or(0, |start| {
            self.timestamps().partition_point(|timestamp| *timestamp < start)
        });
        let to = stop.map_or(self.len(), |stop| {
            self.timestamps().partition_point(|timestamp| *timestamp <= stop)
        });
        if from > to {
            warn!(series = %self.name(), ?start, ?stop, "inverted interval yields no samples");
            return Ok(self.slice(0, 0));
        }
        Ok(self.slice(from, to))
    }

    /// Contiguous index range `[from, to)` with unchanged metadata.
    pub(crate) fn slice(&self, from: usize, to: usize) -> TimeSeries {
        self.with_samples(
            self.name().to_owned(),
            self.values()[from..to].to_vec(),
            self.timestamps()[from..to].to_vec(),
        )
    }
}

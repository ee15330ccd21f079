use tracing::warn;

use super::{intersect, TimeSeries, Timestamp};
use crate::plot::{ChartKind, ChartRenderer, ChartRequest, ChartSeries, Extent, PlotOptions, RenderedChart};
use crate::{PlotError, SignalError};

impl TimeSeries {
    /// Time plot of `self` plus companions sharing its unit.
    ///
    /// With a `timebase` the master is resampled onto it first; companions
    /// are always resampled onto the master's timestamps. Companions with a
    /// different unit are skipped.
    pub fn plot(
        &self,
        companions: &[&TimeSeries],
        timebase: Option<&[Timestamp]>,
        renderer: &dyn ChartRenderer,
        options: &PlotOptions,
    ) -> Result<RenderedChart, PlotError> {
        let master = match timebase {
            Some(timestamps) => self.resample(timestamps, None)?,
            None => self.clone(),
        };
        let Some(origin) = master.start_timestamp() else {
            return Err(PlotError::EmptyChart(self.name().to_owned()));
        };

        let mut drawn = vec![master.clone()];
        for companion in companions {
            if !companion.unit().same_dimension(self.unit()) {
                warn!(
                    series = %self.name(),
                    companion = %companion.name(),
                    expected = %self.unit(),
                    found = %companion.unit(),
                    "companion unit differs, not plotted"
                );
                continue;
            }
            match companion.resample(master.timestamps(), None) {
                Ok(resampled) => drawn.push(resampled),
                Err(err) => {
                    warn!(series = %self.name(), companion = %companion.name(), %err, "companion not plotted")
                }
            }
        }

        let seconds = master.times_in_seconds(origin);
        let series = drawn
            .iter()
            .map(|signal| {
                let points = seconds.iter().copied().zip(signal.values().iter().copied()).collect();
                ChartSeries::new(signal.name(), points)
            })
            .collect();

        let x_extent = seconds.first().zip(seconds.last()).map(|(min, max)| Extent {
            min: *min,
            max: *max,
        });
        let y_extent = padded_extent(
            drawn.iter().flat_map(|signal| signal.values().iter().copied()),
            options.legend,
        );

        let request = ChartRequest::new(self.name(), line_or_scatter(options), options)
            .with_labels("time [s]", self.unit().to_string())
            .with_series(series)
            .with_extents(x_extent, y_extent);
        renderer.render(&request)
    }

    /// X/y plot: `self` on the x axis against each of `others` on their
    /// common timestamps.
    pub fn plot_xy(
        &self,
        others: &[&TimeSeries],
        renderer: &dyn ChartRenderer,
        options: &PlotOptions,
    ) -> Result<RenderedChart, PlotError> {
        let Some(first) = others.first() else {
            return Err(PlotError::EmptyChart(self.name().to_owned()));
        };
        if let Some(odd) = others.iter().find(|other| !other.unit().same_dimension(first.unit())) {
            return Err(SignalError::UnitMismatch {
                name: odd.name().to_owned(),
                expected: first.unit().label.clone(),
                found: odd.unit().label.clone(),
            }
            .into());
        }

        let series: Vec<ChartSeries> = others
            .iter()
            .map(|other| {
                let points = intersect(self.timestamps(), other.timestamps())
                    .into_iter()
                    .map(|(i, j)| (self.values()[i], other.values()[j]))
                    .collect();
                ChartSeries::new(other.name(), points)
            })
            .collect();
        if series.iter().all(|drawn| drawn.points.is_empty()) {
            return Err(SignalError::NoCommonTimestamps {
                name: self.name().to_owned(),
            }
            .into());
        }

        let y_extent = padded_extent(
            series
                .iter()
                .flat_map(|drawn| drawn.points.iter().map(|(_, y)| *y)),
            options.legend,
        );
        let request = ChartRequest::new(self.name(), line_or_scatter(options), options)
            .with_labels(self.unit().to_string(), first.unit().to_string())
            .with_series(series)
            .with_extents(None, y_extent);
        renderer.render(&request)
    }
}

fn line_or_scatter(options: &PlotOptions) -> ChartKind {
    if options.scatter {
        ChartKind::Scatter
    } else {
        ChartKind::Line
    }
}

/// Finite value extent, padded 5% below and 15% above when a legend needs
/// room, 5% both ways otherwise.
fn padded_extent(values: impl Iterator<Item = f64>, legend: bool) -> Option<Extent> {
    let (min, max) = values
        .filter(|value| value.is_finite())
        .fold(None, |extent: Option<(f64, f64)>, value| match extent {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })?;

    let span = if max > min { max - min } else { max.abs().max(1.0) };
    let top = if legend { 0.15 } else { 0.05 };
    Some(Extent {
        min: min - span * 0.05,
        max: max + span * top,
    })
}

//! Binned summaries of a [`BoundedVector`].

use serde::Serialize;
use tracing::warn;

use crate::pack::{Pack, Packed, ResultKind};
use crate::plot::{
    BarOrientation, ChartKind, ChartRenderer, ChartRequest, ChartSeries, PlotOptions,
    RenderedChart,
};
use crate::{BoundedVector, PackError, PlotError, SignalError, Unit};

/// Literal used in descriptors for an absent parameter.
const ABSENT: &str = "None";

/// Number of leading bins a pie chart keeps in its optimised view.
const PIE_TOP_BINS: usize = 3;

/// Largest equal-width bin count accepted by [`HistogramSummary::compute`].
pub const MAX_BINS: usize = 10_000;

/// Bin specification: an equal-width bin count or explicit edges.
#[derive(Debug, Clone, PartialEq)]
pub enum BinSpec {
    Count(usize),
    Edges(Vec<f64>),
}

impl From<usize> for BinSpec {
    fn from(count: usize) -> Self {
        Self::Count(count)
    }
}

impl From<Vec<f64>> for BinSpec {
    fn from(edges: Vec<f64>) -> Self {
        Self::Edges(edges)
    }
}

impl From<&[f64]> for BinSpec {
    fn from(edges: &[f64]) -> Self {
        Self::Edges(edges.to_vec())
    }
}

/// Histogram of a vector's values plus the source's summary statistics.
///
/// `hist[i]` counts values in `[pattern[i], pattern[i + 1])`; values below
/// the first edge or at/after the last edge are not counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSummary {
    name: String,
    unit: Unit,
    pattern: Vec<f64>,
    hist: Vec<f64>,
    max: Option<f64>,
    min: Option<f64>,
    std_dev: Option<f64>,
    mean: Option<f64>,
    plot_config: Vec<String>,
}

impl HistogramSummary {
    pub fn compute(
        source: &BoundedVector,
        bins: BinSpec,
        normalize: bool,
    ) -> Result<Self, SignalError> {
        let finite: Vec<f64> = source
            .values()
            .iter()
            .copied()
            .filter(|value| value.is_finite())
            .collect();
        let (Some(low), Some(high)) = (
            finite.iter().copied().reduce(f64::min),
            finite.iter().copied().reduce(f64::max),
        ) else {
            warn!(vector = %source.name(), "histogram of a vector without finite values");
            return Err(SignalError::EmptySource {
                name: source.name().to_owned(),
            });
        };

        let pattern = match bins {
            BinSpec::Count(0) => {
                return Err(unsupported(source.name(), "bin count must be positive"));
            }
            BinSpec::Count(count) if count > MAX_BINS => {
                return Err(unsupported(
                    source.name(),
                    &format!("bin count {count} exceeds the maximum of {MAX_BINS}"),
                ));
            }
            BinSpec::Count(count) => equal_width_edges(low, high, count),
            BinSpec::Edges(edges) => {
                if edges.len() < 2 || edges.windows(2).any(|pair| !(pair[0] < pair[1])) {
                    return Err(unsupported(
                        source.name(),
                        "bin edges must be at least two strictly increasing values",
                    ));
                }
                edges
            }
        };

        let mut hist = count_into_bins(source.values(), &pattern);
        if normalize {
            let skipped = source.len() - finite.len();
            if skipped > 0 {
                warn!(vector = %source.name(), skipped, "non-finite values left out of the percentages");
            }
            let total = finite.len() as f64;
            hist.iter_mut().for_each(|count| *count = *count / total * 100.0);
        }

        Ok(Self {
            name: source.name().to_owned(),
            unit: source.unit().clone(),
            pattern,
            hist,
            max: source.max(),
            min: source.min(),
            std_dev: source.std_dev(),
            mean: source.mean(),
            plot_config: Vec::new(),
        })
    }

    /// A summary without bins, to be filled by [`HistogramSummary::unpack`].
    pub fn empty(name: impl Into<String>, unit: Unit) -> Self {
        Self {
            name: name.into(),
            unit,
            pattern: Vec::new(),
            hist: Vec::new(),
            max: None,
            min: None,
            std_dev: None,
            mean: None,
            plot_config: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Bin edges.
    pub fn pattern(&self) -> &[f64] {
        &self.pattern
    }

    /// Per-bin counts (percentages when normalized).
    pub fn hist(&self) -> &[f64] {
        &self.hist
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.std_dev
    }

    pub fn mean(&self) -> Option<f64> {
        self.mean
    }

    pub fn plot_config(&self) -> &[String] {
        &self.plot_config
    }

    /// Stores the chart descriptor. A descriptor is set once; later calls
    /// are ignored and return `false`.
    pub fn set_plot_config(&mut self, descriptor: Vec<String>) -> bool {
        if !self.plot_config.is_empty() {
            warn!(histogram = %self.name, "plot configuration already set, not changed");
            return false;
        }
        self.plot_config = descriptor;
        true
    }

    pub fn configure(&mut self, config: &PlotConfig) -> bool {
        self.set_plot_config(config.to_descriptor())
    }

    /// Typed view of the stored descriptor.
    pub fn chart_config(&self) -> Option<PlotConfig> {
        PlotConfig::from_descriptor(&self.plot_config)
    }

    /// Restores statistics, bins and descriptor from a pack.
    pub fn unpack(&mut self, packed: &Packed) -> Result<(), PackError> {
        let values = packed.values.as_slice();
        if values.len() < 6 {
            return Err(PackError::TooShort {
                kind: "histogram",
                expected: 6,
                actual: values.len(),
            });
        }
        let (stats, pairs) = values.split_at(4);
        if pairs.len() % 2 != 0 {
            return Err(PackError::OddPairCount {
                actual: pairs.len(),
            });
        }

        let present = |value: f64| (!value.is_nan()).then_some(value);
        self.max = present(stats[0]);
        self.min = present(stats[1]);
        self.std_dev = present(stats[2]);
        self.mean = present(stats[3]);

        self.pattern = pairs.iter().step_by(2).copied().collect();
        self.hist = pairs.iter().skip(1).step_by(2).copied().collect();
        self.hist.pop();
        self.plot_config = packed.messages.clone();
        Ok(())
    }

    /// Draws the histogram according to its descriptor (bar chart when none
    /// is set).
    pub fn render(
        &self,
        renderer: &dyn ChartRenderer,
        options: &PlotOptions,
    ) -> Result<RenderedChart, PlotError> {
        let config = self.chart_config().unwrap_or_else(PlotConfig::default_bar);
        let x_label = self.unit.to_string();

        let request = match &config {
            PlotConfig::Bar {
                label_rotation,
                label_size,
                relative_bar_size,
                orientation,
                labels,
                ..
            } => {
                let categories = if labels.len() == self.hist.len() {
                    labels.clone()
                } else {
                    self.interval_labels()
                };
                ChartRequest::new(
                    self.name.clone(),
                    ChartKind::Bar {
                        orientation: *orientation,
                        relative_bar_size: *relative_bar_size,
                        label_rotation: *label_rotation,
                        label_size: *label_size,
                    },
                    options,
                )
                .with_labels(x_label, self.count_label())
                .with_categories(categories)
                .with_series(vec![ChartSeries::from_values(self.name.clone(), &self.hist)])
            }
            PlotConfig::Pie {
                legend,
                labels_fontsize,
                legend_fontsize,
                optimised_view,
                labels,
                ..
            } => {
                let labels = if labels.len() == self.hist.len() {
                    labels.clone()
                } else {
                    self.interval_labels()
                };
                let (categories, values) = if *optimised_view {
                    top_bins(&labels, &self.hist, PIE_TOP_BINS)
                } else {
                    (labels, self.hist.clone())
                };
                ChartRequest::new(
                    self.name.clone(),
                    ChartKind::Pie {
                        legend: *legend,
                        labels_fontsize: *labels_fontsize,
                        legend_fontsize: *legend_fontsize,
                    },
                    options,
                )
                .with_categories(categories)
                .with_series(vec![ChartSeries::from_values(self.name.clone(), &values)])
            }
            PlotConfig::Distribution {
                draw_lines,
                write_text,
                x_label: custom_x,
                y_label: custom_y,
                legend,
                ..
            } => {
                let centers: Vec<(f64, f64)> = self
                    .pattern
                    .windows(2)
                    .zip(&self.hist)
                    .map(|(edges, count)| ((edges[0] + edges[1]) / 2.0, *count))
                    .collect();
                ChartRequest::new(
                    self.name.clone(),
                    ChartKind::Distribution {
                        mean: self.mean.unwrap_or(f64::NAN),
                        sigma: self.std_dev.unwrap_or(f64::NAN),
                        draw_lines: *draw_lines,
                        write_text: *write_text,
                    },
                    options,
                )
                .with_labels(
                    custom_x.clone().unwrap_or(x_label),
                    custom_y.clone().unwrap_or_else(|| self.count_label()),
                )
                .with_series(vec![ChartSeries::new(
                    legend.clone().unwrap_or_else(|| self.name.clone()),
                    centers,
                )])
            }
        };

        let request = match config.title() {
            Some(title) => request.with_title(title),
            None => request,
        };
        renderer.render(&request)
    }

    /// Draws this histogram next to `other` as grouped bars over this
    /// histogram's bins.
    pub fn compare_to(
        &self,
        other: &HistogramSummary,
        renderer: &dyn ChartRenderer,
        options: &PlotOptions,
    ) -> Result<RenderedChart, PlotError> {
        let request = ChartRequest::new(
            format!("{}_vs_{}", self.name, other.name),
            ChartKind::GroupedBar,
            options,
        )
        .with_labels(self.unit.to_string(), self.count_label())
        .with_categories(self.interval_labels())
        .with_series(vec![
            ChartSeries::from_values(self.name.clone(), &self.hist),
            ChartSeries::from_values(other.name.clone(), &other.hist),
        ]);
        renderer.render(&request)
    }

    fn interval_labels(&self) -> Vec<String> {
        self.pattern
            .windows(2)
            .map(|edges| format!("[{}, {})", edges[0], edges[1]))
            .collect()
    }

    fn count_label(&self) -> String {
        String::from("count")
    }
}

impl Pack for HistogramSummary {
    /// `[max, min, sigma, mean, edge_0, count_0, ..., edge_n, 0]`; absent
    /// statistics pack as NaN.
    fn pack(&self) -> Packed {
        let mut values = Vec::with_capacity(4 + self.pattern.len() * 2);
        for stat in [self.max, self.min, self.std_dev, self.mean] {
            values.push(stat.unwrap_or(f64::NAN));
        }
        for (index, edge) in self.pattern.iter().enumerate() {
            values.push(*edge);
            values.push(self.hist.get(index).copied().unwrap_or(0.0));
        }
        Packed::new(values, self.plot_config.clone())
    }

    fn kind(&self) -> ResultKind {
        ResultKind::Histogram
    }
}

/// Typed chart descriptor. Each variant maps to a fixed positional string
/// layout, so it survives persistence as plain messages.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotConfig {
    Bar {
        title: Option<String>,
        label_rotation: Option<f64>,
        label_size: Option<f64>,
        relative_bar_size: f64,
        orientation: BarOrientation,
        labels: Vec<String>,
    },
    Pie {
        title: Option<String>,
        legend: bool,
        labels_fontsize: Option<f64>,
        legend_fontsize: Option<f64>,
        optimised_view: bool,
        labels: Vec<String>,
    },
    Distribution {
        title: Option<String>,
        draw_lines: bool,
        write_text: Option<f64>,
        x_label: Option<String>,
        y_label: Option<String>,
        legend: Option<String>,
    },
}

impl PlotConfig {
    pub fn default_bar() -> Self {
        Self::Bar {
            title: None,
            label_rotation: None,
            label_size: None,
            relative_bar_size: 0.9,
            orientation: BarOrientation::Vertical,
            labels: Vec::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Bar { title, .. } | Self::Pie { title, .. } | Self::Distribution { title, .. } => {
                title.as_deref()
            }
        }
    }

    pub fn to_descriptor(&self) -> Vec<String> {
        match self {
            Self::Bar {
                title,
                label_rotation,
                label_size,
                relative_bar_size,
                orientation,
                labels,
            } => {
                let mut out = vec![
                    String::from("bar"),
                    text(title.as_deref()),
                    number(*label_rotation),
                    number(*label_size),
                    relative_bar_size.to_string(),
                    orientation.as_str().to_owned(),
                ];
                out.extend(labels.iter().cloned());
                out
            }
            Self::Pie {
                title,
                legend,
                labels_fontsize,
                legend_fontsize,
                optimised_view,
                labels,
            } => {
                let mut out = vec![
                    String::from("pie"),
                    text(title.as_deref()),
                    flag(*legend),
                    number(*labels_fontsize),
                    number(*legend_fontsize),
                    flag(*optimised_view),
                ];
                out.extend(labels.iter().cloned());
                out
            }
            Self::Distribution {
                title,
                draw_lines,
                write_text,
                x_label,
                y_label,
                legend,
            } => vec![
                String::from("distribution"),
                text(title.as_deref()),
                flag(*draw_lines),
                number(*write_text),
                text(x_label.as_deref()),
                text(y_label.as_deref()),
                text(legend.as_deref()),
            ],
        }
    }

    pub fn from_descriptor(descriptor: &[String]) -> Option<Self> {
        let (kind, rest) = descriptor.split_first()?;
        match kind.as_str() {
            "bar" => {
                let [title, rotation, size, relative, orientation, labels @ ..] = rest else {
                    return None;
                };
                Some(Self::Bar {
                    title: parse_text(title),
                    label_rotation: parse_number(rotation),
                    label_size: parse_number(size),
                    relative_bar_size: parse_number(relative)?,
                    orientation: BarOrientation::parse(orientation)?,
                    labels: labels.to_vec(),
                })
            }
            "pie" => {
                let [title, legend, labels_fontsize, legend_fontsize, optimised, labels @ ..] = rest
                else {
                    return None;
                };
                Some(Self::Pie {
                    title: parse_text(title),
                    legend: parse_flag(legend)?,
                    labels_fontsize: parse_number(labels_fontsize),
                    legend_fontsize: parse_number(legend_fontsize),
                    optimised_view: parse_flag(optimised)?,
                    labels: labels.to_vec(),
                })
            }
            "distribution" => {
                let [title, draw_lines, write_text, x_label, y_label, legend] = rest else {
                    return None;
                };
                Some(Self::Distribution {
                    title: parse_text(title),
                    draw_lines: parse_flag(draw_lines)?,
                    write_text: parse_number(write_text),
                    x_label: parse_text(x_label),
                    y_label: parse_text(y_label),
                    legend: parse_text(legend),
                })
            }
            _ => None,
        }
    }
}

fn equal_width_edges(low: f64, high: f64, count: usize) -> Vec<f64> {
    let step = (high - low) / count as f64;
    let mut edges: Vec<f64> = (0..=count).map(|index| low + index as f64 * step).collect();
    if let Some(last) = edges.last_mut() {
        *last = high;
    }
    edges
}

fn count_into_bins(values: &[f64], edges: &[f64]) -> Vec<f64> {
    let mut counts = vec![0.0; edges.len().saturating_sub(1)];
    for value in values {
        if !(*value >= edges[0]) {
            continue;
        }
        if let Some(bin) = edges.windows(2).position(|pair| *value < pair[1]) {
            counts[bin] += 1.0;
        }
    }
    counts
}

/// The `keep` largest bins plus an `Others` bin holding the remainder.
fn top_bins(labels: &[String], values: &[f64], keep: usize) -> (Vec<String>, Vec<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|left, right| values[*right].total_cmp(&values[*left]));

    let (top, rest) = order.split_at(keep.min(order.len()));
    let mut out_labels: Vec<String> = top.iter().map(|index| labels[*index].clone()).collect();
    let mut out_values: Vec<f64> = top.iter().map(|index| values[*index]).collect();
    if !rest.is_empty() {
        out_labels.push(String::from("Others"));
        out_values.push(rest.iter().map(|index| values[*index]).sum());
    }
    (out_labels, out_values)
}

fn unsupported(name: &str, reason: &str) -> SignalError {
    warn!(vector = %name, reason, "unsupported histogram bins");
    SignalError::UnsupportedConfiguration {
        name: name.to_owned(),
        reason: reason.to_owned(),
    }
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or(ABSENT).to_owned()
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| ABSENT.to_owned(), |value| value.to_string())
}

fn flag(value: bool) -> String {
    String::from(if value { "True" } else { "False" })
}

fn parse_text(value: &str) -> Option<String> {
    (value != ABSENT).then(|| value.to_owned())
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse().ok()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "True" | "true" | "1" => Some(true),
        "False" | "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::JsonChartRenderer;
    use crate::{Number, ValueDomain};

    fn source() -> BoundedVector {
        BoundedVector::new(
            "lateral_offset",
            Unit::from_name("meter"),
            [1, 2, 2, 3, 3, 3, 4],
            0,
            10,
        )
        .expect("valid range")
    }

    #[test]
    fn equal_width_bins_span_min_to_max() {
        let histogram = source().histogram(3_usize, false).expect("histogram");

        assert_eq!(histogram.pattern(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(histogram.hist().len(), histogram.pattern().len() - 1);
        // Edge values fall into the following bin; the maximum sits on the
        // last edge and is not counted.
        assert_eq!(histogram.hist(), &[1.0, 2.0, 3.0]);
        assert_eq!(histogram.max(), Some(4.0));
    }

    #[test]
    fn explicit_edges_drop_values_outside() {
        let histogram = source()
            .histogram(vec![2.0, 3.0, 10.0], false)
            .expect("histogram");
        assert_eq!(histogram.hist(), &[2.0, 4.0]);
    }

    #[test]
    fn normalized_counts_are_percentages_of_all_values() {
        let vector = BoundedVector::new("v", Unit::none(), [0, 0, 1, 1], 0, 5).expect("valid");
        let histogram = vector.histogram(vec![0.0, 1.0, 2.0], true).expect("histogram");
        assert_eq!(histogram.hist(), &[50.0, 50.0]);
    }

    #[test]
    fn normalized_counts_leave_missing_samples_out_of_the_total() {
        let vector = BoundedVector::from_unchecked(
            "gappy",
            Unit::none(),
            vec![0.0, f64::NAN, 0.5, 1.5, f64::NAN],
            0.0,
            5.0,
            ValueDomain::Float,
        )
        .expect("valid range");

        let histogram = vector.histogram(vec![0.0, 1.0, 2.0], true).expect("histogram");

        assert_eq!(histogram.hist(), &[2.0 / 3.0 * 100.0, 1.0 / 3.0 * 100.0]);
        let total: f64 = histogram.hist().iter().sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn bin_count_is_capped() {
        let histogram = source().histogram(MAX_BINS, false).expect("histogram");
        assert_eq!(histogram.hist().len(), MAX_BINS);

        let err = source().histogram(MAX_BINS + 1, false).expect_err("must fail");
        assert!(matches!(
            err,
            SignalError::UnsupportedConfiguration { ref reason, .. } if reason.contains("maximum")
        ));
    }

    #[test]
    fn rejects_invalid_bins_and_empty_sources() {
        let err = source().histogram(0_usize, false).expect_err("must fail");
        assert!(matches!(err, SignalError::UnsupportedConfiguration { .. }));

        let err = source().histogram(vec![3.0, 1.0], false).expect_err("must fail");
        assert!(matches!(err, SignalError::UnsupportedConfiguration { .. }));

        let empty = BoundedVector::new("e", Unit::none(), Vec::<Number>::new(), 0, 1).expect("valid");
        let err = empty.histogram(2_usize, false).expect_err("must fail");
        assert!(matches!(err, SignalError::EmptySource { .. }));
    }

    #[test]
    fn recomputation_is_deterministic() {
        let first = source().histogram(4_usize, true).expect("histogram");
        let second = source().histogram(4_usize, true).expect("histogram");
        assert_eq!(first, second);
    }

    #[test]
    fn pack_layout_pairs_edges_with_counts() {
        let mut histogram = source().histogram(3_usize, false).expect("histogram");
        assert!(histogram.configure(&PlotConfig::default_bar()));

        let packed = histogram.pack();
        assert_eq!(&packed.values[4..], &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 0.0]);
        assert_eq!(packed.values[0], 4.0);
        assert_eq!(packed.values[1], 1.0);
        assert_eq!(packed.messages[0], "bar");

        let mut restored = source().histogram(2_usize, false).expect("histogram");
        restored.unpack(&packed).expect("unpack");
        assert_eq!(restored.pattern(), histogram.pattern());
        assert_eq!(restored.hist(), histogram.hist());
        assert_eq!(restored.plot_config(), histogram.plot_config());
        assert_eq!(restored.mean(), histogram.mean());
    }

    #[test]
    fn unpack_rejects_malformed_layouts() {
        let mut histogram = source().histogram(3_usize, false).expect("histogram");

        let err = histogram
            .unpack(&Packed::values_only(vec![1.0, 2.0]))
            .expect_err("must fail");
        assert!(matches!(err, PackError::TooShort { .. }));

        let err = histogram
            .unpack(&Packed::values_only(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]))
            .expect_err("must fail");
        assert!(matches!(err, PackError::OddPairCount { .. }));
    }

    #[test]
    fn plot_config_is_set_once() {
        let mut histogram = source().histogram(3_usize, false).expect("histogram");
        let pie = PlotConfig::Pie {
            title: Some(String::from("Offsets")),
            legend: true,
            labels_fontsize: None,
            legend_fontsize: Some(8.0),
            optimised_view: true,
            labels: vec![String::from("low"), String::from("mid"), String::from("high")],
        };

        assert!(histogram.configure(&pie));
        assert!(!histogram.configure(&PlotConfig::default_bar()));
        assert_eq!(histogram.chart_config(), Some(pie));
    }

    #[test]
    fn descriptors_round_trip_every_chart_kind() {
        let configs = [
            PlotConfig::default_bar(),
            PlotConfig::Distribution {
                title: None,
                draw_lines: true,
                write_text: Some(9.0),
                x_label: Some(String::from("offset [m]")),
                y_label: None,
                legend: Some(String::from("run 7")),
            },
        ];
        for config in configs {
            let descriptor = config.to_descriptor();
            assert_eq!(PlotConfig::from_descriptor(&descriptor), Some(config));
        }
        assert_eq!(PlotConfig::from_descriptor(&[String::from("radar")]), None);
    }

    #[test]
    fn optimised_pie_folds_small_bins() {
        let labels: Vec<String> = ["a", "b", "c", "d", "e"].map(String::from).to_vec();
        let (names, values) = top_bins(&labels, &[5.0, 1.0, 9.0, 3.0, 2.0], 3);
        assert_eq!(names, vec!["c", "a", "d", "Others"]);
        assert_eq!(values, vec![9.0, 5.0, 3.0, 3.0]);
    }

    #[test]
    fn compare_renders_both_histograms() {
        let left = source().histogram(3_usize, false).expect("histogram");
        let right = source().histogram(3_usize, true).expect("histogram");

        let chart = left
            .compare_to(&right, &JsonChartRenderer::default(), &PlotOptions::default())
            .expect("render");
        let request: ChartRequest = serde_json::from_slice(&chart.bytes).expect("parse");
        assert_eq!(request.series.len(), 2);
        assert_eq!(request.kind, ChartKind::GroupedBar);
    }
}

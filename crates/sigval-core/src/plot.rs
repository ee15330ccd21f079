//! Chart rendering seam.
//!
//! Containers never draw. They describe a chart as a [`ChartRequest`] (points,
//! axis labels, chart-kind parameters) and hand it to a [`ChartRenderer`].
//!
//! | Renderer | Output |
//! |----------|--------|
//! | [`JsonChartRenderer`] | the request itself as JSON, for external plotting tools |
//! | [`SvgChartRenderer`] | a standalone SVG document drawn with `plotters` |

use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::FontTransform;
use serde::{Deserialize, Serialize};

use crate::PlotError;

const PALETTE: [RGBColor; 8] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
];

/// Image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Caller-side chart options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotOptions {
    pub size: ChartSize,
    pub legend: bool,
    pub scatter: bool,
    pub title: Option<String>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            size: ChartSize::default(),
            legend: true,
            scatter: false,
            title: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarOrientation {
    Vertical,
    Horizontal,
}

impl BarOrientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "vertical" => Some(Self::Vertical),
            "horizontal" => Some(Self::Horizontal),
            _ => None,
        }
    }
}

/// Quartile summary drawn by box charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// Quartiles use linear interpolation; whiskers reach the most extreme
    /// values within `whisker_ratio` inter-quartile ranges. NaN is ignored.
    pub fn from_values(values: &[f64], whisker_ratio: f64) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let reach = whisker_ratio * (q3 - q1);
        let (low_fence, high_fence) = (q1 - reach, q3 + reach);

        let whisker_low = sorted.iter().copied().find(|v| *v >= low_fence).unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= high_fence)
            .unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < low_fence || *v > high_fence)
            .collect();

        Some(Self {
            median,
            q1,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Chart flavor with its kind-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Scatter,
    Bar {
        orientation: BarOrientation,
        relative_bar_size: f64,
        label_rotation: Option<f64>,
        label_size: Option<f64>,
    },
    GroupedBar,
    Pie {
        legend: bool,
        labels_fontsize: Option<f64>,
        legend_fontsize: Option<f64>,
    },
    Distribution {
        mean: f64,
        sigma: f64,
        draw_lines: bool,
        write_text: Option<f64>,
    },
    Box(BoxStats),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

impl ChartSeries {
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }

    /// Points indexed by position.
    pub fn from_values(label: impl Into<String>, values: &[f64]) -> Self {
        Self::new(
            label,
            values
                .iter()
                .enumerate()
                .map(|(index, value)| (index as f64, *value))
                .collect(),
        )
    }
}

/// Everything a renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub name: String,
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_extent: Option<Extent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_extent: Option<Extent>,
    pub legend: bool,
    pub size: ChartSize,
}

impl ChartRequest {
    pub fn new(name: impl Into<String>, kind: ChartKind, options: &PlotOptions) -> Self {
        let name = name.into();
        Self {
            title: options.title.clone().unwrap_or_else(|| name.clone()),
            name,
            kind,
            x_label: String::new(),
            y_label: String::new(),
            categories: Vec::new(),
            series: Vec::new(),
            x_extent: None,
            y_extent: None,
            legend: options.legend,
            size: options.size,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn with_series(mut self, series: Vec<ChartSeries>) -> Self {
        self.series = series;
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_extents(mut self, x_extent: Option<Extent>, y_extent: Option<Extent>) -> Self {
        self.x_extent = x_extent;
        self.y_extent = y_extent;
        self
    }

    fn point_count(&self) -> usize {
        self.series.iter().map(|series| series.points.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartFormat {
    Svg,
    Json,
}

impl ChartFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Json => "json",
        }
    }
}

/// Rendered chart artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub name: String,
    pub format: ChartFormat,
    pub bytes: Vec<u8>,
}

pub trait ChartRenderer {
    fn render(&self, request: &ChartRequest) -> Result<RenderedChart, PlotError>;
}

/// Emits the chart request as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonChartRenderer {
    pub pretty: bool,
}

impl ChartRenderer for JsonChartRenderer {
    fn render(&self, request: &ChartRequest) -> Result<RenderedChart, PlotError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(request)?
        } else {
            serde_json::to_vec(request)?
        };

        Ok(RenderedChart {
            name: request.name.clone(),
            format: ChartFormat::Json,
            bytes,
        })
    }
}

/// Draws charts as standalone SVG documents through `plotters`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgChartRenderer;

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, request: &ChartRequest) -> Result<RenderedChart, PlotError> {
        let has_data = match &request.kind {
            ChartKind::Box(_) => true,
            _ => request.point_count() > 0,
        };
        if !has_data {
            return Err(PlotError::EmptyChart(request.name.clone()));
        }

        let mut buffer = String::new();
        {
            let root = SVGBackend::with_string(
                &mut buffer,
                (request.size.width, request.size.height),
            )
            .into_drawing_area();
            root.fill(&WHITE).map_err(backend_error)?;

            match &request.kind {
                ChartKind::Line => draw_xy(&root, request, false)?,
                ChartKind::Scatter => draw_xy(&root, request, true)?,
                ChartKind::Bar {
                    orientation,
                    relative_bar_size,
                    label_rotation,
                    label_size,
                } => draw_bars(
                    &root,
                    request,
                    *orientation,
                    *relative_bar_size,
                    label_rotation.unwrap_or(0.0),
                    label_size.unwrap_or(12.0),
                )?,
                ChartKind::GroupedBar => {
                    draw_bars(&root, request, BarOrientation::Vertical, 0.8, 0.0, 12.0)?
                }
                ChartKind::Pie {
                    legend,
                    labels_fontsize,
                    legend_fontsize,
                } => draw_pie(
                    &root,
                    request,
                    *legend,
                    labels_fontsize.unwrap_or(12.0),
                    legend_fontsize.unwrap_or(12.0),
                )?,
                ChartKind::Distribution {
                    mean,
                    sigma,
                    draw_lines,
                    write_text,
                } => draw_distribution(&root, request, *mean, *sigma, *draw_lines, *write_text)?,
                ChartKind::Box(stats) => draw_box(&root, request, stats)?,
            }

            root.present().map_err(backend_error)?;
        }

        Ok(RenderedChart {
            name: request.name.clone(),
            format: ChartFormat::Svg,
            bytes: buffer.into_bytes(),
        })
    }
}

type Canvas<'a> = DrawingArea<SVGBackend<'a>, Shift>;

const MARGIN: u32 = 10;
const CAPTION_SIZE: u32 = 20;
const X_LABEL_AREA: u32 = 40;
const Y_LABEL_AREA: u32 = 60;

fn backend_error(err: impl std::fmt::Display) -> PlotError {
    PlotError::Render(err.to_string())
}

fn legend_swatch(color: RGBColor) -> impl Fn((i32, i32)) -> Rectangle<(i32, i32)> {
    move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
}

fn draw_xy(root: &Canvas<'_>, request: &ChartRequest, scatter: bool) -> Result<(), PlotError> {
    let points = || request.series.iter().flat_map(|series| series.points.iter());
    let x = widen(
        request
            .x_extent
            .unwrap_or_else(|| extent(points().map(|(x, _)| *x))),
    );
    let y = widen(
        request
            .y_extent
            .unwrap_or_else(|| extent(points().map(|(_, y)| *y))),
    );

    let mut chart = ChartBuilder::on(root)
        .margin(MARGIN)
        .caption(&request.title, ("sans-serif", CAPTION_SIZE))
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x.min..x.max, y.min..y.max)
        .map_err(backend_error)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(&request.x_label)
        .y_desc(&request.y_label)
        .draw()
        .map_err(backend_error)?;

    for (index, series) in request.series.iter().enumerate() {
        let color = PALETTE[index % PALETTE.len()];
        let visible = series
            .points
            .iter()
            .copied()
            .filter(|(x, y)| !x.is_nan() && !y.is_nan());
        let drawn = if scatter {
            chart
                .draw_series(visible.map(|point| Circle::new(point, 3, color.filled())))
                .map_err(backend_error)?
        } else {
            chart
                .draw_series(LineSeries::new(visible, color.stroke_width(2)))
                .map_err(backend_error)?
        };
        drawn
            .label(series.label.as_str())
            .legend(legend_swatch(color));
    }

    if request.legend {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(backend_error)?;
    }
    Ok(())
}

/// Categories sit on integer slots; rotations snap to the nearest quarter turn.
fn draw_bars(
    root: &Canvas<'_>,
    request: &ChartRequest,
    orientation: BarOrientation,
    relative_bar_size: f64,
    label_rotation: f64,
    label_size: f64,
) -> Result<(), PlotError> {
    let slots = request
        .series
        .iter()
        .map(|series| series.points.len())
        .max()
        .unwrap_or(0)
        .max(1);
    let top = request
        .series
        .iter()
        .flat_map(|series| series.points.iter().map(|(_, y)| *y))
        .fold(0.0_f64, f64::max);
    let values = widen(Extent { min: 0.0, max: top });
    let positions = -0.5..slots as f64 - 0.5;

    let vertical = orientation == BarOrientation::Vertical;
    let (x_range, y_range) = if vertical {
        (positions, values.min..values.max)
    } else {
        (values.min..values.max, positions)
    };

    let mut chart = ChartBuilder::on(root)
        .margin(MARGIN)
        .caption(&request.title, ("sans-serif", CAPTION_SIZE))
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x_range, y_range)
        .map_err(backend_error)?;

    let categories = &request.categories;
    let slot_label = |position: &f64| {
        let slot = position.round();
        if slot < 0.0 || (position - slot).abs() > 1e-6 {
            return String::new();
        }
        categories
            .get(slot as usize)
            .cloned()
            .unwrap_or_else(|| format!("{slot}"))
    };
    let label_style = ("sans-serif", label_size)
        .into_font()
        .transform(quarter_turn(label_rotation));

    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh();
    if vertical {
        mesh.x_labels(slots)
            .x_label_formatter(&slot_label)
            .x_label_style(label_style)
            .x_desc(&request.x_label)
            .y_desc(&request.y_label);
    } else {
        mesh.y_labels(slots)
            .y_label_formatter(&slot_label)
            .y_label_style(label_style)
            .x_desc(&request.y_label)
            .y_desc(&request.x_label);
    }
    mesh.draw().map_err(backend_error)?;

    let groups = request.series.len().max(1) as f64;
    let bar = relative_bar_size.clamp(0.05, 1.0) / groups;
    for (group, series) in request.series.iter().enumerate() {
        let color = PALETTE[group % PALETTE.len()];
        let rectangles = series.points.iter().enumerate().map(move |(slot, (_, value))| {
            let start = slot as f64 - 0.5 + (1.0 - bar * groups) / 2.0 + bar * group as f64;
            let value = value.max(0.0);
            let corners = if vertical {
                [(start, 0.0), (start + bar, value)]
            } else {
                [(0.0, start), (value, start + bar)]
            };
            Rectangle::new(corners, color.filled())
        });
        chart
            .draw_series(rectangles)
            .map_err(backend_error)?
            .label(series.label.as_str())
            .legend(legend_swatch(color));
    }

    if request.legend && request.series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(backend_error)?;
    }
    Ok(())
}

fn quarter_turn(degrees: f64) -> FontTransform {
    match (degrees.rem_euclid(360.0) / 90.0).round() as i32 % 4 {
        1 => FontTransform::Rotate90,
        2 => FontTransform::Rotate180,
        3 => FontTransform::Rotate270,
        _ => FontTransform::None,
    }
}

fn draw_pie(
    root: &Canvas<'_>,
    request: &ChartRequest,
    legend: bool,
    labels_fontsize: f64,
    legend_fontsize: f64,
) -> Result<(), PlotError> {
    let area = root
        .titled(&request.title, ("sans-serif", CAPTION_SIZE))
        .map_err(backend_error)?;

    let sizes: Vec<f64> = request
        .series
        .first()
        .map(|series| series.points.iter().map(|(_, y)| y.max(0.0)).collect())
        .unwrap_or_default();
    if sizes.iter().sum::<f64>() <= 0.0 {
        return Ok(());
    }

    let colors: Vec<RGBColor> = (0..sizes.len())
        .map(|index| PALETTE[index % PALETTE.len()])
        .collect();
    let category = |index: usize| request.categories.get(index).cloned().unwrap_or_default();
    let labels: Vec<String> = (0..sizes.len())
        .map(|index| if legend { String::new() } else { category(index) })
        .collect();

    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(-90.0);
    pie.label_style(("sans-serif", labels_fontsize).into_font().color(&BLACK));
    area.draw(&pie).map_err(backend_error)?;

    if legend {
        let step = legend_fontsize as i32 + 6;
        let left = width as i32 - 160;
        for (index, color) in colors.iter().enumerate() {
            let top = 10 + index as i32 * step;
            area.draw(&Rectangle::new([(left, top), (left + 10, top + 10)], color.filled()))
                .map_err(backend_error)?;
            area.draw(&Text::new(
                category(index),
                (left + 14, top),
                ("sans-serif", legend_fontsize),
            ))
            .map_err(backend_error)?;
        }
    }
    Ok(())
}

fn draw_distribution(
    root: &Canvas<'_>,
    request: &ChartRequest,
    mean: f64,
    sigma: f64,
    draw_lines: bool,
    write_text: Option<f64>,
) -> Result<(), PlotError> {
    let Some(series) = request.series.iter().find(|series| !series.points.is_empty()) else {
        return Ok(());
    };

    let centers = extent(series.points.iter().map(|(x, _)| *x));
    let width = (centers.max - centers.min) / series.points.len() as f64;
    let width = if width > 0.0 { width } else { 1.0 };
    let x = widen(Extent {
        min: centers.min - width / 2.0,
        max: centers.max + width / 2.0,
    });
    let peak = series
        .points
        .iter()
        .map(|(_, y)| *y)
        .fold(0.0_f64, f64::max);
    let y = widen(Extent { min: 0.0, max: peak });

    let mut chart = ChartBuilder::on(root)
        .margin(MARGIN)
        .caption(&request.title, ("sans-serif", CAPTION_SIZE))
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x.min..x.max, y.min..y.max)
        .map_err(backend_error)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(&request.x_label)
        .y_desc(&request.y_label)
        .draw()
        .map_err(backend_error)?;

    let color = PALETTE[0];
    let half = width * 0.45;
    chart
        .draw_series(series.points.iter().map(|(at, count)| {
            Rectangle::new(
                [(at - half, 0.0), (at + half, count.max(0.0))],
                color.mix(0.7).filled(),
            )
        }))
        .map_err(backend_error)?
        .label(series.label.as_str())
        .legend(legend_swatch(color));

    if draw_lines && sigma > 0.0 {
        let curve = (0..=64).map(|step| {
            let at = x.min + (x.max - x.min) * f64::from(step) / 64.0;
            let density = (-0.5 * ((at - mean) / sigma).powi(2)).exp();
            (at, density * peak)
        });
        let fit = PALETTE[3];
        chart
            .draw_series(LineSeries::new(curve, fit.stroke_width(2)))
            .map_err(backend_error)?
            .label("normal")
            .legend(legend_swatch(fit));
    }

    if let Some(font_size) = write_text {
        chart
            .draw_series(std::iter::once(Text::new(
                format!("mean={mean:.3} sigma={sigma:.3}"),
                (x.min, y.max),
                ("sans-serif", font_size),
            )))
            .map_err(backend_error)?;
    }

    if request.legend {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(backend_error)?;
    }
    Ok(())
}

fn draw_box(root: &Canvas<'_>, request: &ChartRequest, stats: &BoxStats) -> Result<(), PlotError> {
    let low = stats
        .outliers
        .iter()
        .copied()
        .fold(stats.whisker_low, f64::min);
    let high = stats
        .outliers
        .iter()
        .copied()
        .fold(stats.whisker_high, f64::max);
    let y = widen(request.y_extent.unwrap_or(Extent { min: low, max: high }));

    let mut chart = ChartBuilder::on(root)
        .margin(MARGIN)
        .caption(&request.title, ("sans-serif", CAPTION_SIZE))
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(0.0..1.0, y.min..y.max)
        .map_err(backend_error)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .x_desc(&request.x_label)
        .y_desc(&request.y_label)
        .draw()
        .map_err(backend_error)?;

    let body = [(0.25, stats.q3), (0.75, stats.q1)];
    chart
        .draw_series([
            Rectangle::new(body, PALETTE[0].mix(0.4).filled()),
            Rectangle::new(body, BLACK.stroke_width(1)),
        ])
        .map_err(backend_error)?;

    let segments = vec![
        vec![(0.5, stats.q3), (0.5, stats.whisker_high)],
        vec![(0.5, stats.q1), (0.5, stats.whisker_low)],
        vec![(0.4, stats.whisker_high), (0.6, stats.whisker_high)],
        vec![(0.4, stats.whisker_low), (0.6, stats.whisker_low)],
    ];
    chart
        .draw_series(
            segments
                .into_iter()
                .map(|segment| PathElement::new(segment, BLACK.stroke_width(1))),
        )
        .map_err(backend_error)?;
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(0.25, stats.median), (0.75, stats.median)],
            PALETTE[3].stroke_width(2),
        )))
        .map_err(backend_error)?;
    chart
        .draw_series(
            stats
                .outliers
                .iter()
                .map(|outlier| Cross::new((0.5, *outlier), 4, BLACK.stroke_width(1))),
        )
        .map_err(backend_error)?;
    Ok(())
}

fn extent(values: impl Iterator<Item = f64>) -> Extent {
    values
        .filter(|value| value.is_finite())
        .fold(None, |acc: Option<Extent>, value| {
            Some(match acc {
                Some(extent) => Extent {
                    min: extent.min.min(value),
                    max: extent.max.max(value),
                },
                None => Extent {
                    min: value,
                    max: value,
                },
            })
        })
        .unwrap_or(Extent { min: 0.0, max: 1.0 })
}

/// Guarantees a non-degenerate, finite extent.
fn widen(extent: Extent) -> Extent {
    let (min, max) = if extent.min.is_finite() && extent.max.is_finite() {
        (extent.min, extent.max)
    } else {
        (0.0, 1.0)
    };
    if max > min {
        Extent { min, max }
    } else {
        let pad = (min.abs() * 0.05).max(0.5);
        Extent {
            min: min - pad,
            max: max + pad,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_request() -> ChartRequest {
        ChartRequest::new("speed", ChartKind::Line, &PlotOptions::default())
            .with_labels("time [s]", "[m/s]")
            .with_series(vec![ChartSeries::new(
                "speed",
                vec![(0.0, 1.0), (1.0, 2.0), (2.0, 1.5)],
            )])
    }

    fn svg_text(request: &ChartRequest) -> String {
        let chart = SvgChartRenderer.render(request).expect("render");
        assert_eq!(chart.format, ChartFormat::Svg);
        String::from_utf8(chart.bytes).expect("utf8")
    }

    #[test]
    fn svg_renderer_draws_line_series() {
        let text = svg_text(&line_request());

        assert!(text.contains("<svg"));
        assert!(text.trim_end().ends_with("</svg>"));
        assert!(text.contains("<polyline"));
        assert!(text.contains("time [s]"));
    }

    #[test]
    fn svg_renderer_rejects_empty_charts() {
        let request = ChartRequest::new("empty", ChartKind::Line, &PlotOptions::default());
        let err = SvgChartRenderer.render(&request).expect_err("must fail");
        assert!(matches!(err, PlotError::EmptyChart(_)));
    }

    #[test]
    fn svg_renderer_draws_every_chart_kind() {
        let options = PlotOptions::default();
        let counts = vec![ChartSeries::from_values("count", &[3.0, 5.0, 2.0])];
        let categories = vec!["low".to_owned(), "mid".to_owned(), "high".to_owned()];
        let kinds = [
            ChartKind::Scatter,
            ChartKind::Bar {
                orientation: BarOrientation::Horizontal,
                relative_bar_size: 0.8,
                label_rotation: Some(90.0),
                label_size: Some(9.0),
            },
            ChartKind::GroupedBar,
            ChartKind::Pie {
                legend: true,
                labels_fontsize: None,
                legend_fontsize: Some(10.0),
            },
            ChartKind::Distribution {
                mean: 1.0,
                sigma: 0.5,
                draw_lines: true,
                write_text: Some(10.0),
            },
            ChartKind::Box(BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 100.0], 1.5).expect("stats")),
        ];

        for kind in kinds {
            let request = ChartRequest::new("counts", kind, &options)
                .with_series(counts.clone())
                .with_categories(categories.clone());
            let text = svg_text(&request);
            assert!(text.contains("<svg"), "{:?}", request.kind);
            assert!(text.contains("counts"), "{:?}", request.kind);
        }
    }

    #[test]
    fn pie_legend_lists_categories() {
        let request = ChartRequest::new(
            "share",
            ChartKind::Pie {
                legend: true,
                labels_fontsize: None,
                legend_fontsize: None,
            },
            &PlotOptions::default(),
        )
        .with_series(vec![ChartSeries::from_values("share", &[1.0, 3.0])])
        .with_categories(vec!["idle".to_owned(), "moving".to_owned()]);

        let text = svg_text(&request);
        assert!(text.contains("idle"));
        assert!(text.contains("moving"));
    }

    #[test]
    fn json_renderer_round_trips_request() {
        let request = line_request();
        let chart = JsonChartRenderer::default().render(&request).expect("render");
        let parsed: ChartRequest = serde_json::from_slice(&chart.bytes).expect("parse");
        assert_eq!(parsed, request);
    }

    #[test]
    fn box_stats_use_interpolated_quartiles() {
        let stats = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 100.0], 1.5).expect("stats");
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.q3, 4.0);
        assert_eq!(stats.whisker_high, 4.0);
        assert_eq!(stats.outliers, vec![100.0]);
        assert!(BoxStats::from_values(&[f64::NAN], 1.5).is_none());
    }

    #[test]
    fn escapes_markup_in_labels() {
        let text = svg_text(&line_request().with_title("a < b & c"));
        assert!(!text.contains("a < b"));
        assert!(text.contains("&lt;"));
    }

    #[test]
    fn quarter_turn_snaps_label_rotation() {
        assert!(matches!(quarter_turn(0.0), FontTransform::None));
        assert!(matches!(quarter_turn(80.0), FontTransform::Rotate90));
        assert!(matches!(quarter_turn(-90.0), FontTransform::Rotate270));
        assert!(matches!(quarter_turn(359.0), FontTransform::None));
    }
}

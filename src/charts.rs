//! Chart data derived from a simulation result and its SVG rendering.
//!
//! The data types feed both the plotted images and the plain-text digest
//! handed to the chart-analysis prompt.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::debug;

use crate::error::{Error, Result};
use crate::state::SimulationResult;

pub const HISTOGRAM_BINS: usize = 30;
pub const THROUGHPUT_SEGMENTS: usize = 20;

#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn from_samples(samples: &[f64], bins: usize) -> Option<Self> {
        if samples.is_empty() || bins == 0 {
            return None;
        }
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = (max - min) / bins as f64;
        let mut counts = vec![0usize; bins];
        for sample in samples {
            let idx = if width > 0.0 {
                (((sample - min) / width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[idx] += 1;
        }
        Some(Self { min, max, counts })
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.counts.len() as f64
    }
}

/// Five-number summary with 1.5 IQR whiskers.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: usize,
}

impl BoxStats {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let fence = 1.5 * (q3 - q1);
        let low_fence = q1 - fence;
        let high_fence = q3 + fence;

        let inside: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|value| *value >= low_fence && *value <= high_fence)
            .collect();
        let lower_whisker = inside.first().copied().unwrap_or(q1);
        let upper_whisker = inside.last().copied().unwrap_or(q3);

        Some(Self {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            outliers: sorted.len() - inside.len(),
        })
    }
}

/// Linear-interpolation quantile over already sorted data.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Averages the defined rolling values into at most `segments` equal chunks.
pub fn throughput_profile(series: &[Option<f64>], segments: usize) -> Vec<f64> {
    let values: Vec<f64> = series.iter().flatten().copied().collect();
    if values.is_empty() || segments == 0 {
        return Vec::new();
    }
    let chunk = values.len().div_ceil(segments);
    values
        .chunks(chunk)
        .map(|part| part.iter().sum::<f64>() / part.len() as f64)
        .collect()
}


const CHART_SIZE: (u32, u32) = (960, 540);
const CAPTION_FONT: (&str, u32) = ("sans-serif", 26);

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// The five report charts, in the order they appear in the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Histogram,
    BoxPlot,
    Outcomes,
    Throughput,
    Sla,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Histogram,
        ChartKind::BoxPlot,
        ChartKind::Outcomes,
        ChartKind::Throughput,
        ChartKind::Sla,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Histogram => "Authentication Time Distribution",
            ChartKind::BoxPlot => "Authentication Time Box Plot",
            ChartKind::Outcomes => "Login Success vs Failure",
            ChartKind::Throughput => "Throughput Over the Simulation",
            ChartKind::Sla => "SLA Violations",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            ChartKind::Histogram => "histogram",
            ChartKind::BoxPlot => "boxplot",
            ChartKind::Outcomes => "outcomes",
            ChartKind::Throughput => "throughput",
            ChartKind::Sla => "sla",
        }
    }

    /// File name of the image, prefixed with the report's stem.
    pub fn file_name(self, stem: &str) -> String {
        format!("{}-{}.svg", stem, self.slug())
    }
}

#[derive(Clone, Debug)]
pub struct ChartSet {
    pub expected_mean: f64,
    pub sla_threshold: f64,
    pub durations: Vec<f64>,
    pub histogram: Option<Histogram>,
    pub box_stats: Option<BoxStats>,
    pub successes: usize,
    pub failures: usize,
    /// `(event index, requests/s)` for every defined rolling value.
    pub throughput_points: Vec<(f64, f64)>,
    pub throughput_profile: Vec<f64>,
    pub within_sla: usize,
    pub sla_violations: usize,
}

impl ChartSet {
    pub fn build(result: &SimulationResult, expected_mean: f64) -> Self {
        let durations = result.events.auth_durations();
        let summary = &result.summary;
        let throughput_points = result
            .rolling_throughput
            .iter()
            .enumerate()
            .filter_map(|(idx, value)| value.map(|value| (idx as f64, value)))
            .collect();
        Self {
            expected_mean,
            sla_threshold: result.metadata.sla_threshold,
            histogram: Histogram::from_samples(&durations, HISTOGRAM_BINS),
            box_stats: BoxStats::from_samples(&durations),
            durations,
            successes: summary.num_successes,
            failures: summary.num_failures,
            throughput_points,
            throughput_profile: throughput_profile(&result.rolling_throughput, THROUGHPUT_SEGMENTS),
            within_sla: summary.total_requests - summary.sla_violations,
            sla_violations: summary.sla_violations,
        }
    }

    /// Writes every chart as `<stem>-<chart>.svg` under `dir` and returns the paths.
    pub fn render_all(&self, dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
        if self.durations.is_empty() {
            return Err(Error::DegenerateAggregation("event log is empty; nothing to chart"));
        }
        ChartKind::ALL
            .iter()
            .map(|kind| {
                let path = dir.join(kind.file_name(stem));
                self.render(*kind, &path)?;
                Ok(path)
            })
            .collect()
    }

    pub fn render(&self, kind: ChartKind, path: &Path) -> Result<()> {
        let drawn = match kind {
            ChartKind::Histogram => self.draw_histogram(path),
            ChartKind::BoxPlot => self.draw_box(path),
            ChartKind::Outcomes => draw_counts(
                path,
                kind.title(),
                ["Success", "Failure"],
                [self.successes, self.failures],
                [GREEN, RED],
            ),
            ChartKind::Throughput => self.draw_throughput(path),
            ChartKind::Sla => draw_counts(
                path,
                kind.title(),
                ["Within SLA", "SLA violation"],
                [self.within_sla, self.sla_violations],
                [BLUE, RED],
            ),
        };
        drawn.map_err(|err| {
            Error::Io(format!(
                "failed to render chart '{}': {}",
                path.display(),
                err
            ))
        })?;
        debug!(chart = kind.title(), path = %path.display(), "chart rendered");
        Ok(())
    }

    fn draw_histogram(&self, path: &Path) -> DrawResult {
        let histogram = self.histogram.as_ref().ok_or("no samples to plot")?;
        let width = histogram.bin_width();
        let bar_width = if width > 0.0 { width } else { 0.05 };
        let peak = histogram.counts.iter().copied().max().unwrap_or(0) as f64;
        let y_top = (peak * 1.1).max(1.0);
        let x_top = (histogram.max + bar_width)
            .max(self.sla_threshold)
            .max(self.expected_mean)
            * 1.05;

        let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(ChartKind::Histogram.title(), CAPTION_FONT)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..x_top, 0f64..y_top)?;
        chart
            .configure_mesh()
            .x_desc("Authentication time (s)")
            .y_desc("Requests")
            .draw()?;

        chart.draw_series(histogram.counts.iter().enumerate().map(|(idx, count)| {
            let start = histogram.min + width * idx as f64;
            Rectangle::new(
                [(start, 0.0), (start + bar_width, *count as f64)],
                BLUE.mix(0.5).filled(),
            )
        }))?;
        chart
            .draw_series(LineSeries::new(
                [(self.expected_mean, 0.0), (self.expected_mean, y_top)],
                RED.stroke_width(2),
            ))?
            .label(format!("Expected mean ({:.2}s)", self.expected_mean))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
        chart
            .draw_series(LineSeries::new(
                [(self.sla_threshold, 0.0), (self.sla_threshold, y_top)],
                MAGENTA.stroke_width(2),
            ))?
            .label(format!("SLA maximum ({:.2}s)", self.sla_threshold))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], MAGENTA));
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_box(&self, path: &Path) -> DrawResult {
        if self.durations.is_empty() {
            return Err("no samples to plot".into());
        }
        let quartiles = Quartiles::new(&self.durations);
        let longest = self.durations.iter().copied().fold(0.0, f64::max);
        let x_top = (longest.max(self.sla_threshold) * 1.05).max(1.0) as f32;
        let sla = self.sla_threshold as f32;

        let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(ChartKind::BoxPlot.title(), CAPTION_FONT)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0f32..x_top, (0u32..1u32).into_segmented())?;
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(1)
            .y_label_formatter(&|_| "Auth time".to_string())
            .x_desc("Authentication time (s)")
            .draw()?;

        chart.draw_series([Boxplot::new_horizontal(SegmentValue::CenterOf(0u32), &quartiles)
            .width(80)
            .style(BLUE)])?;
        chart
            .draw_series(LineSeries::new(
                [(sla, SegmentValue::Exact(0u32)), (sla, SegmentValue::Last)],
                MAGENTA.stroke_width(2),
            ))?
            .label(format!("SLA maximum ({:.2}s)", self.sla_threshold))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], MAGENTA));
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_throughput(&self, path: &Path) -> DrawResult {
        let x_top = self
            .throughput_points
            .last()
            .map(|(idx, _)| idx + 1.0)
            .unwrap_or(1.0);
        let peak = self
            .throughput_points
            .iter()
            .map(|(_, value)| *value)
            .fold(0.0, f64::max);
        let y_top = (peak * 1.1).max(1.0);

        let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(ChartKind::Throughput.title(), CAPTION_FONT)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..x_top, 0f64..y_top)?;
        chart
            .configure_mesh()
            .x_desc("Request index")
            .y_desc("Requests per second")
            .draw()?;

        chart.draw_series(LineSeries::new(self.throughput_points.iter().copied(), &BLUE))?;

        root.present()?;
        Ok(())
    }

    /// Plain-text digest handed to the chart-analysis prompt.
    pub fn digest(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Authentication time histogram:");
        match &self.histogram {
            Some(histogram) => {
                let _ = writeln!(
                    out,
                    "{} bins from {:.4}s to {:.4}s; counts: {}",
                    histogram.counts.len(),
                    histogram.min,
                    histogram.max,
                    join(histogram.counts.iter().map(|count| count.to_string()))
                );
            }
            None => {
                let _ = writeln!(out, "no events");
            }
        }
        let _ = writeln!(
            out,
            "expected mean: {:.2}s; SLA maximum: {:.2}s",
            self.expected_mean, self.sla_threshold
        );

        let _ = writeln!(out, "Authentication time box plot:");
        match &self.box_stats {
            Some(stats) => {
                let _ = writeln!(
                    out,
                    "lower whisker {:.4}, q1 {:.4}, median {:.4}, q3 {:.4}, upper whisker {:.4}, outliers {}",
                    stats.lower_whisker,
                    stats.q1,
                    stats.median,
                    stats.q3,
                    stats.upper_whisker,
                    stats.outliers
                );
            }
            None => {
                let _ = writeln!(out, "no events");
            }
        }

        let _ = writeln!(out, "Login outcomes:");
        let _ = writeln!(out, "success {}, failure {}", self.successes, self.failures);

        let _ = writeln!(out, "Rolling throughput profile:");
        if self.throughput_profile.is_empty() {
            let _ = writeln!(out, "not enough events for a full window");
        } else {
            let _ = writeln!(
                out,
                "segment means (requests/s): {}",
                join(self.throughput_profile.iter().map(|value| format!("{:.4}", value)))
            );
        }

        let _ = writeln!(out, "SLA compliance:");
        let _ = writeln!(
            out,
            "within SLA {}, violations {}",
            self.within_sla, self.sla_violations
        );
        out
    }
}

fn draw_counts(
    path: &Path,
    title: &str,
    labels: [&str; 2],
    counts: [usize; 2],
    colors: [RGBColor; 2],
) -> DrawResult {
    let heights = counts.map(|count| u32::try_from(count).unwrap_or(u32::MAX));
    let peak = heights.iter().copied().max().unwrap_or(0);
    let y_top = peak.saturating_add(peak / 10).max(1);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0u32..2u32).into_segmented(), 0u32..y_top)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(2)
        .x_label_formatter(&|value| match value {
            SegmentValue::CenterOf(idx) | SegmentValue::Exact(idx) => labels
                .get(*idx as usize)
                .map(|label| label.to_string())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .y_desc("Requests")
        .draw()?;

    chart.draw_series(
        plotters::series::Histogram::vertical(&chart)
            .margin(60)
            .style_func(|idx, _| {
                let idx = match idx {
                    SegmentValue::CenterOf(idx) | SegmentValue::Exact(idx) => *idx as usize,
                    SegmentValue::Last => usize::MAX,
                };
                colors[idx.min(1)].filled()
            })
            .data([(0u32, heights[0]), (1u32, heights[1])]),
    )?;

    root.present()?;
    Ok(())
}

fn join(values: impl Iterator<Item = String>) -> String {
    values.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run_simulation;
    use crate::models::SimConfig;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be available")
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("login-sim-charts-{}-{}", nanos, name));
        fs::create_dir_all(&path).expect("temp dir should be created");
        path
    }

    #[test]
    fn histogram_counts_every_sample() {
        let samples = [0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0];
        let histogram = Histogram::from_samples(&samples, 3).unwrap();

        assert_eq!(histogram.counts.iter().sum::<usize>(), samples.len());
        assert_eq!(histogram.counts, vec![2, 2, 3]);
    }

    #[test]
    fn histogram_handles_constant_samples() {
        let histogram = Histogram::from_samples(&[2.0, 2.0, 2.0], 30).unwrap();
        assert_eq!(histogram.counts[0], 3);
        assert!(Histogram::from_samples(&[], 30).is_none());
    }

    #[test]
    fn quantiles_interpolate_between_ranks() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.5), 2.5);
        assert_eq!(quantile(&sorted, 0.25), 1.75);
        assert_eq!(quantile(&sorted, 1.0), 4.0);
    }

    #[test]
    fn box_stats_flag_outliers() {
        let samples = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let stats = BoxStats::from_samples(&samples).unwrap();

        assert_eq!(stats.median, 3.5);
        assert_eq!(stats.outliers, 1);
        assert_eq!(stats.upper_whisker, 5.0);
        assert_eq!(stats.lower_whisker, 1.0);
    }

    #[test]
    fn throughput_profile_averages_segments() {
        let series = [None, Some(1.0), Some(3.0), Some(5.0), Some(7.0)];
        assert_eq!(throughput_profile(&series, 2), vec![2.0, 6.0]);
        assert!(throughput_profile(&[None, None], 20).is_empty());
    }

    #[test]
    fn chart_files_are_named_after_the_report() {
        assert_eq!(ChartKind::Histogram.file_name("report"), "report-histogram.svg");
        assert_eq!(ChartKind::Sla.file_name("out"), "out-sla.svg");
        assert_eq!(ChartKind::ALL.len(), 5);
    }

    #[test]
    fn render_all_writes_five_svg_files() {
        let config = SimConfig {
            runs: 20,
            ..SimConfig::default()
        };
        let result = run_simulation(&config).expect("simulation should succeed");
        let charts = ChartSet::build(&result, config.mean_auth_time);
        let dir = temp_dir("all");

        let paths = charts.render_all(&dir, "report").expect("charts should render");

        assert_eq!(paths.len(), 5);
        for (path, kind) in paths.iter().zip(ChartKind::ALL) {
            assert_eq!(path, &dir.join(kind.file_name("report")));
            let svg = fs::read_to_string(path).expect("chart file should exist");
            assert!(svg.contains("<svg"), "{} is not an svg", path.display());
            assert!(svg.contains(kind.title()), "{} lacks its caption", path.display());
        }
    }

    #[test]
    fn throughput_chart_renders_without_full_window() {
        let config = SimConfig {
            runs: 1,
            arrival_rate: 60.0,
            throughput_window: 10_000,
            ..SimConfig::default()
        };
        let result = run_simulation(&config).expect("simulation should succeed");
        let charts = ChartSet::build(&result, config.mean_auth_time);
        assert!(charts.throughput_points.is_empty());

        let path = temp_dir("flat").join("throughput.svg");
        charts
            .render(ChartKind::Throughput, &path)
            .expect("empty throughput chart should render");
        assert!(fs::metadata(&path).expect("file should exist").len() > 0);
    }

    #[test]
    fn empty_log_is_not_charted() {
        let config = SimConfig {
            runs: 1,
            arrival_rate: 0.0001,
            ..SimConfig::default()
        };
        let result = run_simulation(&config).expect("simulation should succeed");
        let charts = ChartSet::build(&result, config.mean_auth_time);

        let err = charts.render_all(&temp_dir("empty"), "report").unwrap_err();
        assert!(matches!(err, Error::DegenerateAggregation(_)));
    }

    #[test]
    fn digest_lists_chart_values_as_text() {
        let config = SimConfig {
            runs: 10,
            ..SimConfig::default()
        };
        let result = run_simulation(&config).expect("simulation should succeed");
        let charts = ChartSet::build(&result, config.mean_auth_time);
        let digest = charts.digest();

        assert!(digest.contains("30 bins from"));
        assert!(digest.contains(&format!(
            "success {}, failure {}",
            result.summary.num_successes, result.summary.num_failures
        )));
        assert!(digest.contains(&format!(
            "violations {}",
            result.summary.sla_violations
        )));
        assert!(!digest.contains('#'));
    }
}

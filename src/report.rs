use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::charts::{ChartKind, ChartSet};
use crate::error::{Error, Result};
use crate::models::SimConfig;
use crate::narrative::{chart_analysis_prompt, format_value, report_prompt, NarrativeGenerator};
use crate::state::SimulationResult;

pub const OMITTED_NOTICE: &str = "_Narrative omitted: generation was skipped for this report._";
const PAGE_BREAK: &str = "\n---\n\n";
const DEFAULT_STEM: &str = "login-sim-report";

/// A composed report: the Markdown text plus the charts it links to.
#[derive(Clone, Debug)]
pub struct Report {
    pub markdown: String,
    pub charts: ChartSet,
    pub chart_stem: String,
}

/// Builds the Markdown report. Without a narrator the prose sections carry
/// [`OMITTED_NOTICE`] instead of text.
pub struct ReportComposer<'a> {
    narrator: Option<&'a dyn NarrativeGenerator>,
}

impl<'a> ReportComposer<'a> {
    pub fn new(narrator: &'a dyn NarrativeGenerator) -> Self {
        Self {
            narrator: Some(narrator),
        }
    }

    pub fn without_narrative() -> Self {
        Self { narrator: None }
    }

    /// Chart images are linked as `<chart_stem>-<chart>.svg`, relative to the report.
    pub fn compose(
        &self,
        result: &SimulationResult,
        config: &SimConfig,
        chart_stem: &str,
    ) -> Result<Report> {
        if result.events.is_empty() {
            return Err(Error::DegenerateAggregation(
                "event log is empty; nothing to report",
            ));
        }

        let charts = ChartSet::build(result, config.mean_auth_time);
        let (analysis, chart_analysis) = match self.narrator {
            Some(narrator) => {
                let settings = &config.narrative;
                let analysis = narrator.generate(&report_prompt(&result.summary, settings))?;
                let chart_analysis = narrator.generate(&chart_analysis_prompt(
                    &result.summary,
                    &charts.digest(),
                    settings,
                ))?;
                (Some(analysis), Some(chart_analysis))
            }
            None => (None, None),
        };

        let mut doc = String::new();
        doc.push_str("# Login System Simulation Report\n\n");

        doc.push_str("## Simulation Parameters\n\n");
        doc.push_str("| Parameter | Value |\n|---|---|\n");
        let _ = writeln!(doc, "| Runs | {} |", config.runs);
        let _ = writeln!(doc, "| Seed | {} |", config.seed);
        let _ = writeln!(doc, "| Arrival rate (users/min) | {} |", config.arrival_rate);
        let _ = writeln!(doc, "| Mean authentication time (s) | {} |", config.mean_auth_time);
        let _ = writeln!(doc, "| Success probability | {} |", config.success_probability);
        let _ = writeln!(doc, "| SLA threshold (s) | {} |", config.sla_threshold);
        let _ = writeln!(doc, "| Throughput window | {} |", config.throughput_window);
        doc.push('\n');

        doc.push_str("## Summary Metrics\n\n");
        doc.push_str("| Metric | Value |\n|---|---|\n");
        for entry in result.summary.entries() {
            let _ = writeln!(doc, "| {} | {} |", entry.name, format_value(entry.value));
        }
        doc.push('\n');

        doc.push_str("## Analysis\n\n");
        push_narrative(&mut doc, analysis.as_deref());

        doc.push_str(PAGE_BREAK);
        doc.push_str("## Visual Analysis of the Results\n\n");
        for kind in ChartKind::ALL {
            let _ = write!(
                doc,
                "### {title}\n\n![{title}]({file})\n\n",
                title = kind.title(),
                file = kind.file_name(chart_stem)
            );
        }

        doc.push_str(PAGE_BREAK);
        doc.push_str("## Chart Interpretation\n\n");
        push_narrative(&mut doc, chart_analysis.as_deref());

        Ok(Report {
            markdown: doc,
            charts,
            chart_stem: chart_stem.to_string(),
        })
    }
}

fn push_narrative(doc: &mut String, text: Option<&str>) {
    match text {
        Some(text) => {
            for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
                doc.push_str(line);
                doc.push_str("\n\n");
            }
        }
        None => {
            doc.push_str(OMITTED_NOTICE);
            doc.push_str("\n\n");
        }
    }
}

/// Stem used for chart file names: the report's file stem, or a fixed fallback.
pub fn chart_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or(DEFAULT_STEM)
        .to_string()
}

/// Renders the charts into the report's directory, then writes the Markdown.
pub fn write_report(path: &Path, report: &Report) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let charts = report.charts.render_all(dir, &report.chart_stem)?;
    fs::write(path, &report.markdown).map_err(|err| {
        Error::Io(format!(
            "failed to write report '{}': {}",
            path.display(),
            err
        ))
    })?;
    info!(
        path = %path.display(),
        bytes = report.markdown.len(),
        charts = charts.len(),
        "report written"
    );
    Ok(())
}

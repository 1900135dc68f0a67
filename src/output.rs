use std::fmt::Write;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::events::EventLog;
use crate::metrics::{RollingSummary, SummaryMetrics};
use crate::narrative::format_value;
use crate::state::{RunMetadata, SimulationResult};

pub trait Formatter {
    fn write(&self, result: &SimulationResult) -> String;
}

pub struct HumanFormatter;
pub struct SummaryFormatter;
pub struct JsonFormatter;

impl Formatter for SummaryFormatter {
    fn write(&self, result: &SimulationResult) -> String {
        let mut out = String::new();
        write_metadata(&mut out, &result.metadata);
        write_summary(&mut out, &result.summary);
        out
    }
}

impl Formatter for HumanFormatter {
    fn write(&self, result: &SimulationResult) -> String {
        let mut out = String::new();
        write_metadata(&mut out, &result.metadata);
        write_summary(&mut out, &result.summary);

        let rolling = result.rolling_summary();
        let _ = writeln!(out, "Rolling throughput (window {}):", rolling.window);
        let _ = writeln!(out, "defined points: {}", rolling.defined_points);
        let _ = writeln!(out, "min: {}", format_value(rolling.min));
        let _ = writeln!(out, "mean: {}", format_value(rolling.mean));
        let _ = writeln!(out, "max: {}", format_value(rolling.max));
        out
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: &'a RunMetadata,
    summary: &'a SummaryMetrics,
    rolling_throughput: RollingSummary,
}

impl Formatter for JsonFormatter {
    fn write(&self, result: &SimulationResult) -> String {
        let report = JsonReport {
            metadata: &result.metadata,
            summary: &result.summary,
            rolling_throughput: result.rolling_summary(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(mut json) => {
                json.push('\n');
                json
            }
            Err(err) => format!("{{\"error\":\"{}\"}}\n", err),
        }
    }
}

/// One JSON object per event, in generation order.
pub fn write_event_table<W: std::io::Write>(log: &EventLog, writer: &mut W) -> Result<()> {
    for row in log.rows() {
        serde_json::to_writer(&mut *writer, &row)
            .map_err(|err| Error::Io(format!("failed to encode event: {}", err)))?;
        writer
            .write_all(b"\n")
            .map_err(|err| Error::Io(format!("failed to write event table: {}", err)))?;
    }
    writer
        .flush()
        .map_err(|err| Error::Io(format!("failed to write event table: {}", err)))
}

fn write_metadata(out: &mut String, metadata: &RunMetadata) {
    let _ = writeln!(out, "Metadata:");
    let _ = writeln!(out, "seed: {}", metadata.seed);
    let _ = writeln!(
        out,
        "runs: {} ({} empty)",
        metadata.runs, metadata.empty_runs
    );
    let _ = writeln!(out, "sla_threshold: {}", metadata.sla_threshold);
}

fn write_summary(out: &mut String, summary: &SummaryMetrics) {
    let _ = writeln!(out, "Summary:");
    for entry in summary.entries() {
        let _ = writeln!(out, "{}: {}", entry.name, format_value(entry.value));
    }
}

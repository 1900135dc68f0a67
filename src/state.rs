use serde::Serialize;

use crate::events::EventLog;
use crate::metrics::{RollingSummary, SummaryMetrics};

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RunMetadata {
    pub seed: u64,
    pub runs: usize,
    pub produced_runs: usize,
    pub empty_runs: usize,
    pub sla_threshold: f64,
    pub throughput_window: usize,
}

#[derive(Clone, Debug)]
pub struct SimulationResult {
    pub events: EventLog,
    pub summary: SummaryMetrics,
    pub rolling_throughput: Vec<Option<f64>>,
    pub metadata: RunMetadata,
}

impl SimulationResult {
    pub fn rolling_summary(&self) -> RollingSummary {
        RollingSummary::from_series(&self.rolling_throughput, self.metadata.throughput_window)
    }
}

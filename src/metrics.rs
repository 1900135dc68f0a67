use serde::Serialize;

use crate::events::EventLog;

/// Snapshot of a completed event log. Undefined values stay `None` rather than
/// collapsing to zero.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SummaryMetrics {
    pub total_requests: usize,
    pub total_time: Option<f64>,
    pub throughput: f64,
    pub num_successes: usize,
    pub num_failures: usize,
    pub success_rate: Option<f64>,
    pub mean_auth_time_success: Option<f64>,
    pub sla_violations: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricEntry {
    pub name: &'static str,
    pub value: Option<f64>,
}

impl SummaryMetrics {
    /// Stable, ordered name -> value view for renderers and prompts.
    pub fn entries(&self) -> Vec<MetricEntry> {
        vec![
            entry("Total requests", Some(self.total_requests as f64)),
            entry("Total simulated time (s)", self.total_time),
            entry("Throughput (requests/s)", Some(self.throughput)),
            entry("Successful logins", Some(self.num_successes as f64)),
            entry("Failed logins", Some(self.num_failures as f64)),
            entry("Estimated success rate", self.success_rate),
            entry("Mean authentication time (s)", self.mean_auth_time_success),
            entry("SLA violations", Some(self.sla_violations as f64)),
        ]
    }
}

fn entry(name: &'static str, value: Option<f64>) -> MetricEntry {
    MetricEntry { name, value }
}

pub fn aggregate(log: &EventLog, sla_threshold: f64) -> SummaryMetrics {
    let total_requests = log.len();
    let total_time = total_time(log);
    let throughput = match total_time {
        Some(span) if span > 0.0 => total_requests as f64 / span,
        _ => 0.0,
    };

    let num_successes = log.iter().filter(|event| event.success).count();
    let num_failures = total_requests - num_successes;
    let success_rate = if total_requests == 0 {
        None
    } else {
        Some(num_successes as f64 / total_requests as f64)
    };

    SummaryMetrics {
        total_requests,
        total_time,
        throughput,
        num_successes,
        num_failures,
        success_rate,
        mean_auth_time_success: mean_auth_time_success(log),
        sla_violations: sla_violations(log, sla_threshold),
    }
}

/// Span from the earliest arrival to the latest completion.
pub fn total_time(log: &EventLog) -> Option<f64> {
    if log.is_empty() {
        return None;
    }
    let last_completion = log
        .iter()
        .map(|event| event.total_time())
        .fold(f64::NEG_INFINITY, f64::max);
    let first_arrival = log
        .iter()
        .map(|event| event.arrival_time)
        .fold(f64::INFINITY, f64::min);
    Some(last_completion - first_arrival)
}

/// Mean auth duration over successful attempts only.
pub fn mean_auth_time_success(log: &EventLog) -> Option<f64> {
    let (sum, count) = log
        .iter()
        .filter(|event| event.success)
        .fold((0.0, 0usize), |(sum, count), event| {
            (sum + event.auth_duration, count + 1)
        });
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Counts every attempt, successful or not, whose duration is strictly above the threshold.
pub fn sla_violations(log: &EventLog, sla_threshold: f64) -> usize {
    log.iter()
        .filter(|event| event.auth_duration > sla_threshold)
        .count()
}

/// Local throughput over a sliding window of `window` events, by generation order.
///
/// The first `window - 1` positions are `None`, as is any window whose
/// completion times span no time at all: a zero-span window is reported as
/// `None` rather than infinity, matching the guard on the global throughput.
pub fn rolling_throughput(log: &EventLog, window: usize) -> Vec<Option<f64>> {
    let completions: Vec<f64> = log.iter().map(|event| event.total_time()).collect();
    let mut series = vec![None; completions.len()];
    if window == 0 || completions.len() < window {
        return series;
    }

    for end in (window - 1)..completions.len() {
        let slice = &completions[end + 1 - window..=end];
        let max = slice.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = slice.iter().copied().fold(f64::INFINITY, f64::min);
        let span = max - min;
        if span > 0.0 {
            series[end] = Some(window as f64 / span);
        }
    }

    series
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RollingSummary {
    pub window: usize,
    pub defined_points: usize,
    pub min: Option<f64>,
    pub mean: Option<f64>,
    pub max: Option<f64>,
}

impl RollingSummary {
    pub fn from_series(series: &[Option<f64>], window: usize) -> Self {
        let values: Vec<f64> = series.iter().flatten().copied().collect();
        if values.is_empty() {
            return Self {
                window,
                defined_points: 0,
                min: None,
                mean: None,
                max: None,
            };
        }
        Self {
            window,
            defined_points: values.len(),
            min: Some(values.iter().copied().fold(f64::INFINITY, f64::min)),
            mean: Some(values.iter().sum::<f64>() / values.len() as f64),
            max: Some(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LoginEvent;

    fn log_of(events: &[(f64, f64, bool)]) -> EventLog {
        EventLog::from(
            events
                .iter()
                .map(|(arrival, duration, success)| LoginEvent::new(*arrival, *duration, *success))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn empty_log_leaves_rates_undefined() {
        let summary = aggregate(&EventLog::new(), 5.0);
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.total_time, None);
        assert_eq!(summary.throughput, 0.0);
        assert_eq!(summary.success_rate, None);
        assert_eq!(summary.mean_auth_time_success, None);
        assert_eq!(summary.sla_violations, 0);
    }

    #[test]
    fn all_successful_with_one_slow_login() {
        let mut events = vec![(0.0, 1.0, true); 9];
        events.push((0.0, 10.0, true));
        let summary = aggregate(&log_of(&events), 5.0);

        assert_eq!(summary.total_requests, 10);
        assert_eq!(summary.sla_violations, 1);
        let mean = summary.mean_auth_time_success.unwrap();
        assert!((mean - 1.9).abs() < 1e-12);
        assert_eq!(summary.success_rate, Some(1.0));
    }

    #[test]
    fn mean_time_ignores_failures_but_sla_counts_them() {
        let log = log_of(&[(0.0, 1.0, true), (0.0, 3.0, true), (0.0, 9.0, false)]);
        let summary = aggregate(&log, 5.0);

        assert_eq!(summary.mean_auth_time_success, Some(2.0));
        assert_eq!(summary.sla_violations, 1);
    }

    #[test]
    fn zero_successes_has_no_mean_time() {
        let log = log_of(&[(0.5, 1.0, false), (1.0, 2.0, false)]);
        let summary = aggregate(&log, 5.0);

        assert_eq!(summary.success_rate, Some(0.0));
        assert_eq!(summary.mean_auth_time_success, None);
        assert_eq!(summary.num_failures, 2);
    }

    #[test]
    fn no_violations_when_all_within_threshold() {
        let log = log_of(&[(0.0, 1.0, true), (0.1, 5.0, false)]);
        assert_eq!(aggregate(&log, 5.0).sla_violations, 0);
    }

    #[test]
    fn successes_and_failures_partition_requests() {
        let log = log_of(&[
            (0.0, 1.0, true),
            (0.2, 2.0, false),
            (0.4, 0.5, true),
            (0.6, 7.0, false),
            (0.8, 3.0, true),
        ]);
        let summary = aggregate(&log, 5.0);

        assert_eq!(
            summary.num_successes + summary.num_failures,
            summary.total_requests
        );
        assert_eq!(summary.success_rate, Some(3.0 / 5.0));
    }

    #[test]
    fn raising_threshold_never_adds_violations() {
        let log = log_of(&[
            (0.0, 0.5, true),
            (0.0, 2.5, false),
            (0.0, 4.0, true),
            (0.0, 6.0, true),
            (0.0, 12.0, false),
        ]);
        let mut previous = usize::MAX;
        for threshold in [0.0, 1.0, 2.5, 4.0, 5.0, 6.0, 20.0] {
            let violations = sla_violations(&log, threshold);
            assert!(violations <= previous);
            previous = violations;
        }
        assert_eq!(sla_violations(&log, 2.5), 3);
    }

    #[test]
    fn total_time_spans_first_arrival_to_last_completion() {
        let log = log_of(&[(2.0, 1.0, true), (0.5, 4.0, true), (1.0, 0.5, false)]);
        let summary = aggregate(&log, 5.0);

        assert_eq!(summary.total_time, Some(4.0));
        assert_eq!(summary.throughput, 3.0 / 4.0);
    }

    #[test]
    fn zero_span_guards_throughput() {
        let log = log_of(&[(0.0, 0.0, true)]);
        let summary = aggregate(&log, 5.0);

        assert_eq!(summary.total_time, Some(0.0));
        assert_eq!(summary.throughput, 0.0);
    }

    #[test]
    fn rolling_throughput_needs_a_full_window() {
        let log = log_of(&[
            (0.0, 1.0, true),
            (0.0, 2.0, true),
            (0.0, 4.0, true),
            (0.0, 8.0, true),
        ]);
        let series = rolling_throughput(&log, 3);

        assert_eq!(series.len(), 4);
        assert_eq!(series[0], None);
        assert_eq!(series[1], None);
        assert_eq!(series[2], Some(3.0 / 3.0));
        assert_eq!(series[3], Some(3.0 / 6.0));
    }

    #[test]
    fn rolling_throughput_skips_flat_windows() {
        let log = log_of(&[(1.0, 1.0, true), (1.0, 1.0, true), (0.0, 4.0, true)]);
        let series = rolling_throughput(&log, 2);

        assert_eq!(series, vec![None, None, Some(1.0)]);
        assert!(series.iter().flatten().all(|value| value.is_finite()));
    }

    #[test]
    fn rolling_throughput_shorter_log_than_window() {
        let log = log_of(&[(0.0, 1.0, true)]);
        assert_eq!(rolling_throughput(&log, 50), vec![None]);
    }

    #[test]
    fn rolling_summary_uses_defined_points_only() {
        let summary = RollingSummary::from_series(&[None, Some(2.0), Some(4.0)], 2);
        assert_eq!(summary.defined_points, 2);
        assert_eq!(summary.min, Some(2.0));
        assert_eq!(summary.mean, Some(3.0));
        assert_eq!(summary.max, Some(4.0));

        let empty = RollingSummary::from_series(&[None, None], 2);
        assert_eq!(empty.defined_points, 0);
        assert_eq!(empty.mean, None);
    }

    #[test]
    fn entries_keep_a_stable_order() {
        let summary = aggregate(&log_of(&[(0.0, 1.0, true)]), 5.0);
        let names: Vec<&str> = summary.entries().iter().map(|entry| entry.name).collect();
        assert_eq!(
            names,
            vec![
                "Total requests",
                "Total simulated time (s)",
                "Throughput (requests/s)",
                "Successful logins",
                "Failed logins",
                "Estimated success rate",
                "Mean authentication time (s)",
                "SLA violations",
            ]
        );
    }
}

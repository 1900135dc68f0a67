use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::events::{EventLog, RunOutcome};
use crate::generator::{EventGenerator, MAX_USERS_PER_RUN, RUN_WINDOW};
use crate::metrics::{aggregate, rolling_throughput};
use crate::models::SimConfig;
use crate::state::{RunMetadata, SimulationResult};

pub struct SimulationEngine {
    pub config: SimConfig,
    pub generator: EventGenerator,
    pub rng: StdRng,
}

impl SimulationEngine {
    /// Validates the configuration and seeds the random source; no run executes yet.
    pub fn new(config: SimConfig) -> Result<Self> {
        validate_config(&config)?;
        let generator = EventGenerator::new(&config)?;
        let rng = StdRng::seed_from_u64(config.seed);

        Ok(Self {
            config,
            generator,
            rng,
        })
    }

    pub fn run(&mut self) -> SimulationResult {
        info!(
            runs = self.config.runs,
            seed = self.config.seed,
            arrival_rate = self.config.arrival_rate,
            "starting simulation"
        );

        let mut events = EventLog::new();
        let mut empty_runs = 0usize;
        for _ in 0..self.config.runs {
            match self.generator.generate(&mut self.rng) {
                RunOutcome::Produced(run_events) => events.append_run(run_events),
                RunOutcome::Empty => empty_runs += 1,
            }
        }
        if empty_runs > 0 {
            debug!(empty_runs, "skipped runs that sampled no users");
        }

        let summary = aggregate(&events, self.config.sla_threshold);
        let rolling = rolling_throughput(&events, self.config.throughput_window);
        info!(
            total_requests = summary.total_requests,
            sla_violations = summary.sla_violations,
            "simulation finished"
        );

        SimulationResult {
            events,
            summary,
            rolling_throughput: rolling,
            metadata: RunMetadata {
                seed: self.config.seed,
                runs: self.config.runs,
                produced_runs: self.config.runs - empty_runs,
                empty_runs,
                sla_threshold: self.config.sla_threshold,
                throughput_window: self.config.throughput_window,
            },
        }
    }
}

pub fn run_simulation(config: &SimConfig) -> Result<SimulationResult> {
    let mut engine = SimulationEngine::new(config.clone())?;
    Ok(engine.run())
}

pub fn validate_config(config: &SimConfig) -> Result<()> {
    if config.runs == 0 {
        return Err(ConfigError::RunsZero.into());
    }
    if !(config.arrival_rate > 0.0 && config.arrival_rate.is_finite()) {
        return Err(ConfigError::ArrivalRate(config.arrival_rate).into());
    }
    if config.arrival_rate / RUN_WINDOW > MAX_USERS_PER_RUN {
        return Err(ConfigError::ArrivalRateTooLarge(config.arrival_rate).into());
    }
    if !(config.mean_auth_time > 0.0 && config.mean_auth_time.is_finite()) {
        return Err(ConfigError::MeanAuthTime(config.mean_auth_time).into());
    }
    if !(0.0..=1.0).contains(&config.success_probability) {
        return Err(ConfigError::SuccessProbability(config.success_probability).into());
    }
    if !(config.sla_threshold >= 0.0 && config.sla_threshold.is_finite()) {
        return Err(ConfigError::SlaThreshold(config.sla_threshold).into());
    }
    if config.throughput_window == 0 {
        return Err(ConfigError::WindowZero.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn small_config() -> SimConfig {
        SimConfig {
            runs: 40,
            seed: 42,
            ..SimConfig::default()
        }
    }

    fn config_error(config: SimConfig) -> ConfigError {
        match run_simulation(&config) {
            Err(Error::InvalidConfiguration(err)) => err,
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("configuration should be rejected"),
        }
    }

    #[test]
    fn same_seed_replays_identical_event_log() {
        let result_a = run_simulation(&small_config()).expect("simulation should succeed");
        let result_b = run_simulation(&small_config()).expect("simulation should succeed");

        assert!(!result_a.events.is_empty());
        assert_eq!(result_a.events, result_b.events);
        assert_eq!(result_a.summary, result_b.summary);
    }

    #[test]
    fn different_seeds_diverge() {
        let result_a = run_simulation(&small_config()).expect("simulation should succeed");
        let result_b = run_simulation(&SimConfig {
            seed: 43,
            ..small_config()
        })
        .expect("simulation should succeed");

        assert_ne!(result_a.events, result_b.events);
    }

    #[test]
    fn log_length_matches_sum_of_run_counts() {
        let config = small_config();
        let result = run_simulation(&config).expect("simulation should succeed");

        let generator = EventGenerator::new(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let expected: usize = (0..config.runs)
            .map(|_| match generator.generate(&mut rng) {
                RunOutcome::Produced(events) => events.len(),
                RunOutcome::Empty => 0,
            })
            .sum();

        assert_eq!(result.summary.total_requests, expected);
        assert_eq!(result.events.len(), expected);
    }

    #[test]
    fn sparse_arrivals_skip_empty_runs() {
        let config = SimConfig {
            runs: 200,
            arrival_rate: 30.0,
            ..SimConfig::default()
        };
        let result = run_simulation(&config).expect("simulation should succeed");

        assert!(result.metadata.empty_runs > 0);
        assert_eq!(
            result.metadata.empty_runs + result.metadata.produced_runs,
            config.runs
        );
        assert!(result.events.len() >= result.metadata.produced_runs);
    }

    #[test]
    fn rolling_series_covers_every_event() {
        let result = run_simulation(&small_config()).expect("simulation should succeed");

        assert_eq!(result.rolling_throughput.len(), result.events.len());
        assert!(result.rolling_throughput[..49].iter().all(Option::is_none));
    }

    #[test]
    fn zero_arrival_rate_is_rejected() {
        let err = config_error(SimConfig {
            arrival_rate: 0.0,
            ..SimConfig::default()
        });
        assert_eq!(err, ConfigError::ArrivalRate(0.0));
    }

    #[test]
    fn oversized_arrival_rate_is_rejected() {
        let err = config_error(SimConfig {
            arrival_rate: 1e300,
            ..SimConfig::default()
        });
        assert_eq!(err, ConfigError::ArrivalRateTooLarge(1e300));
        assert!(err
            .to_string()
            .starts_with("arrival rate must be <= 60000000 (got 1000000"));

        let at_limit = SimConfig {
            arrival_rate: MAX_USERS_PER_RUN * RUN_WINDOW,
            ..SimConfig::default()
        };
        assert!(validate_config(&at_limit).is_ok());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert_eq!(
            config_error(SimConfig {
                runs: 0,
                ..SimConfig::default()
            }),
            ConfigError::RunsZero
        );
        assert_eq!(
            config_error(SimConfig {
                mean_auth_time: -1.0,
                ..SimConfig::default()
            }),
            ConfigError::MeanAuthTime(-1.0)
        );
        assert_eq!(
            config_error(SimConfig {
                success_probability: 1.2,
                ..SimConfig::default()
            }),
            ConfigError::SuccessProbability(1.2)
        );
        assert_eq!(
            config_error(SimConfig {
                sla_threshold: -0.5,
                ..SimConfig::default()
            }),
            ConfigError::SlaThreshold(-0.5)
        );
        assert_eq!(
            config_error(SimConfig {
                throughput_window: 0,
                ..SimConfig::default()
            }),
            ConfigError::WindowZero
        );
    }

    #[test]
    fn nan_rate_is_rejected() {
        let err = validate_config(&SimConfig {
            arrival_rate: f64::NAN,
            ..SimConfig::default()
        });
        assert!(err.is_err());
    }

    #[test]
    fn metadata_echoes_configuration() {
        let result = run_simulation(&small_config()).expect("simulation should succeed");
        assert_eq!(result.metadata.seed, 42);
        assert_eq!(result.metadata.runs, 40);
        assert_eq!(result.metadata.throughput_window, 50);
        assert_eq!(result.metadata.sla_threshold, 5.0);
    }
}

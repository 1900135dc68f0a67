use rand::Rng;
use rand_distr::{Bernoulli, Distribution, Exp, Poisson};

use crate::error::{ConfigError, Result};
use crate::events::{LoginEvent, RunOutcome};
use crate::models::SimConfig;

/// Time units covered by one run; the configured arrival rate is spread over it.
pub const RUN_WINDOW: f64 = 60.0;

/// Largest mean user count per run; a run's events are held in memory at once.
pub const MAX_USERS_PER_RUN: f64 = 1_000_000.0;

/// Samples the users of a single run.
///
/// Draw order per run is fixed: the user count, then every arrival gap, then
/// every auth duration, then every outcome. Replaying a seed depends on it.
#[derive(Clone, Debug)]
pub struct EventGenerator {
    users: Poisson<f64>,
    arrivals: Exp<f64>,
    durations: Exp<f64>,
    outcomes: Bernoulli,
}

impl EventGenerator {
    pub fn new(config: &SimConfig) -> Result<Self> {
        let rate = config.arrival_rate / RUN_WINDOW;
        if rate > MAX_USERS_PER_RUN {
            return Err(ConfigError::ArrivalRateTooLarge(config.arrival_rate).into());
        }
        let users = Poisson::new(rate).map_err(distribution_error)?;
        let arrivals = Exp::new(rate).map_err(distribution_error)?;
        let durations = Exp::new(1.0 / config.mean_auth_time).map_err(distribution_error)?;
        let outcomes = Bernoulli::new(config.success_probability).map_err(distribution_error)?;

        Ok(Self {
            users,
            arrivals,
            durations,
            outcomes,
        })
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> RunOutcome {
        let draw: f64 = self.users.sample(rng);
        let num_users = draw as usize;
        if num_users == 0 {
            return RunOutcome::Empty;
        }

        let arrivals: Vec<f64> = (0..num_users).map(|_| self.arrivals.sample(rng)).collect();
        let durations: Vec<f64> = (0..num_users).map(|_| self.durations.sample(rng)).collect();
        let outcomes: Vec<bool> = (0..num_users).map(|_| self.outcomes.sample(rng)).collect();

        let events = arrivals
            .into_iter()
            .zip(durations)
            .zip(outcomes)
            .map(|((arrival_time, auth_duration), success)| {
                LoginEvent::new(arrival_time, auth_duration, success)
            })
            .collect();

        RunOutcome::Produced(events)
    }
}

fn distribution_error(err: impl std::fmt::Display) -> ConfigError {
    ConfigError::Distribution(err.to_string())
}

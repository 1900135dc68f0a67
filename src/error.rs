use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    #[error("degenerate aggregation: {0}")]
    DegenerateAggregation(&'static str),
    #[error("narrative generation failed: {0}")]
    UpstreamFailure(String),
    #[error("environment variable '{0}' is not set")]
    MissingApiKey(String),
    #[error("{0}")]
    ConfigIo(String),
    #[error("{0}")]
    ConfigParse(String),
    #[error("unsupported config format '{0}'")]
    UnsupportedConfigFormat(String),
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Cli(String),
}

/// Reasons a [`SimConfig`](crate::models::SimConfig) is rejected before any run executes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("runs must be greater than 0")]
    RunsZero,
    #[error("arrival rate must be > 0 (got {0})")]
    ArrivalRate(f64),
    #[error("arrival rate must be <= {max} (got {0})", max = crate::generator::MAX_USERS_PER_RUN * crate::generator::RUN_WINDOW)]
    ArrivalRateTooLarge(f64),
    #[error("mean auth time must be > 0 (got {0})")]
    MeanAuthTime(f64),
    #[error("success probability must be within [0, 1] (got {0})")]
    SuccessProbability(f64),
    #[error("sla threshold must be >= 0 (got {0})")]
    SlaThreshold(f64),
    #[error("throughput window must be greater than 0")]
    WindowZero,
    #[error("{0}")]
    Distribution(String),
}

pub type Result<T> = std::result::Result<T, Error>;

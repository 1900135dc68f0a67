use std::fs;
use std::path::{Path, PathBuf};

use clap::{error::ErrorKind, Args, Parser, Subcommand, ValueEnum};

use crate::error::{Error, Result};
use crate::models::SimConfig;

#[derive(Parser, Debug)]
#[command(name = "login-sim", version, about = "Monte Carlo simulator for login authentication")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[arg(short, long, global = true)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate and print the summary metrics.
    Run {
        #[command(flatten)]
        sim: SimArgs,
        #[arg(long, value_enum, default_value_t = FormatArg::Human)]
        format: FormatArg,
    },
    /// Print the effective configuration after file and flag overrides.
    ShowConfig {
        #[command(flatten)]
        sim: SimArgs,
    },
    /// Simulate and write the event table as JSON Lines.
    Events {
        #[command(flatten)]
        sim: SimArgs,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Simulate and write the Markdown report with generated narrative.
    Report {
        #[command(flatten)]
        sim: SimArgs,
        #[arg(long, default_value = "login-sim-report.md")]
        output: PathBuf,
        #[arg(long, help = "Write the report without calling the narrative service")]
        skip_narrative: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct SimArgs {
    #[arg(long, help = "TOML or JSON file with simulation settings")]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub runs: Option<usize>,
    #[arg(long, allow_negative_numbers = true)]
    pub mean_auth_time: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub success_probability: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub arrival_rate: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub sla_threshold: Option<f64>,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long)]
    pub window: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Human,
    Summary,
    Json,
}

pub fn parse_args() -> Result<Cli> {
    Cli::try_parse().map_err(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => Error::Cli(err.to_string()),
    })
}

/// Starts from the config file (or defaults) and applies flag overrides.
pub fn build_config(args: &SimArgs) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };

    if let Some(runs) = args.runs {
        config.runs = runs;
    }
    if let Some(mean_auth_time) = args.mean_auth_time {
        config.mean_auth_time = mean_auth_time;
    }
    if let Some(success_probability) = args.success_probability {
        config.success_probability = success_probability;
    }
    if let Some(arrival_rate) = args.arrival_rate {
        config.arrival_rate = arrival_rate;
    }
    if let Some(sla_threshold) = args.sla_threshold {
        config.sla_threshold = sla_threshold;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(window) = args.window {
        config.throughput_window = window;
    }

    Ok(config)
}

pub fn load_config(path: &Path) -> Result<SimConfig> {
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::ConfigIo(format!(
            "failed to read config '{}': {}",
            path.display(),
            err
        ))
    })?;
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .unwrap_or("");

    match ext {
        "toml" => toml::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse TOML: {}", err))),
        "json" => serde_json::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse JSON: {}", err))),
        "" => Err(Error::UnsupportedConfigFormat("unknown".to_string())),
        _ => Err(Error::UnsupportedConfigFormat(ext.to_string())),
    }
}

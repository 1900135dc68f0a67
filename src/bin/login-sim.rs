use std::fs::File;
use std::io::{self, BufWriter};

use login_sim::config::{self, Command, FormatArg};
use login_sim::engine;
use login_sim::error::{Error, Result};
use login_sim::logging::{self, Verbosity};
use login_sim::narrative::ChatCompletionClient;
use login_sim::output::{self, Formatter, HumanFormatter, JsonFormatter, SummaryFormatter};
use login_sim::report::{self, ReportComposer};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = config::parse_args()?;
    logging::init_subscriber(Verbosity::from_flags(cli.verbose, cli.quiet));

    match cli.command {
        Command::Run { sim, format } => {
            let config = config::build_config(&sim)?;
            let result = engine::run_simulation(&config)?;
            let formatter = formatter_for(&format);
            print!("{}", formatter.write(&result));
        }
        Command::ShowConfig { sim } => {
            let config = config::build_config(&sim)?;
            engine::validate_config(&config)?;
            println!("Runs: {}", config.runs);
            println!("Mean auth time: {}", config.mean_auth_time);
            println!("Success probability: {}", config.success_probability);
            println!("Arrival rate: {}", config.arrival_rate);
            println!("SLA threshold: {}", config.sla_threshold);
            println!("Seed: {}", config.seed);
            println!("Throughput window: {}", config.throughput_window);
            println!("Narrative model: {}", config.narrative.model);
        }
        Command::Events { sim, output } => {
            let config = config::build_config(&sim)?;
            let result = engine::run_simulation(&config)?;
            match output {
                Some(path) => {
                    let file = File::create(&path).map_err(|err| {
                        Error::Io(format!("failed to create '{}': {}", path.display(), err))
                    })?;
                    output::write_event_table(&result.events, &mut BufWriter::new(file))?;
                }
                None => {
                    let stdout = io::stdout();
                    output::write_event_table(&result.events, &mut stdout.lock())?;
                }
            }
        }
        Command::Report {
            sim,
            output,
            skip_narrative,
        } => {
            let config = config::build_config(&sim)?;
            let result = engine::run_simulation(&config)?;
            let stem = report::chart_stem(&output);
            let document = if skip_narrative {
                ReportComposer::without_narrative().compose(&result, &config, &stem)?
            } else {
                let client = ChatCompletionClient::from_config(&config.narrative)?;
                ReportComposer::new(&client).compose(&result, &config, &stem)?
            };
            report::write_report(&output, &document)?;
            println!("Report written to {}", output.display());
        }
    }

    Ok(())
}

fn formatter_for(format: &FormatArg) -> Box<dyn Formatter> {
    match format {
        FormatArg::Human => Box::new(HumanFormatter),
        FormatArg::Summary => Box::new(SummaryFormatter),
        FormatArg::Json => Box::new(JsonFormatter),
    }
}

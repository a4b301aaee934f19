use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use plugins::fetch::HttpModuleFetcher;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use viewer::{ReplayReport, Scenario, ViewerConfig, replay};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless viewport driver")]
struct Args {
    /// JSON viewer config; `VIEWER_*` environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scenario against the headless renderer and print the command log
    Replay {
        scenario: PathBuf,

        /// Fetch plugin modules over HTTP even when the scenario bundles them
        #[arg(long)]
        network: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ViewerConfig::load(path),
        None => Ok(ViewerConfig::default()),
    };
    let config = match config {
        Ok(config) => config.with_env(),
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match args.command {
        Command::Replay { scenario, network } => {
            let scenario = match Scenario::load(&scenario) {
                Ok(scenario) => scenario,
                Err(e) => {
                    error!("{e}");
                    return ExitCode::FAILURE;
                }
            };
            info!(steps = scenario.steps.len(), "replaying scenario");
            let report = if network || scenario.modules.is_empty() {
                let fetcher = HttpModuleFetcher::new(config.module_origin.clone());
                replay(&scenario, config, &fetcher).await
            } else {
                let fetcher = scenario.module_fetcher();
                replay(&scenario, config, &fetcher).await
            };
            print_report(&report)
        }
    }
}

fn print_report(report: &ReplayReport) -> ExitCode {
    match serde_json::to_string_pretty(report) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("failed to encode report: {e}");
            ExitCode::FAILURE
        }
    }
}

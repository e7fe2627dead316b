use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use parcel_pipeline::config::Config;
use parcel_pipeline::context::RunContext;
use parcel_pipeline::logging;
use parcel_pipeline::notifier::{EmailNotifier, LogNotifier, Notifier};
use parcel_pipeline::pipeline::orchestrator::Orchestrator;
use parcel_pipeline::pipeline::report::RunReport;
use parcel_pipeline::pipeline::sources;

#[derive(Parser)]
#[command(name = "parcel_pipeline")]
#[command(about = "Monthly municipal parcel normalization and merge pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the pipeline configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Run date (yyyy-mm-dd); defaults to today. Every artifact of the run
    /// is named from this date.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Skip the status mail and log the report instead
    #[arg(long)]
    no_email: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the run folder; vendor data is then staged into staging/
    Start,
    /// Normalize every staged source into the canonical schema
    Normalize,
    /// Merge, join reference layers, finalize, and notify
    Finish,
    /// Normalize then finish in one invocation
    Run,
    /// List the configured municipal sources in merge order
    Sources,
}

fn notifier_for(cli: &Cli, config: &Config) -> Box<dyn Notifier> {
    if cli.no_email {
        Box::new(LogNotifier)
    } else {
        Box::new(EmailNotifier::new(config.notify.clone()))
    }
}

fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let run_date = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let ctx = RunContext::new(run_date, config.workspace.clone(), config.operator.clone());
    let orchestrator = Orchestrator::new(config.clone(), ctx.clone());

    match &cli.command {
        Commands::Start => {
            let dir = orchestrator.start()?;
            println!("Run folder ready: {}", dir.display());
            println!("Stage vendor datasets into {}", ctx.staging_dir().display());
        }
        Commands::Normalize => {
            let mut report = RunReport::new(ctx.date_stamp());
            orchestrator.normalize_sources(&mut report)?;
            print!("{report}");
        }
        Commands::Finish => {
            let notifier = notifier_for(&cli, &config);
            let mut report = RunReport::new(ctx.date_stamp());
            match orchestrator.finish(&mut report, notifier.as_ref()) {
                Ok(path) => {
                    print!("{report}");
                    println!("Published artifact: {}", path.display());
                }
                Err(e) => {
                    error!(error = %e, "Finish failed");
                    print!("{report}");
                    return Err(e.into());
                }
            }
        }
        Commands::Run => {
            let notifier = notifier_for(&cli, &config);
            let mut report = RunReport::new(ctx.date_stamp());
            match orchestrator.run(&mut report, notifier.as_ref()) {
                Ok(path) => {
                    print!("{report}");
                    println!("Published artifact: {}", path.display());
                }
                Err(e) => {
                    error!(error = %e, "Run failed");
                    print!("{report}");
                    return Err(e.into());
                }
            }
        }
        Commands::Sources => {
            for source_id in sources::source_ids() {
                println!("{source_id}");
            }
        }
    }

    info!("Done");
    Ok(())
}

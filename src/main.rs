use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use retail_etl::app::etl_use_case::{EtlUseCase, RunSummary};
use retail_etl::config::EtlConfig;
use retail_etl::infra::{CsvFileSourceAdapter, SinkConfig, SourceConfig, TsvFileSinkAdapter};
use retail_etl::pipeline::Pipeline;
use retail_etl::{logging, metrics, metrics_push};

const CONFIG_ENV: &str = "ETL_CONFIG";

#[derive(Parser)]
#[command(name = "retail_etl")]
#[command(about = "Cleaning and quality gate for retail transaction extracts")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the extract and publish it if the quality gate passes
    Run {
        /// Raw comma-delimited extract with a header row
        #[arg(long)]
        input: PathBuf,
        /// Destination of the tab-delimited cleaned file
        #[arg(long)]
        output: PathBuf,
        /// TOML configuration (falls back to ETL_CONFIG, then built-in defaults)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Also write the run summary as JSON
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },
    /// Run the pipeline and the quality gate without writing any output
    Check {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<EtlConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_ENV).ok().filter(|v| !v.trim().is_empty()).map(PathBuf::from));

    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            EtlConfig::load(&path).with_context(|| format!("invalid configuration {}", path.display()))
        }
        None => {
            info!("No configuration file given, using defaults");
            Ok(EtlConfig::default())
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!("\n📊 Run {}", summary.run_id);
    println!("   Source: {}", summary.source);
    println!("   Records before: {}", summary.before.total_records);
    for stage in &summary.stages {
        println!(
            "   {:<20} {:>8} -> {:>8}",
            stage.stage, stage.input_count, stage.output_count
        );
    }
    println!("   Clean records: {}", summary.clean_records);
    for (name, count) in &summary.after.counters {
        println!("   {}: {}", name, count);
    }
    match &summary.output_location {
        Some(location) => println!("   Output file: {}", location),
        None => println!("   Output file: (not written)"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();
    metrics::init_metrics();

    let cli = Cli::parse();

    let (use_case, summary_json) = match cli.command {
        Commands::Run {
            input,
            output,
            config,
            summary_json,
        } => {
            let config = load_config(config.as_deref())?;
            let pipeline = Pipeline::standard(&config)?;
            let use_case = EtlUseCase::new(
                Box::new(CsvFileSourceAdapter::new(SourceConfig::new(input))),
                pipeline,
            )
            .with_sink(Box::new(TsvFileSinkAdapter::new(SinkConfig::new(output))));
            (use_case, summary_json)
        }
        Commands::Check { input, config } => {
            let config = load_config(config.as_deref())?;
            let pipeline = Pipeline::standard(&config)?;
            let use_case = EtlUseCase::new(
                Box::new(CsvFileSourceAdapter::new(SourceConfig::new(input))),
                pipeline,
            );
            (use_case, None)
        }
    };

    let outcome = use_case.run().await;

    let instance = match &outcome {
        Ok(summary) => summary.run_id.to_string(),
        Err(_) => "failed".to_string(),
    };
    if let Err(e) = metrics_push::push_run_metrics(&instance).await {
        error!("Metrics push failed: {}", e);
    }

    match outcome {
        Ok(summary) => {
            print_summary(&summary);
            if let Some(path) = summary_json {
                summary.write_json(&path)?;
                info!("Wrote run summary to {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}

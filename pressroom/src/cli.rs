//! Command-line interface for pressroom.
//!
//! All pipeline logic lives in `pressroom-core`; this module parses arguments,
//! wires the concrete clients together and runs exactly one pass.
use crate::llm::OpenAiClient;
use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pressroom_core::config::AssetMode;
use pressroom_core::contract::AssetGenerator;
use pressroom_core::pipeline::{run_pass, PassSettings};
use pressroom_core::publisher::HttpPublisher;
use pressroom_core::store::CsvRecordStore;
use std::path::PathBuf;

/// CLI for pressroom: generate and publish articles for pending keywords.
#[derive(Parser)]
#[clap(
    name = "pressroom",
    version,
    about = "Generate articles for pending keywords and publish them, tracking progress in the keyword sheet"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one pass over every pending keyword in the record file
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run { config } => {
            let config = load_config(config)?;
            config.pipeline.trace_loaded();
            tracing::info!(command = "run", "Starting pass");

            let store = CsvRecordStore::from_config(&config.pipeline.records);
            let publisher = HttpPublisher::new(config.pipeline.publish.clone())
                .context("Failed to construct HTTP publisher")?;
            let client = OpenAiClient::new(
                &config.openai,
                &config.pipeline.generation,
                &config.pipeline.assets,
            )
            .context("Failed to construct generation client")?;
            let settings = PassSettings::from_config(&config.pipeline);

            let assets: Option<&dyn AssetGenerator> =
                (settings.asset_mode != AssetMode::Disabled).then_some(&client as &dyn AssetGenerator);

            match run_pass(&settings, &store, &client, assets, &publisher).await {
                Ok(report) => {
                    println!(
                        "Pass {} complete: {} published, {} failed, {} already sent, {} skipped, {} deferred",
                        report.run_id,
                        report.published(),
                        report.failed(),
                        report.already_sent(),
                        report.skipped(),
                        report.deferred()
                    );
                    tracing::info!(command = "run", ?report, "Pass complete");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "run", error = %e, "Pass failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}

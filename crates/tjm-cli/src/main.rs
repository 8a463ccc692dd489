use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use tjm_core::extract::extract_file;
use tjm_core::{Pipeline, PipelineConfig, ProcessRequest, ProcessResponse, RecordTransformer};
use tjm_db::{Database, DatabaseConfig, OfferRepository};

#[derive(Parser)]
#[command(name = "tjm", version, about = "Freelance job-offer normalization pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every matching raw file and load the results
    Run {
        /// Directory holding raw scraper output
        #[arg(long, env = "TJM_SOURCE_DIR")]
        source_dir: Option<PathBuf>,

        /// Glob selecting input files (e.g. "*.jsonl")
        #[arg(long, env = "TJM_FILE_PATTERN")]
        pattern: Option<String>,

        /// Directory for the JSONL backup
        #[arg(long, env = "TJM_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Drop offers scoring below this (0..=1)
        #[arg(long, env = "TJM_MIN_QUALITY")]
        min_quality: Option<f64>,

        /// Records per write chunk
        #[arg(long, env = "TJM_BATCH_SIZE")]
        batch_size: Option<usize>,

        /// Reprocess files even if seen before
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Skip the JSONL backup sink
        #[arg(long, default_value_t = false)]
        no_backup: bool,
    },

    /// Transform one file and print the offers without persisting them
    Transform {
        /// Raw JSON or JSONL file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Check the input directory and every sink
    Health,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tjm=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Run {
            source_dir,
            pattern,
            output_dir,
            min_quality,
            batch_size,
            force,
            no_backup,
        } => {
            let mut config = config;
            if let Some(dir) = source_dir {
                config = config.with_source_dir(dir);
            }
            if let Some(pattern) = pattern {
                config = config.with_file_pattern(pattern);
            }
            if let Some(dir) = output_dir {
                config = config.with_output_dir(dir);
            }
            if let Some(min_quality) = min_quality {
                config = config.with_min_quality(min_quality);
            }
            if let Some(batch_size) = batch_size {
                config = config.with_batch_size(batch_size);
            }
            if no_backup {
                config = config.with_backup(false);
            }
            config.validate().map_err(|e| anyhow::anyhow!(e))?;
            cmd_run(config, force).await
        }
        Commands::Transform { input } => {
            cmd_transform(&config, &input).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Health => cmd_health(config).await,
    }
}

/// Open the primary store when `DATABASE_URL` is set. A database that is
/// down at startup still yields a store; its health check fails later and
/// the run falls back to the backup sink.
async fn primary_store() -> Result<Option<OfferRepository>> {
    let Some(db_config) = DatabaseConfig::from_env().map_err(|e| anyhow::anyhow!(e))? else {
        tracing::info!("DATABASE_URL not set, running with the backup sink only");
        return Ok(None);
    };
    let db = Database::connect_lazy(&db_config).map_err(|e| anyhow::anyhow!(e))?;
    if let Err(e) = db.migrate().await {
        tracing::warn!("Could not apply migrations: {e}");
    }
    Ok(Some(db.offers()))
}

async fn cmd_run(config: PipelineConfig, force: bool) -> Result<ExitCode> {
    let pipeline = Pipeline::new(config, primary_store().await?);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight writes");
            on_signal.cancel();
        }
    });

    let request = ProcessRequest {
        force_reprocess: force,
        ..ProcessRequest::default()
    };
    let run = pipeline
        .run(&request, &cancel)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    let response = ProcessResponse::from(&run);
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn cmd_transform(config: &PipelineConfig, input: &Path) -> Result<()> {
    if !input.is_file() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let transformer = RecordTransformer::new(config);
    let extracted = extract_file(input).await;
    for error in &extracted.errors {
        tracing::warn!("{error}");
    }

    let mut passed = 0;
    for record in &extracted.records {
        match transformer.transform(record) {
            Ok(offer) => {
                if offer.quality.overall() >= config.min_quality {
                    passed += 1;
                }
                println!(
                    "{}",
                    serde_json::to_string(&offer).context("Failed to serialize offer")?
                );
            }
            Err(e) => tracing::warn!("{}: {e}", extracted.file_name()),
        }
    }

    tracing::info!(
        "{} records, {} malformed, {} above quality gate {}",
        extracted.records.len(),
        extracted.malformed,
        passed,
        config.min_quality
    );
    Ok(())
}

async fn cmd_health(config: PipelineConfig) -> Result<ExitCode> {
    let pipeline = Pipeline::new(config, primary_store().await?);
    let health = pipeline.health().await;
    println!("{}", serde_json::to_string_pretty(&health)?);

    Ok(if health.healthy {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

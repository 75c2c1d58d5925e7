//! Songplay ETL
//!
//! Builds a star schema of song plays in the warehouse:
//! - drops and recreates staging, dimension and fact tables
//! - copies the song and event-log datasets from S3 into staging
//! - populates users, artists, songs, time and songplays with INSERT…SELECT

mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};

use cli::{Cli, Commands};
use etl_core::{DwhConfig, Phase};
use telemetry::{init_tracing_from_env, PipelineMetrics};
use warehouse::local_load;
use warehouse::{check_connection, row_counts, PlanSettings, QueryPlan, Runner, WarehouseClient, WarehouseConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing_from_env(cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            let code = e
                .downcast_ref::<etl_core::Error>()
                .map(etl_core::Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let rendering = matches!(cli.command, Commands::Render { .. });
    let mut config = load_config(&cli.config, rendering)?;

    if let Some(dialect) = cli.dialect {
        config.pipeline.dialect = dialect;
    }
    if let Some(mode) = cli.mode {
        config.pipeline.execution_mode = mode;
    }
    if let Some(policy) = cli.user_policy {
        config.pipeline.user_level_policy = policy;
    }

    if let Commands::Render { phase } = &cli.command {
        let phases: &[Phase] = if phase.is_empty() { &Phase::ALL } else { phase };
        let plan = build_plan(&config, phases)?;
        print!("{}", plan.render(phases));
        return Ok(());
    }

    info!(
        "Starting songplay-etl v{} ({} dialect)",
        env!("CARGO_PKG_VERSION"),
        config.pipeline.dialect
    );

    let cluster = config.cluster()?;
    let client = WarehouseClient::connect(WarehouseConfig::from_cluster(
        cluster,
        config.pipeline.connect_timeout_secs,
    ))
    .await
    .context("Failed to connect to warehouse")?;

    let outcome = execute(&cli.command, &config, &client).await;

    if let Err(e) = client.close().await {
        warn!("Error closing warehouse connection: {}", e);
    }
    outcome
}

async fn execute(command: &Commands, config: &DwhConfig, client: &WarehouseClient) -> Result<()> {
    match command {
        Commands::Check => {
            if !check_connection(client).await {
                anyhow::bail!("Warehouse health check failed");
            }
            println!("ok");
        }
        Commands::Counts => {
            for count in row_counts(client).await? {
                println!("{:<16} {}", count.table, count.rows);
            }
        }
        Commands::LoadLocal { events, songs } => {
            if events.is_none() && songs.is_none() {
                anyhow::bail!("load-local needs --events and/or --songs");
            }
            if let Some(path) = events {
                let records = local_load::load_events(path).await?;
                local_load::insert_staging_events(client, &records).await?;
            }
            if let Some(path) = songs {
                let records = local_load::load_songs(path).await?;
                local_load::insert_staging_songs(client, &records).await?;
            }
        }
        Commands::Run | Commands::CreateTables | Commands::Etl => {
            let phases = command.phases().unwrap_or(&Phase::ALL);
            let plan = build_plan(config, phases)?;

            let metrics = PipelineMetrics::new();
            let runner = Runner::new(client, config.pipeline.execution_mode, &metrics);
            let result = runner.run(&plan, phases).await;
            metrics.snapshot().log();
            let report = result?;

            if phases.contains(&Phase::Insert) {
                for count in row_counts(client).await? {
                    info!(table = %count.table, rows = count.rows, "Table loaded");
                }
            }
            info!(run_id = %report.run_id, elapsed_ms = report.elapsed_ms, "Done");
        }
        // rendered before connecting
        Commands::Render { .. } => {}
    }
    Ok(())
}

/// Reads the INI file. Rendering falls back to environment-only settings
/// when the file is absent.
fn load_config(path: &Path, allow_missing: bool) -> Result<DwhConfig> {
    let config = if allow_missing && !path.is_file() {
        debug!(path = %path.display(), "No configuration file, using environment");
        DwhConfig::from_env()?
    } else {
        DwhConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?
    };
    Ok(config)
}

/// COPY settings are only validated when the copy phase is part of `phases`.
fn build_plan(config: &DwhConfig, phases: &[Phase]) -> Result<QueryPlan> {
    let dialect = config.pipeline.dialect;
    let copy = if dialect.supports_s3_copy() && phases.contains(&Phase::Copy) {
        Some(config.copy_options()?)
    } else {
        None
    };

    let plan = QueryPlan::build(&PlanSettings {
        dialect,
        user_level_policy: config.pipeline.user_level_policy,
        copy,
    })?;
    Ok(plan)
}

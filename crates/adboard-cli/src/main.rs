use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use adboard_meta::{MetaClient, MetaConfig};
use adboard_sync::HistorySyncOptions;

#[derive(Debug, Parser)]
#[command(name = "adboard-cli")]
#[command(about = "adboard command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sync one day of ad-performance data (defaults to yesterday).
    SyncDay {
        /// Calendar date, YYYY-MM-DD.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Backfill from a start date through yesterday in monthly chunks.
    SyncHistory {
        /// Start date, YYYY-MM-DD (defaults to the configured history start).
        #[arg(long)]
        since: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = adboard_core::load_app_config()?;

    let pool_config = adboard_db::PoolConfig {
        max_connections: config.db_max_connections,
        min_connections: config.db_min_connections,
        acquire_timeout_secs: config.db_acquire_timeout_secs,
    };
    let pool = adboard_db::connect_pool(&config.database_url, pool_config).await?;
    adboard_db::run_migrations(&pool).await?;

    let meta_config = MetaConfig::from_app_config(&config)?;
    let client = MetaClient::new(meta_config, config.meta_request_timeout_secs)?
        .with_retry_policy(config.meta_max_retries, config.meta_retry_backoff_base_ms);

    match cli.command {
        Commands::SyncDay { date } => {
            let date = date.unwrap_or_else(adboard_core::yesterday_local);
            tracing::info!(date = %date, "syncing one day");
            let report = adboard_sync::sync_day(&pool, &client, date).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::SyncHistory { since } => {
            let since = since.unwrap_or(config.history_default_since);
            tracing::info!(since = %since, "backfilling history through yesterday");
            let options = HistorySyncOptions::new(since)
                .with_delay(Duration::from_millis(config.sync_chunk_delay_ms));
            let report = adboard_sync::run_history_sync(&pool, &client, options).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

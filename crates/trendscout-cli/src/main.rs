mod query;
mod scan;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trendscout_core::Region;

#[derive(Debug, Parser)]
#[command(name = "trendscout-cli")]
#[command(about = "Trending product scanner command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape best sellers, score them and store the top products
    Scan {
        /// Region to scan (US or UK); defaults to `TRENDSCOUT_REGION`
        #[arg(long)]
        region: Option<Region>,
        /// Read listings from a JSON file instead of scraping
        #[arg(long)]
        listings: Option<PathBuf>,
        /// Score and rank without touching the database or sending notifications
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the highest-scoring active products
    Top {
        /// Maximum number of products to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Show score history for one product
    History {
        /// Product id (see `top`)
        #[arg(long)]
        product_id: i64,
        /// Maximum number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Archive stale low-scoring products without running a scan
    Archive {
        /// Days without an update before a product is stale
        #[arg(long)]
        days: Option<u32>,
        /// Archive only products scoring below this
        #[arg(long)]
        below: Option<f64>,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("trendscout-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = trendscout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Commands::Scan {
        region,
        listings,
        dry_run: true,
    } = &command
    {
        return scan::run_scan_dry(&config, *region, listings.as_deref()).await;
    }

    let pool = connect(&config).await?;
    match command {
        Commands::Scan {
            region, listings, ..
        } => scan::run_scan(&pool, &config, region, listings.as_deref()).await,
        Commands::Top { limit } => query::run_top(&pool, limit).await,
        Commands::History { product_id, limit } => {
            query::run_history(&pool, product_id, limit).await
        }
        Commands::Archive { days, below } => {
            query::run_archive(
                &pool,
                days.unwrap_or(config.archive_after_days),
                below.unwrap_or(config.archive_score_below),
            )
            .await
        }
        Commands::Migrate => {
            let applied = trendscout_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
            Ok(())
        }
    }
}

async fn connect(config: &trendscout_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = trendscout_db::PoolConfig::from_app_config(config);
    let pool = trendscout_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests;

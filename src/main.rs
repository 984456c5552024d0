//! streaming-analytics - Maintenance CLI for the streaming analytics store
//!
//! `bootstrap` prepares a fresh environment, `rebuild-stats` recomputes the
//! denormalized video statistics from the event log and prints the report.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use streaming_analytics::schema::BootstrapReport;
use streaming_analytics::{
    db, AppError, AppResult, BootstrapOptions, Bootstrapper, Config, PgStore, StatsRebuilder,
};

#[derive(Parser)]
#[command(name = "streaming-analytics")]
#[command(about = "Bootstrap and maintain the streaming analytics store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create collections, indexes, sample data and the application user
    Bootstrap {
        /// Remove existing records before seeding
        #[arg(long)]
        reset: bool,

        /// Do not provision the application user
        #[arg(long)]
        skip_credential: bool,
    },

    /// Rebuild video_stats from WATCH events and print the report
    RebuildStats {
        /// Rows in the top videos section
        #[arg(long)]
        top: Option<usize>,
    },

    /// Verify that every collection exists
    CheckSchema,
}

/// Initialize tracing/logging
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "streaming_analytics=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            init_tracing(false);
            return AppError::from(err).report();
        }
    };
    init_tracing(config.is_production());

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => err.report(),
    }
}

async fn run(command: Commands, config: &Config) -> AppResult<()> {
    tracing::info!("Connecting to database...");
    let pool = db::connect(config).await?;
    tracing::info!("Database connected successfully");

    let result = execute(command, config, PgStore::new(pool.clone())).await;

    pool.close().await;
    tracing::info!("Database connections closed");
    result
}

async fn execute(command: Commands, config: &Config, store: PgStore) -> AppResult<()> {
    match command {
        Commands::Bootstrap {
            reset,
            skip_credential,
        } => {
            let options = BootstrapOptions {
                reset,
                credential: if skip_credential { None } else { config.credential() },
            };
            let report = Bootstrapper::new(store).run(&options).await?;
            print_bootstrap(&report);
            Ok(())
        }
        Commands::RebuildStats { top } => {
            let rebuilder =
                StatsRebuilder::new(store).with_top_limit(top.unwrap_or(config.report_top_limit));
            if !db::check_schema(rebuilder.store()).await? {
                return Err(AppError::SchemaIncomplete);
            }
            let report = rebuilder.run().await?;
            println!("{}", report);
            Ok(())
        }
        Commands::CheckSchema => {
            if db::check_schema(&store).await? {
                println!("Schema complete");
                Ok(())
            } else {
                Err(AppError::SchemaIncomplete)
            }
        }
    }
}

fn print_bootstrap(report: &BootstrapReport) {
    println!("=== BOOTSTRAP ===");
    if report.reset {
        println!("Existing records removed");
    }
    println!("Collections: {}", report.collections.join(", "));
    println!("Indexes created: {}", report.indexes.len());
    println!("Sample videos inserted: {}", report.videos_inserted);
    println!("Sample video stats inserted: {}", report.stats_inserted);
    match &report.credential {
        Some(username) => println!("Application user: {}", username),
        None => println!("Application user: not created"),
    }
    for skipped in &report.skipped {
        println!("Skipped: {}", skipped);
    }
    println!("=== BOOTSTRAP COMPLETE ===");
}

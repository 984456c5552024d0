//! Demo Event Generator
//!
//! Fills the catalog and appends random viewing events so `rebuild-stats`
//! has data to aggregate.
//!
//! Run with: cargo run --bin generate_events --release -- --events 10000

use std::time::Instant;

use chrono::Utc;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use streaming_analytics::generator::{DataGenerator, DEFAULT_USERS, MAX_VIDEOS};
use streaming_analytics::{db, AnalyticsStore, Config, PgStore};

/// Events written per insert
const BATCH_SIZE: usize = 1000;

#[derive(Parser)]
#[command(name = "generate_events")]
#[command(about = "Insert a demo catalog and random viewing events", long_about = None)]
struct Args {
    /// Number of events to insert
    #[arg(long, default_value_t = 1000)]
    events: usize,

    /// Catalog size
    #[arg(long, default_value_t = MAX_VIDEOS)]
    videos: u32,

    /// Distinct users events are drawn from
    #[arg(long, default_value_t = DEFAULT_USERS)]
    users: u32,

    /// Seed for reproducible data
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = Config::from_env()?;

    println!("Generating {} events over {} videos", args.events, args.videos);
    println!("Connecting to database...");

    let pool = db::connect(&config).await?;
    let store = PgStore::new(pool.clone());
    if !db::check_schema(&store).await? {
        anyhow::bail!("Database schema incomplete, run `streaming-analytics bootstrap` first");
    }

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut generator = DataGenerator::new(rng, Utc::now())
        .with_users(args.users)
        .with_videos(args.videos);

    let added = store.insert_missing_videos(&generator.catalog()).await?;
    println!("Catalog entries added: {}", added);

    let start = Instant::now();
    let mut inserted = 0u64;
    let mut remaining = args.events;

    while remaining > 0 {
        let batch = generator.events(remaining.min(BATCH_SIZE));
        inserted += store.insert_events(&batch).await?;
        remaining -= batch.len();
        println!("Inserted {} events...", inserted);
    }

    let elapsed = start.elapsed();
    let rate = inserted as f64 / elapsed.as_secs_f64().max(f64::EPSILON);

    println!("\n=== Generation Results ===");
    println!("Events: {}", inserted);
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Rate: {:.0} events/sec", rate);

    pool.close().await;
    Ok(())
}

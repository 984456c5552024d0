//! Database module
//!
//! Connection pool setup and schema checks.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;
use crate::schema::COLLECTIONS;
use crate::store::{AnalyticsStore, StoreError};

/// Open a connection pool and verify the server answers
pub async fn connect(config: &Config) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    verify_connection(&pool).await?;
    Ok(pool)
}

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check that every collection exists, logging the first one that does not
pub async fn check_schema<S: AnalyticsStore>(store: &S) -> Result<bool, StoreError> {
    for spec in COLLECTIONS.iter() {
        if !store.collection_exists(spec.name).await? {
            tracing::error!("Required collection '{}' does not exist. Please run bootstrap.", spec.name);
            return Ok(false);
        }
    }

    Ok(true)
}

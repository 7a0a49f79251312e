mod db;
mod errors;

pub mod affiliates;
pub mod catalog;
pub mod loyalty;
pub mod offers;
pub mod orders;
pub mod payments;
pub mod settlement;

use std::env;

pub use db::SqliteDatabase;
pub use errors::SqliteDatabaseError;
use log::info;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::config::DEFAULT_DATABASE_URL;

pub fn db_url() -> String {
    let result = env::var("LDY_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ LDY_DATABASE_URL is not set. Using the default.");
        DEFAULT_DATABASE_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

/// Applies every pending schema migration.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteDatabaseError> {
    sqlx::migrate!("./src/db/sqlite/migrations").run(pool).await?;
    info!("🗃️ Database migrations are up to date");
    Ok(())
}

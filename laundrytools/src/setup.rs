use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use laundry_engine::{config::EngineConfig, run_migrations, SqliteDatabase};
use sqlx::{
    migrate::{MigrateDatabase, Migrator},
    Sqlite,
};

/// Setup commands work directly on the database named by `LDY_DATABASE_URL`.
#[derive(Debug, Subcommand)]
pub enum SetupCommand {
    /// Create the database if needed and run the schema migrations.
    Migrate(MigrateParams),
}

#[derive(Debug, Args)]
pub struct MigrateParams {
    /// The migrations are embedded in the binary. If a path is given, the migrations at <path> are run instead.
    #[arg(short, long)]
    pub path: Option<String>,
}

pub async fn handle_setup_command(command: SetupCommand) -> Result<()> {
    match command {
        SetupCommand::Migrate(params) => migrate_db(params).await,
    }
}

async fn migrate_db(params: MigrateParams) -> Result<()> {
    let url = EngineConfig::from_env_or_default().database_url;
    if !Sqlite::database_exists(&url).await? {
        println!("Creating new database at: {url}");
        Sqlite::create_database(&url).await?;
    }
    let db = SqliteDatabase::new_with_url(&url, 1).await?;
    match &params.path {
        Some(path) => {
            println!("Running migrations at: {path}");
            let migrator = Migrator::new(Path::new(path)).await?;
            migrator.run(db.pool()).await?;
        },
        None => {
            println!("Running embedded migrations");
            run_migrations(db.pool()).await?;
        },
    }
    println!("Migrations complete");
    Ok(())
}

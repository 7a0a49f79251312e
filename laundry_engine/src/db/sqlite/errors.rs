use thiserror::Error;

use crate::lse_api::errors::EngineError;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
    /// A business rule refused the operation part-way through a transaction
    #[error("{0}")]
    Rejected(#[from] EngineError),
}

impl SqliteDatabaseError {
    pub fn is_unique_violation(&self) -> bool {
        match self {
            SqliteDatabaseError::DriverError(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

impl From<SqliteDatabaseError> for EngineError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::Rejected(e) => e,
            e => EngineError::DatabaseError(e.to_string()),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        SqliteDatabaseError::from(e).into()
    }
}

use thiserror::Error;

use crate::SettlementStoreError;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

impl From<SqliteDatabaseError> for SettlementStoreError {
    fn from(e: SqliteDatabaseError) -> Self {
        SettlementStoreError::DatabaseError(e.to_string())
    }
}

impl From<sqlx::Error> for SettlementStoreError {
    fn from(e: sqlx::Error) -> Self {
        SettlementStoreError::DatabaseError(e.to_string())
    }
}

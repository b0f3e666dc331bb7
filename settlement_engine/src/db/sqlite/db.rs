use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};

use super::{db_url, new_pool, settlements, SqliteDatabaseError};
use crate::{
    db::traits::{SettlementManagement, SettlementStoreError, SettlementUpdate},
    db_types::{Amount, Settlement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SettlementManagement for SqliteDatabase {
    async fn insert_settlement(&self, amount: Amount) -> Result<Settlement, SettlementStoreError> {
        let mut conn = self.pool.acquire().await?;
        let settlement = settlements::insert_settlement(amount, &mut conn).await?;
        debug!("🗃️ Settlement #{} has been saved in the DB with amount {amount}", settlement.id);
        Ok(settlement)
    }

    async fn fetch_settlement(&self, id: i64) -> Result<Option<Settlement>, SettlementStoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settlements::fetch_settlement(id, &mut conn).await?)
    }

    async fn fetch_settlements(&self) -> Result<Vec<Settlement>, SettlementStoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settlements::fetch_settlements(&mut conn).await?)
    }

    async fn update_settlement(
        &self,
        id: i64,
        expected_revision: i64,
        update: SettlementUpdate,
    ) -> Result<Option<Settlement>, SettlementStoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settlements::update_settlement(id, expected_revision, update, &mut conn).await?)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `STL_DATABASE_URL`
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Creates the database if it does not exist yet, connects to it and brings the schema up to date.
    pub async fn create_and_migrate(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        if !Sqlite::database_exists(url).await? {
            info!("🗃️ Database {url} does not exist. Creating it now.");
            Sqlite::create_database(url).await?;
        }
        let db = Self::new_with_url(url, max_connections).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Runs any outstanding schema migrations.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        debug!("🗃️ Database migrations complete");
        Ok(())
    }

    /// The URL of the database
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

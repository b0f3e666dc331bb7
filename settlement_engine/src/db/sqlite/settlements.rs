use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::{sqlite::SqliteDatabaseError, traits::SettlementUpdate},
    db_types::{Amount, Settlement, SettlementStatus},
};

const SETTLEMENT_COLUMNS: &str =
    "id, amount, status, counter_offered, last_responded_at, revision, created_at, updated_at";

/// Inserts a new settlement into the database using the given connection and returns the stored record.
pub async fn insert_settlement(amount: Amount, conn: &mut SqliteConnection) -> Result<Settlement, SqliteDatabaseError> {
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO settlements (amount, status, counter_offered, created_at, updated_at) VALUES ($1, $2, FALSE, $3, \
         $3) RETURNING {SETTLEMENT_COLUMNS}"
    );
    let settlement = sqlx::query_as::<_, Settlement>(&sql)
        .bind(amount)
        .bind(SettlementStatus::Pending)
        .bind(now)
        .fetch_one(conn)
        .await?;
    trace!("🗃️ Inserted {settlement}");
    Ok(settlement)
}

pub async fn fetch_settlement(id: i64, conn: &mut SqliteConnection) -> Result<Option<Settlement>, SqliteDatabaseError> {
    let sql = format!("SELECT {SETTLEMENT_COLUMNS} FROM settlements WHERE id = $1");
    let settlement = sqlx::query_as::<_, Settlement>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(settlement)
}

/// Fetches every settlement, ordered by id.
pub async fn fetch_settlements(conn: &mut SqliteConnection) -> Result<Vec<Settlement>, SqliteDatabaseError> {
    let sql = format!("SELECT {SETTLEMENT_COLUMNS} FROM settlements ORDER BY id ASC");
    let settlements = sqlx::query_as::<_, Settlement>(&sql).fetch_all(conn).await?;
    trace!("🗃️ Fetched {} settlements", settlements.len());
    Ok(settlements)
}

/// Overwrites the mutable fields of the settlement, provided it is still at `expected_revision`. Nothing is written
/// otherwise, and `None` is returned.
pub async fn update_settlement(
    id: i64,
    expected_revision: i64,
    update: SettlementUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Settlement>, SqliteDatabaseError> {
    let sql = format!(
        "UPDATE settlements SET amount = $1, status = $2, counter_offered = $3, last_responded_at = $4, revision = \
         revision + 1, updated_at = $5 WHERE id = $6 AND revision = $7 RETURNING {SETTLEMENT_COLUMNS}"
    );
    let settlement = sqlx::query_as::<_, Settlement>(&sql)
        .bind(update.amount)
        .bind(update.status)
        .bind(update.counter_offered)
        .bind(update.last_responded_at)
        .bind(Utc::now())
        .bind(id)
        .bind(expected_revision)
        .fetch_optional(conn)
        .await?;
    match &settlement {
        Some(s) => trace!("🗃️ Settlement #{id} updated to revision {}", s.revision),
        None => trace!("🗃️ Settlement #{id} is no longer at revision {expected_revision}. Nothing written."),
    }
    Ok(settlement)
}

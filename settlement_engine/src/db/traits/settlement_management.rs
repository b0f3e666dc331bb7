use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{Amount, Settlement, SettlementStatus};

#[derive(Debug, Clone, Error)]
pub enum SettlementStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// The mutable fields of a settlement. Every write replaces all of them at once.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementUpdate {
    pub amount: Amount,
    pub status: SettlementStatus,
    pub counter_offered: bool,
    pub last_responded_at: Option<DateTime<Utc>>,
}

/// The `SettlementManagement` trait defines the behaviour for storing and updating settlements in the database
/// backend.
#[allow(async_fn_in_trait)]
pub trait SettlementManagement {
    /// Stores a new settlement with the given amount. The settlement starts out `pending`, without a counter-offer and
    /// without a response timestamp.
    async fn insert_settlement(&self, amount: Amount) -> Result<Settlement, SettlementStoreError>;

    /// Fetches the settlement with the given id. If it does not exist, `None` is returned.
    async fn fetch_settlement(&self, id: i64) -> Result<Option<Settlement>, SettlementStoreError>;

    /// Fetches all settlements, in ascending id order.
    async fn fetch_settlements(&self) -> Result<Vec<Settlement>, SettlementStoreError>;

    /// Writes `update` to the settlement with the given id, but only if its revision is still `expected_revision`.
    /// The revision is incremented as part of the write.
    ///
    /// Returns the updated settlement, or `None` if the settlement does not exist or was modified since
    /// `expected_revision` was read.
    async fn update_settlement(
        &self,
        id: i64,
        expected_revision: i64,
        update: SettlementUpdate,
    ) -> Result<Option<Settlement>, SettlementStoreError>;
}

use thiserror::Error;

use crate::{db_types::AmountConversionError, helpers::LastSeenParseError, SettlementStoreError};

#[derive(Debug, Clone, Error)]
pub enum NegotiationError {
    #[error("Settlement #{0} does not exist")]
    NotFound(i64),
    #[error("Settlement #{0} has already been agreed upon and cannot be modified")]
    AlreadyAgreed(i64),
    #[error(
        "Settlement #{id} has received new responses since you last fetched it. Please refresh to see the new status."
    )]
    StaleRevision { id: i64 },
    #[error("Settlement #{0} is being modified by too many concurrent requests. Please try again.")]
    Contention(i64),
    #[error("Invalid request. {0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Store(#[from] SettlementStoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    InvalidAmount(#[from] AmountConversionError),
    #[error("{0}")]
    InvalidTimestamp(#[from] LastSeenParseError),
    #[error("A counter-offer must include a new amount")]
    MissingCounterOffer,
}

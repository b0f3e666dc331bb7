//! Request objects and state transition rules for settlements.
//!
//! | From \ Request | Accept   | Counter-offer | Revise                     |
//! |----------------|----------|---------------|----------------------------|
//! | Pending        | Agreed   | Disputed      | Pending (unless stale)     |
//! | Disputed       | Agreed   | Disputed      | Pending (unless stale)     |
//! | Agreed         | Err      | Err           | Err                        |
//!
//! Responses always stamp `last_responded_at`. Revisions never touch it, but are rejected if a response was recorded
//! after the caller's `last_seen`.
use chrono::{DateTime, Utc};

use crate::{
    db::traits::SettlementUpdate,
    db_types::{Amount, Settlement, SettlementStatus},
    helpers::LastSeen,
    NegotiationError,
    ValidationError,
};

/// The counterparty's answer to the amount currently on the table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettlementResponse {
    Accept,
    CounterOffer(Amount),
}

impl SettlementResponse {
    /// Builds a response from its wire representation. A counter-offer must carry a new amount; the amount is ignored
    /// when accepting.
    pub fn new(accepted: bool, new_amount: Option<f64>) -> Result<Self, ValidationError> {
        if accepted {
            return Ok(Self::Accept);
        }
        let amount = new_amount.ok_or(ValidationError::MissingCounterOffer)?;
        Ok(Self::CounterOffer(Amount::try_from(amount)?))
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept)
    }

    /// Calculates the new state of `settlement` after this response is recorded at `now`.
    pub fn apply_to(&self, settlement: &Settlement, now: DateTime<Utc>) -> Result<SettlementUpdate, NegotiationError> {
        if settlement.is_agreed() {
            return Err(NegotiationError::AlreadyAgreed(settlement.id));
        }
        // Clocks can step backwards. The response timestamp must not.
        let responded_at = settlement.last_responded_at.map_or(now, |previous| previous.max(now));
        let update = match self {
            Self::Accept => SettlementUpdate {
                amount: settlement.amount,
                status: SettlementStatus::Agreed,
                counter_offered: false,
                last_responded_at: Some(responded_at),
            },
            Self::CounterOffer(amount) => SettlementUpdate {
                amount: *amount,
                status: SettlementStatus::Disputed,
                counter_offered: true,
                last_responded_at: Some(responded_at),
            },
        };
        Ok(update)
    }
}

/// A change to the amount on the table, made by the party that proposed it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmountRevision {
    pub amount: Amount,
    /// When the caller last read the settlement.
    pub last_seen: LastSeen,
}

impl AmountRevision {
    pub fn new(amount: Amount, last_seen: LastSeen) -> Self {
        Self { amount, last_seen }
    }

    /// Builds a revision from its wire representation.
    pub fn from_wire(amount: f64, last_seen: &str) -> Result<Self, ValidationError> {
        let last_seen = last_seen.parse::<LastSeen>()?;
        let amount = Amount::try_from(amount)?;
        Ok(Self { amount, last_seen })
    }

    /// Calculates the new state of `settlement` after this revision.
    pub fn apply_to(&self, settlement: &Settlement) -> Result<SettlementUpdate, NegotiationError> {
        if settlement.is_agreed() {
            return Err(NegotiationError::AlreadyAgreed(settlement.id));
        }
        if self.last_seen.is_stale_against(settlement.last_responded_at) {
            return Err(NegotiationError::StaleRevision { id: settlement.id });
        }
        Ok(SettlementUpdate {
            amount: self.amount,
            status: SettlementStatus::Pending,
            counter_offered: false,
            last_responded_at: settlement.last_responded_at,
        })
    }
}

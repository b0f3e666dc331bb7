use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------       Amount        ---------------------------------------------------------
/// A signed monetary value. Amounts are kept at full `f64` precision, exactly as they arrive on the wire.
///
/// On the wire, amounts are plain JSON numbers (e.g. `80`, `80.5` or `33.333`).
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "f64", into = "f64")]
pub struct Amount(f64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented as a settlement amount: {0}")]
pub struct AmountConversionError(String);

impl Amount {
    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0.0
    }
}

impl From<i64> for Amount {
    /// Converts a whole number of currency units into an amount.
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self(value as f64)
    }
}

impl TryFrom<f64> for Amount {
    type Error = AmountConversionError;

    /// Every finite number is a valid amount. NaN and the infinities are not.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(AmountConversionError(format!("{value} is not a finite number")));
        }
        Ok(Self(value))
    }
}

impl From<Amount> for f64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   SettlementStatus    -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    /// An offer is on the table and awaits a response.
    Pending,
    /// The last offer was accepted. This is a terminal state.
    Agreed,
    /// The last offer was rejected with a counter-offer.
    Disputed,
}

impl Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementStatus::Pending => write!(f, "pending"),
            SettlementStatus::Agreed => write!(f, "agreed"),
            SettlementStatus::Disputed => write!(f, "disputed"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid settlement status: {0}")]
pub struct SettlementStatusParseError(String);

impl FromStr for SettlementStatus {
    type Err = SettlementStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "agreed" => Ok(Self::Agreed),
            "disputed" => Ok(Self::Disputed),
            s => Err(SettlementStatusParseError(s.to_string())),
        }
    }
}

//--------------------------------------      Settlement       -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Settlement {
    pub id: i64,
    pub amount: Amount,
    pub status: SettlementStatus,
    /// True iff the most recent response was a counter-offer.
    pub counter_offered: bool,
    /// The time the last response (acceptance or counter-offer) was recorded.
    pub last_responded_at: Option<DateTime<Utc>>,
    /// Bumped on every write. Used for compare-and-swap updates.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Settlement {
    pub fn is_agreed(&self) -> bool {
        self.status == SettlementStatus::Agreed
    }

    pub fn snapshot(&self) -> SettlementSnapshot {
        SettlementSnapshot {
            id: self.id,
            amount: self.amount,
            status: self.status,
            counter_offered: self.counter_offered,
        }
    }

    pub fn summary(&self) -> SettlementSummary {
        SettlementSummary { id: self.id, amount: self.amount, status: self.status }
    }
}

impl Display for Settlement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Settlement #{} [{}] {}", self.id, self.status, self.amount)?;
        if self.counter_offered {
            write!(f, " (counter-offer)")?;
        }
        Ok(())
    }
}

/// The full public view of a settlement, as returned by queries and responses and broadcast on the general channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SettlementSnapshot {
    pub id: i64,
    pub amount: Amount,
    pub status: SettlementStatus,
    pub counter_offered: bool,
}

/// The short public view of a settlement, as returned on creation and revision and pushed on per-settlement channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub id: i64,
    pub amount: Amount,
    pub status: SettlementStatus,
}

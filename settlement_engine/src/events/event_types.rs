use std::fmt::Display;

use serde::Serialize;

use crate::db_types::{Settlement, SettlementSnapshot, SettlementSummary};

/// The two kinds of notification streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Every acceptance and counter-offer, across all settlements.
    General,
    /// Revisions of a single settlement.
    Settlement(i64),
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::General => write!(f, "general"),
            Channel::Settlement(id) => write!(f, "settlement #{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettlementEvent {
    /// A settlement was accepted or countered.
    Responded(SettlementSnapshot),
    /// A settlement's amount was revised outside a response.
    Revised(SettlementSummary),
}

impl SettlementEvent {
    pub fn responded(settlement: &Settlement) -> Self {
        Self::Responded(settlement.snapshot())
    }

    pub fn revised(settlement: &Settlement) -> Self {
        Self::Revised(settlement.summary())
    }

    pub fn channel(&self) -> Channel {
        match self {
            Self::Responded(_) => Channel::General,
            Self::Revised(summary) => Channel::Settlement(summary.id),
        }
    }

    /// The JSON text pushed to subscribers. Only the snapshot itself is sent, without any event envelope.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for SettlementEvent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Responded(snapshot) => snapshot.serialize(serializer),
            Self::Revised(summary) => summary.serialize(serializer),
        }
    }
}

use serde::{Deserialize, Serialize};

/// Body of a request to open a new negotiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSettlementParams {
    pub amount: f64,
}

/// Body of a response to the amount on the table. `new_amount` is required when `accepted` is false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondParams {
    pub accepted: bool,
    #[serde(default)]
    pub new_amount: Option<f64>,
}

/// Body of a request to revise the amount on the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSettlementParams {
    pub amount: f64,
    /// When the caller last fetched the settlement, e.g. `2024-06-01T12:30:00.123Z`.
    pub last_seen: String,
}

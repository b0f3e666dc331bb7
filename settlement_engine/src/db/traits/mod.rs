//! #  Database management and control.
//!
//! This module defines the interface contracts of the settlement engine database *backends*.
//!
//! * [`SettlementManagement`] defines the behaviour for storing, querying and updating settlements. All writes after
//!   creation are compare-and-swap operations keyed on the settlement's `revision`, so that the API layer can
//!   serialize concurrent mutations of the same settlement without holding locks of its own.
mod settlement_management;

pub use settlement_management::{SettlementManagement, SettlementStoreError, SettlementUpdate};

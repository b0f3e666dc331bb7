//! Settlement Engine
//!
//! The settlement engine lets two parties negotiate a settlement amount through alternating offers. This library
//! contains the core logic of the negotiation service and is transport-agnostic.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should never need to access
//!    the database directly; use the public API instead. The data types stored in the database live in the
//!    [`db_types`] module and are public.
//! 2. Notifications ([`events`]). The [`NotificationHub`] keeps track of connected subscribers, both general
//!    observers and observers of a single settlement, and fans committed snapshots out to them.
//! 3. The public API ([`NegotiationApi`]). Proposing, responding to, revising and querying settlements. Backends must
//!    implement [`SettlementManagement`] to be used by the API.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
mod se_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{SettlementManagement, SettlementStoreError, SettlementUpdate};
pub use events::NotificationHub;
pub use se_api::{
    errors::{NegotiationError, ValidationError},
    negotiation_api::NegotiationApi,
    negotiation_objects,
};

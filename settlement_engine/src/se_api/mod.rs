//! # Settlement engine public API
//!
//! The `se_api` module exposes the programmatic API for the settlement engine.
//!
//! * [`negotiation_api`] is the primary API for proposing, responding to and revising settlements. It persists every
//!   change through a [`crate::SettlementManagement`] backend and notifies subscribers via the
//!   [`crate::NotificationHub`].
//! * [`negotiation_objects`] holds the request types and the rules for moving a settlement from one state to the next.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend and a notification hub:
//!
//! ```rust,ignore
//! use settlement_engine::{db_types::Amount, NegotiationApi, NotificationHub, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = NegotiationApi::new(db, NotificationHub::default());
//! let settlement = api.propose(Amount::from(100)).await?;
//! ```
pub mod errors;
pub mod negotiation_api;
pub mod negotiation_objects;

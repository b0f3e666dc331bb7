//! # Settlement server
//! This crate hosts the HTTP and WebSocket front end of the settlement negotiation service. It is responsible for:
//! Decoding requests and handing them to the [`settlement_engine::NegotiationApi`].
//! Translating engine errors into HTTP status codes.
//! Streaming committed settlement changes to WebSocket subscribers.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /settlements`: Propose a new settlement.
//! * `GET /settlements`: List every settlement.
//! * `GET /settlements/{id}`: Fetch a single settlement.
//! * `POST /settlements/{id}/respond`: Accept or counter the amount on the table.
//! * `PUT /settlements/{id}`: Revise the amount on the table.
//! * `GET /ws/general`: WebSocket feed of every response.
//! * `GET /ws/{id}`: WebSocket feed of revisions to settlement `id`.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;
pub mod ws;

//! Domain core for the rights issue submission and review backend.
//!
//! Shareholders respond to a corporate rights issue through the public
//! submission surface; administrators review the resulting records through
//! the guarded reporting surface. This crate owns the entity model, the
//! store contracts, the filter/sort/pagination semantics shared by every
//! store implementation, CSV/JSON export, notification dispatch, and the
//! admin auth gate. Transport wiring and the concrete Postgres and Mailgun
//! adapters live in the `erights-api` service crate.

pub mod auth;
pub mod config;
pub mod error;
pub mod notify;
pub mod registry;
pub mod router;
pub mod submissions;
pub mod telemetry;

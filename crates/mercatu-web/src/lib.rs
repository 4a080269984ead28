//! mercatu-web — HTTP API server for the Mercatu services marketplace.
//!
//! Exposes the REST + SSE surface consumed by the web client: auth and
//! profiles, the professional directory, service requests with their
//! proposals, and two-party chat.

pub mod auth;
pub mod config;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod sse;
pub mod state;

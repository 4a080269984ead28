//! mercatu-common — Shared domain types, lifecycle rules, and errors used across all Mercatu crates.

pub mod chat;
pub mod error;
pub mod geo;
pub mod lifecycle;
pub mod requests;
pub mod users;

// Re-export the types almost every caller needs
pub use error::ApiError;
pub use lifecycle::{ProposalDecision, ProposalStatus, RequestStatus};

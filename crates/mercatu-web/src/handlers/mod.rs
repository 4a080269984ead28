//! HTTP handlers for all API routes.

pub mod auth;
pub mod chat;
pub mod health;
pub mod professionals;
pub mod proposals;
pub mod requests;

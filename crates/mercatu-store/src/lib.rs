//! mercatu-store — In-memory persistence for accounts, requests, and chat.
//!
//! Everything lives in process memory behind per-collection locks, so a
//! restart starts clean. Proposals are embedded in their request and every
//! proposal decision runs inside the requests write guard, which is what
//! keeps "at most one accepted proposal" true under concurrent accepts.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mercatu_store::{Store, UserRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(Store::new());
//!     let users = UserRepository::new(store.clone());
//!     let account = users
//!         .create(mercatu_common::users::User::new_client("Ana", "ana@example.com"), "secret")
//!         .await?;
//!     println!("created {}", account.id);
//!     Ok(())
//! }
//! ```

pub mod conversations;
pub mod error;
pub mod requests;
pub mod seed;
pub mod sessions;
pub mod store;
pub mod users;

pub use conversations::ConversationRepository;
pub use error::{Result, StoreError};
pub use requests::{RequestPatch, RequestRepository};
pub use seed::{demo_seed, DemoData};
pub use sessions::{Session, SessionRepository};
pub use store::{Store, StoreStats};
pub use users::{ProfilePatch, UserRepository};

//! The shared in-memory store and its collections.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use mercatu_common::chat::{ChatMessage, Conversation};
use mercatu_common::requests::ServiceRequest;
use mercatu_common::users::User;

use crate::sessions::Session;

/// Main store handle. One lock per collection; repositories never hold two
/// write guards at once except in chat, where the order is always
/// conversations before messages.
pub struct Store {
    pub(crate) users: RwLock<HashMap<Uuid, User>>,
    pub(crate) sessions: RwLock<HashMap<String, Session>>,
    pub(crate) requests: RwLock<HashMap<Uuid, ServiceRequest>>,
    pub(crate) conversations: RwLock<HashMap<Uuid, Conversation>>,
    pub(crate) messages: RwLock<Vec<ChatMessage>>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            requests: RwLock::new(HashMap::new()),
            conversations: RwLock::new(HashMap::new()),
            messages: RwLock::new(Vec::new()),
        }
    }

    /// Row counts for the health endpoint.
    pub async fn stats(&self) -> StoreStats {
        let users = self.users.read().await.len() as u64;
        let requests_guard = self.requests.read().await;
        let requests = requests_guard.len() as u64;
        let proposals = requests_guard.values().map(|r| r.proposals.len() as u64).sum();
        drop(requests_guard);
        let conversations = self.conversations.read().await.len() as u64;
        let messages = self.messages.read().await.len() as u64;

        StoreStats { users, requests, proposals, conversations, messages }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// Store statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub users: u64,
    pub requests: u64,
    pub proposals: u64,
    pub conversations: u64,
    pub messages: u64,
}

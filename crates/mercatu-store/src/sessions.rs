//! Session tokens.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use uuid::Uuid;

use crate::store::Store;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Repository for login sessions. Expiry is enforced lazily at lookup.
#[derive(Clone)]
pub struct SessionRepository {
    store: Arc<Store>,
}

impl SessionRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Open a session for `user_id`, valid for `ttl_days`.
    pub async fn create(&self, user_id: Uuid, ttl_days: i64) -> Session {
        let now = Utc::now();
        let session = Session {
            token: new_token(),
            user_id,
            created_at: now,
            expires_at: now + Duration::days(ttl_days),
        };
        self.store
            .sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        session
    }

    /// Resolve a token to its user, removing the session when it has
    /// expired.
    pub async fn resolve(&self, token: &str) -> Option<Uuid> {
        let mut sessions = self.store.sessions.write().await;
        match sessions.get(token) {
            Some(session) if session.expires_at > Utc::now() => Some(session.user_id),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    /// Drop a session. Returns whether it existed.
    pub async fn revoke(&self, token: &str) -> bool {
        self.store.sessions.write().await.remove(token).is_some()
    }
}

fn new_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

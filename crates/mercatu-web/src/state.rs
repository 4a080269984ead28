//! Shared application state for the API server.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use mercatu_store::Store;

use crate::config::Config;

/// Events pushed to connected clients over the SSE stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A client posted a new service request
    RequestPosted {
        request_id: Uuid,
        category: String,
        title: String,
    },
    /// A professional sent a proposal on a request
    ProposalReceived {
        request_id: Uuid,
        proposal_id: Uuid,
        professional_name: String,
        price: f64,
    },
    /// The request owner accepted or rejected a proposal
    ProposalDecided {
        request_id: Uuid,
        proposal_id: Uuid,
        status: String,
    },
    /// A request moved to a new lifecycle status
    RequestStatusChanged { request_id: Uuid, status: String },
    /// A chat message was delivered to a conversation
    MessageSent {
        conversation_id: Uuid,
        message_id: Uuid,
        sender_id: Uuid,
    },
}

/// State injected into every handler.
pub struct AppState {
    pub store: Arc<Store>,
    pub config: Config,
    pub started_at: Instant,
    /// Broadcast channel feeding /api/events subscribers
    pub event_tx: broadcast::Sender<AppEvent>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            store: Arc::new(Store::new()),
            config,
            started_at: Instant::now(),
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Fire an event at whoever is listening. Dropped when nobody is.
    pub fn publish(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }
}

pub type SharedState = Arc<AppState>;

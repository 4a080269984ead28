//! Axum router — maps URL paths to handlers.

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, chat, health, professionals, proposals, requests};
use crate::sse::sse_handler;
use crate::state::{AppState, SharedState};

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        // Health
        .route("/api/ping", get(health::ping))
        .route("/api/health", get(health::health))
        // SSE streaming
        .route("/api/events", get(sse_handler))
        // Auth and profile
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/login-phone", post(auth::login_phone))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/profile", put(auth::update_profile))
        // Professional directory
        .route("/api/professionals", get(professionals::list_professionals))
        .route(
            "/api/professionals/{id}",
            get(professionals::professional_detail),
        )
        // Service requests
        .route(
            "/api/requests",
            get(requests::list_requests).post(requests::create_request),
        )
        .route("/api/requests/nearby", get(requests::nearby_requests))
        .route(
            "/api/requests/{id}",
            get(requests::request_detail)
                .put(requests::update_request)
                .delete(requests::cancel_request),
        )
        // Proposals
        .route(
            "/api/requests/{id}/proposals",
            post(proposals::submit_proposal),
        )
        .route(
            "/api/requests/{id}/proposals/{proposal_id}",
            put(proposals::decide_proposal),
        )
        // Chat
        .route(
            "/api/conversations",
            get(chat::list_conversations).post(chat::open_conversation),
        )
        .route("/api/conversations/{id}", get(chat::conversation_detail))
        .route(
            "/api/conversations/{id}/messages",
            get(chat::list_messages).post(chat::send_message),
        )
        .route(
            "/api/conversations/{id}/messages/{message_id}",
            put(chat::update_message).delete(chat::delete_message),
        )
        .route("/api/conversations/{id}/read", put(chat::mark_read))
        // Unknown routes answer JSON like everything else
        .fallback(health::not_found)
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

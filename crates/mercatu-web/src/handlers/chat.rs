//! Two-party chat between clients and professionals.

use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use mercatu_common::chat::{Attachment, ChatMessage, Conversation, DeliveryStatus, MessageKind};
use mercatu_common::users::Role;
use mercatu_common::ApiError;
use mercatu_store::{ConversationRepository, RequestRepository, UserRepository};

use crate::auth::CurrentUser;
use crate::extract::{Json, Path, Query};
use crate::state::{AppEvent, SharedState};

// === API Types ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenConversation {
    pub participant_id: Uuid,
    /// Ties the thread to a request so the same pair can discuss several jobs.
    pub request_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_avatar: String,
    #[serde(rename = "userType")]
    pub user_role: Role,
}

/// A conversation as the client renders it: participants joined to their
/// account summaries, the latest message attached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: Uuid,
    pub participants: Vec<ParticipantView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_title: Option<String>,
    pub unread_count: HashMap<Uuid, u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationView>,
    pub total: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessagesFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesResponse {
    pub messages: Vec<ChatMessage>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMessage {
    /// Target delivery status; only forward moves are accepted.
    pub status: DeliveryStatus,
}

async fn conversation_view(
    state: &SharedState,
    conversation: Conversation,
    last_message: Option<ChatMessage>,
) -> ConversationView {
    let users = UserRepository::new(state.store.clone());
    let mut participants = Vec::with_capacity(conversation.participants.len());
    for id in &conversation.participants {
        if let Some(user) = users.find_by_id(*id).await {
            participants.push(ParticipantView {
                user_id: user.id,
                user_name: user.name,
                user_avatar: user.avatar,
                user_role: user.role,
            });
        }
    }

    ConversationView {
        id: conversation.id,
        participants,
        request_id: conversation.request_id,
        request_title: conversation.request_title,
        unread_count: conversation.unread_count,
        created_at: conversation.created_at,
        updated_at: conversation.updated_at,
        last_message,
    }
}

// === Handlers ===

/// GET /api/conversations - The caller's threads, most recent first.
pub async fn list_conversations(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ConversationRepository::new(state.store.clone());
    let rows = repo.list_for_user(user.id).await;

    let mut conversations = Vec::with_capacity(rows.len());
    for (conversation, last_message) in rows {
        conversations.push(conversation_view(&state, conversation, last_message).await);
    }
    let total = conversations.len();

    Ok(Json(ConversationsResponse {
        conversations,
        total,
    }))
}

/// POST /api/conversations - Open the thread with another user: 201 on
/// first contact, 200 when it already exists.
pub async fn open_conversation(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<OpenConversation>,
) -> Result<impl IntoResponse, ApiError> {
    let users = UserRepository::new(state.store.clone());
    users
        .find_by_id(payload.participant_id)
        .await
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let request_title = match payload.request_id {
        Some(request_id) => {
            let requests = RequestRepository::new(state.store.clone());
            let request = requests
                .find_by_id(request_id)
                .await
                .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;
            Some(request.title)
        }
        None => None,
    };

    let repo = ConversationRepository::new(state.store.clone());
    let (conversation, created) = repo
        .find_or_create(user.id, payload.participant_id, payload.request_id, request_title)
        .await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };

    Ok((status, Json(conversation_view(&state, conversation, None).await)))
}

/// GET /api/conversations/{id} - One thread, participants only.
pub async fn conversation_detail(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ConversationRepository::new(state.store.clone());
    let conversation = repo
        .find_for_user(user.id, id)
        .await
        .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))?;

    let last_message = repo.messages(user.id, id).await?.pop();

    Ok(Json(conversation_view(&state, conversation, last_message).await))
}

/// GET /api/conversations/{id}/messages - Thread history, oldest first.
pub async fn list_messages(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Query(filter): Query<MessagesFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = filter
        .limit
        .unwrap_or(50)
        .clamp(1, state.config.api.max_page_size) as usize;
    let page = filter.page.unwrap_or(1).max(1) as usize;

    let repo = ConversationRepository::new(state.store.clone());
    let all = repo.messages(user.id, id).await?;

    let total = all.len();
    let total_pages = total.div_ceil(limit).max(1);
    let messages: Vec<ChatMessage> = all
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();

    Ok(Json(MessagesResponse {
        messages,
        total,
        page,
        total_pages,
    }))
}

/// POST /api/conversations/{id}/messages - Send a message.
pub async fn send_message(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessage>,
) -> Result<impl IntoResponse, ApiError> {
    let content = payload.content.trim();
    if content.is_empty() && payload.attachments.is_empty() {
        return Err(ApiError::Validation(
            "message needs content or an attachment".to_string(),
        ));
    }

    let mut message = ChatMessage::new(id, user.id, content);
    message.kind = payload.kind;
    message.attachments = payload.attachments;

    let repo = ConversationRepository::new(state.store.clone());
    let message = repo.send_message(message).await?;

    state.publish(AppEvent::MessageSent {
        conversation_id: id,
        message_id: message.id,
        sender_id: user.id,
    });

    Ok((StatusCode::CREATED, Json(message)))
}

/// PUT /api/conversations/{id}/messages/{message_id} - Advance delivery
/// status. Moving backwards (read -> delivered) answers 409.
pub async fn update_message(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path((id, message_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateMessage>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ConversationRepository::new(state.store.clone());
    let message = repo
        .advance_delivery(user.id, id, message_id, payload.status)
        .await?;

    Ok(Json(message))
}

/// DELETE /api/conversations/{id}/messages/{message_id} - Remove one of the
/// caller's own messages.
pub async fn delete_message(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path((id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ConversationRepository::new(state.store.clone());
    repo.delete_message(user.id, id, message_id).await?;

    Ok(Json(json!({ "message": "message deleted" })))
}

/// PUT /api/conversations/{id}/read - Clear the caller's unread counter and
/// mark the counterpart's messages as read.
pub async fn mark_read(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ConversationRepository::new(state.store.clone());
    let conversation = repo.mark_read(user.id, id).await?;
    let last_message = repo.messages(user.id, id).await?.pop();

    Ok(Json(conversation_view(&state, conversation, last_message).await))
}

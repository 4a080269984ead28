//! Conversation and message repository.
//!
//! Whenever both collections are touched the lock order is conversations
//! first, then messages.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use mercatu_common::chat::{ChatMessage, Conversation, DeliveryStatus};

use crate::error::{Result, StoreError};
use crate::store::Store;

/// Repository for two-party threads and their messages.
#[derive(Clone)]
pub struct ConversationRepository {
    store: Arc<Store>,
}

impl ConversationRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// The thread between two users about a request, creating it on first
    /// contact. Threads are per request, so the same pair can talk about
    /// two different jobs in two threads. The flag reports whether the
    /// thread is new.
    pub async fn find_or_create(
        &self,
        user_id: Uuid,
        other_id: Uuid,
        request_id: Option<Uuid>,
        request_title: Option<String>,
    ) -> Result<(Conversation, bool)> {
        if user_id == other_id {
            return Err(StoreError::Conflict(
                "you cannot start a conversation with yourself".into(),
            ));
        }

        let mut conversations = self.store.conversations.write().await;
        if let Some(existing) = conversations
            .values()
            .find(|c| c.is_between(user_id, other_id) && c.request_id == request_id)
        {
            return Ok((existing.clone(), false));
        }

        let mut conversation = Conversation::new(user_id, other_id);
        conversation.request_id = request_id;
        conversation.request_title = request_title;
        conversations.insert(conversation.id, conversation.clone());
        Ok((conversation, true))
    }

    /// Threads involving `user_id` with their latest message, most
    /// recently active first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Vec<(Conversation, Option<ChatMessage>)> {
        let conversations = self.store.conversations.read().await;
        let messages = self.store.messages.read().await;

        let mut list: Vec<(Conversation, Option<ChatMessage>)> = conversations
            .values()
            .filter(|c| c.involves(user_id))
            .map(|c| {
                let last = messages.iter().rev().find(|m| m.conversation_id == c.id).cloned();
                (c.clone(), last)
            })
            .collect();
        list.sort_by(|a, b| b.0.updated_at.cmp(&a.0.updated_at));
        list
    }

    /// A single thread, visible only to its participants.
    pub async fn find_for_user(&self, user_id: Uuid, id: Uuid) -> Option<Conversation> {
        self.store
            .conversations
            .read()
            .await
            .get(&id)
            .filter(|c| c.involves(user_id))
            .cloned()
    }

    /// Messages in a thread, oldest first.
    pub async fn messages(&self, user_id: Uuid, conversation_id: Uuid) -> Result<Vec<ChatMessage>> {
        let conversations = self.store.conversations.read().await;
        conversations
            .get(&conversation_id)
            .filter(|c| c.involves(user_id))
            .ok_or_else(|| StoreError::NotFound("Conversation".into()))?;
        let messages = self.store.messages.read().await;

        Ok(messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    /// Append a message, bump the counterpart's unread count, and touch
    /// the thread.
    pub async fn send_message(&self, message: ChatMessage) -> Result<ChatMessage> {
        let mut conversations = self.store.conversations.write().await;
        let conversation = conversations
            .get_mut(&message.conversation_id)
            .filter(|c| c.involves(message.sender_id))
            .ok_or_else(|| StoreError::NotFound("Conversation".into()))?;

        if let Some(other) = conversation.counterpart(message.sender_id) {
            *conversation.unread_count.entry(other).or_insert(0) += 1;
        }
        conversation.updated_at = Utc::now();

        let mut messages = self.store.messages.write().await;
        messages.push(message.clone());
        Ok(message)
    }

    /// Advance one message's delivery status. Statuses only move forward.
    pub async fn advance_delivery(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        message_id: Uuid,
        next: DeliveryStatus,
    ) -> Result<ChatMessage> {
        let conversations = self.store.conversations.read().await;
        conversations
            .get(&conversation_id)
            .filter(|c| c.involves(user_id))
            .ok_or_else(|| StoreError::NotFound("Conversation".into()))?;

        let mut messages = self.store.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == message_id && m.conversation_id == conversation_id)
            .ok_or_else(|| StoreError::NotFound("Message".into()))?;

        if !message.status.can_advance_to(next) {
            return Err(StoreError::Conflict(format!(
                "message is already {}, it cannot move to {}",
                message.status, next
            )));
        }
        message.status = next;
        message.updated_at = Utc::now();
        Ok(message.clone())
    }

    /// Zero the caller's unread counter and mark the counterpart's
    /// messages read.
    pub async fn mark_read(&self, user_id: Uuid, conversation_id: Uuid) -> Result<Conversation> {
        let mut conversations = self.store.conversations.write().await;
        let conversation = conversations
            .get_mut(&conversation_id)
            .filter(|c| c.involves(user_id))
            .ok_or_else(|| StoreError::NotFound("Conversation".into()))?;

        conversation.unread_count.insert(user_id, 0);

        let mut messages = self.store.messages.write().await;
        for message in messages
            .iter_mut()
            .filter(|m| m.conversation_id == conversation_id && m.sender_id != user_id)
        {
            if message.status != DeliveryStatus::Read {
                message.status = DeliveryStatus::Read;
                message.updated_at = Utc::now();
            }
        }

        Ok(conversation.clone())
    }

    /// Remove a message. Only its sender may do so; everyone else sees a
    /// missing message.
    pub async fn delete_message(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        message_id: Uuid,
    ) -> Result<()> {
        let conversations = self.store.conversations.read().await;
        conversations
            .get(&conversation_id)
            .filter(|c| c.involves(user_id))
            .ok_or_else(|| StoreError::NotFound("Conversation".into()))?;

        let mut messages = self.store.messages.write().await;
        let index = messages
            .iter()
            .position(|m| {
                m.id == message_id && m.conversation_id == conversation_id && m.sender_id == user_id
            })
            .ok_or_else(|| StoreError::NotFound("Message".into()))?;
        messages.remove(index);
        Ok(())
    }
}

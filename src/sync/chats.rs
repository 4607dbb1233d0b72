use std::cmp::Ordering;

use serde::Serialize;

use crate::common::{Chat, ChatId, Message, ServerErrorResponse, UserId};
use crate::error::ApiError;
use crate::network::ApiClient;
use crate::state::ToastQueue;

use super::report_failure;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateChat {
    other_user_id: UserId,
}

/// Newest conversation first; chats without messages sink to the bottom
/// keeping their relative order.
fn by_recent_activity(a: &Chat, b: &Chat) -> Ordering {
    let a = a.last_message.as_ref().map(|message| message.created_at);
    let b = b.last_message.as_ref().map(|message| message.created_at);
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The signed-in user's conversations.
pub struct ChatDirectory {
    api: ApiClient,
    toasts: ToastQueue,
    chats: Vec<Chat>,
    is_loading: bool,
    error: Option<ServerErrorResponse>,
}

impl ChatDirectory {
    pub fn new(api: ApiClient, toasts: ToastQueue) -> Self {
        Self {
            api,
            toasts,
            chats: Vec::new(),
            is_loading: false,
            error: None,
        }
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&ServerErrorResponse> {
        self.error.as_ref()
    }

    pub fn chat(&self, chat_id: ChatId) -> Option<&Chat> {
        self.chats.iter().find(|chat| chat.id == chat_id)
    }

    pub fn unseen_count(&self) -> usize {
        self.chats
            .iter()
            .filter(|chat| !chat.session_user_seen_status)
            .count()
    }

    pub async fn fetch(&mut self) -> Result<(), ApiError> {
        self.is_loading = true;
        let result = self.api.get::<Vec<Chat>>("chats").await;
        self.is_loading = false;

        match result {
            Ok(mut chats) => {
                chats.sort_by(by_recent_activity);
                self.chats = chats;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                self.error = report_failure(
                    &self.toasts,
                    "fetching chats",
                    &err,
                    "Something went wrong, please try again later",
                );
                Err(err)
            }
        }
    }

    pub fn add_chat(&mut self, chat: Chat) {
        self.chats.retain(|existing| existing.id != chat.id);
        self.chats.insert(0, chat);
    }

    pub fn update_chat(&mut self, chat: Chat) -> bool {
        match self.chats.iter_mut().find(|existing| existing.id == chat.id) {
            Some(slot) => {
                *slot = chat;
                true
            }
            None => false,
        }
    }

    pub fn remove_chat(&mut self, chat_id: ChatId) -> Option<Chat> {
        let index = self.chats.iter().position(|chat| chat.id == chat_id)?;
        Some(self.chats.remove(index))
    }

    /// Folds a new message into its chat and moves that chat to the top.
    /// Returns false for chats not in the list.
    pub fn record_message(&mut self, message: &Message) -> bool {
        let Some(index) = self.chats.iter().position(|chat| chat.id == message.chat_id) else {
            return false;
        };

        let mut chat = self.chats.remove(index);
        let sent_by_me = message.sender.id == chat.session_user.id;
        chat.session_user_seen_status = sent_by_me;
        chat.other_user_seen_status = !sent_by_me;
        chat.updated_at = Some(message.created_at);
        chat.last_message = Some(message.clone());
        self.chats.insert(0, chat);
        true
    }

    pub fn mark_seen(&mut self, chat_id: ChatId) -> bool {
        match self.chats.iter_mut().find(|chat| chat.id == chat_id) {
            Some(chat) => {
                chat.session_user_seen_status = true;
                true
            }
            None => false,
        }
    }

    /// Chat with `other_user_id`, created on the server when none exists.
    pub async fn open_or_create(&mut self, other_user_id: UserId) -> Result<Chat, ApiError> {
        let found = self
            .api
            .get::<Chat>(&format!("chats/users/{other_user_id}"))
            .await;

        let result = match found {
            Err(err) if err.is_not_found() => {
                log::info!("No chat with user {other_user_id} yet, creating one");
                self.api
                    .post::<_, Chat>("chats/create", &CreateChat { other_user_id })
                    .await
            }
            other => other,
        };

        match result {
            Ok(chat) => {
                if !self.update_chat(chat.clone()) {
                    self.add_chat(chat.clone());
                }
                Ok(chat)
            }
            Err(err) => {
                self.error = report_failure(
                    &self.toasts,
                    "opening chat",
                    &err,
                    "Something went wrong, please try again later",
                );
                Err(err)
            }
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::page::Identified;
use super::timestamp;

pub type UserId = i64;
pub type ChatId = i64;
pub type MessageId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImage {
    pub id: i64,
    pub url: String,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Public profile as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub aws_cognito_id: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub inbox_locked: bool,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub residence_name: Option<String>,
    #[serde(default)]
    pub birthplace_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub profile_image: Option<ProfileImage>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    Video,
    Audio,
    File,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAsset {
    pub id: i64,
    pub message_id: MessageId,
    pub chat_id: ChatId,
    pub file_type: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One chat message. Immutable after creation apart from `read_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender: User,
    pub recipient: User,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_one_time: bool,
    #[serde(default)]
    pub is_session_user_sender: bool,
    #[serde(default)]
    pub chat_assets: Vec<ChatAsset>,
}

impl Identified for Message {
    type Key = MessageId;

    fn key(&self) -> MessageId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    pub session_user: User,
    pub other_user: User,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub session_user_seen_status: bool,
    #[serde(default)]
    pub other_user_seen_status: bool,
}

impl Identified for Chat {
    type Key = ChatId;

    fn key(&self) -> ChatId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAssetRequest {
    pub file_type: String,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    pub asset_url: String,
}

/// Message as composed by the user, before the chat adds `firstTime`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub recipient_id: UserId,
    pub message_type: MessageType,
    pub content: Option<String>,
    pub is_one_time: bool,
    pub chat_assets: Vec<ChatAssetRequest>,
}

impl NewMessage {
    pub fn text(recipient_id: UserId, content: impl Into<String>) -> Self {
        Self {
            recipient_id,
            message_type: MessageType::Text,
            content: Some(content.into()),
            is_one_time: false,
            chat_assets: Vec::new(),
        }
    }
}

/// Body of `POST chats/message`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessage {
    pub recipient_id: UserId,
    pub message_type: MessageType,
    pub content: Option<String>,
    pub is_one_time: bool,
    pub first_time: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chat_assets: Vec<ChatAssetRequest>,
}

impl CreateMessage {
    pub fn new(message: NewMessage, first_time: bool) -> Self {
        Self {
            recipient_id: message.recipient_id,
            message_type: message.message_type,
            content: message.content,
            is_one_time: message.is_one_time,
            first_time,
            chat_assets: message.chat_assets,
        }
    }
}

/// Field-level validation failure (422 responses only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub path: String,
    pub error: String,
}

/// Error envelope returned by the API on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerErrorResponse {
    pub status_code: u16,
    pub message: String,
    #[serde(default)]
    pub errors: Option<Vec<ValidationError>>,
}

//! Builders shared by unit tests.

use chrono::{DateTime, TimeZone, Utc};

use super::content::{Post, Recipe};
use super::types::{Chat, ChatId, Message, MessageId, MessageType, User, UserId};

pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_714_000_000 + seconds, 0).unwrap()
}

pub fn user(id: UserId) -> User {
    User {
        id,
        username: format!("user{id}"),
        birthday: None,
        aws_cognito_id: None,
        created_at: None,
        verified: false,
        is_private: false,
        inbox_locked: false,
        gender: None,
        residence_name: None,
        birthplace_name: None,
        bio: None,
        name: None,
        profile_image: None,
    }
}

/// Message `id` in `chat_id`, created `id` seconds after the epoch offset.
pub fn message(id: MessageId, chat_id: ChatId) -> Message {
    Message {
        id,
        chat_id,
        sender: user(1),
        recipient: user(2),
        message_type: MessageType::Text,
        content: Some(format!("message {id}")),
        created_at: at(id),
        read_at: None,
        is_one_time: false,
        is_session_user_sender: false,
        chat_assets: Vec::new(),
    }
}

pub fn chat(id: ChatId, last_message: Option<Message>) -> Chat {
    Chat {
        id,
        session_user: user(1),
        other_user: user(100 + id),
        created_at: Some(at(0)),
        updated_at: last_message.as_ref().map(|message| message.created_at),
        last_message,
        session_user_seen_status: true,
        other_user_seen_status: true,
    }
}

pub fn post(id: i64) -> Post {
    Post {
        id,
        user: user(1),
        content: format!("post {id}"),
        images: Vec::new(),
        reactions: Vec::new(),
        comments: Vec::new(),
        created_at: Some(at(id)),
        updated_at: None,
    }
}

pub fn recipe(id: i64) -> Recipe {
    Recipe {
        id,
        title: format!("recipe {id}"),
        content: serde_json::Value::Null,
        created_at: Some(at(id)),
        updated_at: None,
        category: None,
        preparation_time: 10,
        cooking_time: 20,
        servings: 2,
        difficulty: "EASY".to_string(),
        ingredients: vec!["tofu".to_string()],
        reactions: Vec::new(),
        images: Vec::new(),
        user: user(1),
        comments: Vec::new(),
    }
}

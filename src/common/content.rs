use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::page::Identified;
use super::timestamp;
use super::types::User;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: i64,
    #[serde(alias = "url")]
    pub image_url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReactionType {
    #[default]
    Like,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: i64,
    pub user: User,
    #[serde(default)]
    pub reaction_type: ReactionType,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub user: User,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub replies: Vec<Comment>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub user: User,
    pub content: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn is_liked_by(&self, user_id: i64) -> bool {
        self.reactions.iter().any(|reaction| reaction.user.id == user_id)
    }
}

impl Identified for Post {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub content: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeCategory {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    /// Rich-text document, opaque to the client.
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: Option<RecipeCategory>,
    #[serde(default)]
    pub preparation_time: u32,
    #[serde(default)]
    pub cooking_time: u32,
    #[serde(default)]
    pub servings: u32,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub user: User,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Identified for Recipe {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecipe {
    pub title: String,
    pub content: serde_json::Value,
    pub ingredients: Vec<String>,
    pub cooking_time: u32,
    pub preparation_time: u32,
    pub servings: u32,
    pub difficulty: String,
    pub category_id: i64,
    pub image_urls: Vec<String>,
}

/// Entry of the mixed home feed: `{"post": …}` or `{"recipe": …}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedItem {
    Post(Post),
    Recipe(Recipe),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKey {
    Post(i64),
    Recipe(i64),
}

impl Identified for FeedItem {
    type Key = FeedKey;

    fn key(&self) -> FeedKey {
        match self {
            FeedItem::Post(post) => FeedKey::Post(post.id),
            FeedItem::Recipe(recipe) => FeedKey::Recipe(recipe.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewFollower,
    NewReaction,
    NewComment,
    NewMessage,
    NewMatch,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user: User,
    pub notification_type: NotificationType,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Identified for Notification {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}

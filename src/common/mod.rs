pub mod commands;
pub mod content;
pub mod events;
pub mod geo;
pub mod page;
pub mod swipe;
pub mod timestamp;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use commands::ChatCommand;
pub use content::{
    Comment, FeedItem, FeedKey, Image, NewPost, NewRecipe, Notification, NotificationType, Post, Reaction,
    ReactionType, Recipe, RecipeCategory,
};
pub use events::LiveEvent;
pub use geo::{City, Country, NewLocation, VeganLocation};
pub use page::{Identified, Page};
pub use swipe::{PotentialMatch, PotentialMatchPage, SwipeDirection, SwipeRequest};
pub use types::{
    Chat, ChatAsset, ChatAssetRequest, ChatId, CreateMessage, Message, MessageId, MessageType,
    NewMessage, ServerErrorResponse, User, UserId, ValidationError,
};

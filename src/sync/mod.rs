//! Client-side state for each API resource: chat sessions, the chat list,
//! the paginated collections, locations and swiper mode.

pub mod chat;
pub mod chats;
pub mod dedup;
pub mod feed;
pub mod locations;
pub mod notifications;
pub mod paged;
pub mod post;
pub mod posts;
pub mod recipes;
pub mod swiper;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::common::{ReactionType, ServerErrorResponse};
use crate::error::ApiError;
use crate::network::ApiClient;
use crate::state::ToastQueue;

pub use chat::{ChatSession, LiveUpdate, MergeOutcome};
pub use chats::ChatDirectory;
pub use dedup::dedup_by_key;
pub use feed::FeedStore;
pub use locations::LocationStore;
pub use notifications::NotificationStore;
pub use paged::PagedList;
pub use post::PostThread;
pub use posts::ProfilePosts;
pub use recipes::RecipeStore;
pub use swiper::SwiperStore;

/// Logs a failed call, queues an error toast and hands back the server's
/// error envelope, if any, for the store to keep.
pub(crate) fn report_failure(
    toasts: &ToastQueue,
    action: &str,
    err: &ApiError,
    toast: &str,
) -> Option<ServerErrorResponse> {
    log::error!("Error {action}: {err}");
    toasts.error(toast);
    err.payload().cloned()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReactionRequest {
    reaction_type: ReactionType,
}

/// Likes or unlikes `<collection>/<id>`; the server answers with the
/// updated item.
pub(crate) async fn toggle_like<T: DeserializeOwned>(
    api: &ApiClient,
    collection: &str,
    id: i64,
    is_liked: bool,
) -> Result<T, ApiError> {
    let path = format!("{collection}/{id}/reactions");
    if is_liked {
        api.delete(&path).await
    } else {
        let body = ReactionRequest {
            reaction_type: ReactionType::Like,
        };
        api.post(&path, &body).await
    }
}

pub(crate) fn like_verb(was_liked: bool) -> &'static str {
    if was_liked { "unliked" } else { "liked" }
}

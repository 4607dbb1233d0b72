use crate::common::{FeedItem, FeedKey, NewPost, Post, Recipe, ServerErrorResponse};
use crate::error::ApiError;
use crate::network::ApiClient;
use crate::state::ToastQueue;

use super::paged::PagedList;
use super::{like_verb, report_failure, toggle_like};

/// Mixed home feed of posts and recipes.
pub struct FeedStore {
    api: ApiClient,
    toasts: ToastQueue,
    items: PagedList<FeedItem>,
    is_submitting_post: bool,
    error: Option<ServerErrorResponse>,
}

impl FeedStore {
    pub fn new(api: ApiClient, toasts: ToastQueue) -> Self {
        Self {
            api,
            toasts,
            items: PagedList::new(),
            is_submitting_post: false,
            error: None,
        }
    }

    pub fn items(&self) -> &PagedList<FeedItem> {
        &self.items
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.items.iter().filter_map(|item| match item {
            FeedItem::Post(post) => Some(post),
            FeedItem::Recipe(_) => None,
        })
    }

    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.items.iter().filter_map(|item| match item {
            FeedItem::Recipe(recipe) => Some(recipe),
            FeedItem::Post(_) => None,
        })
    }

    pub fn is_submitting_post(&self) -> bool {
        self.is_submitting_post
    }

    pub fn error(&self) -> Option<&ServerErrorResponse> {
        self.error.as_ref()
    }

    /// Returns `Ok(false)` when the load was skipped (busy or exhausted).
    pub async fn load_feed(&mut self, page: u32) -> Result<bool, ApiError> {
        if !self.items.begin_load(page) {
            return Ok(false);
        }
        match self.api.get_page::<FeedItem>("feed", page).await {
            Ok(fetched) => {
                self.items.apply_page(page, fetched);
                self.error = None;
                Ok(true)
            }
            Err(err) => {
                self.items.fail_load();
                self.error = report_failure(
                    &self.toasts,
                    "fetching feed",
                    &err,
                    "Something went wrong, please try again later",
                );
                Err(err)
            }
        }
    }

    pub async fn load_next(&mut self) -> Result<bool, ApiError> {
        let page = self.items.next_page();
        self.load_feed(page).await
    }

    pub async fn toggle_post_like(&mut self, post_id: i64, is_liked: bool) -> Result<Post, ApiError> {
        match toggle_like::<Post>(&self.api, "posts", post_id, is_liked).await {
            Ok(updated) => {
                self.items.replace(FeedItem::Post(updated.clone()));
                self.toasts
                    .success(format!("Post {} successfully!", like_verb(is_liked)));
                Ok(updated)
            }
            Err(err) => {
                report_failure(
                    &self.toasts,
                    "toggling like",
                    &err,
                    "Failed to update like status. Please try again.",
                );
                Err(err)
            }
        }
    }

    pub async fn toggle_recipe_like(&mut self, recipe_id: i64, is_liked: bool) -> Result<Recipe, ApiError> {
        match toggle_like::<Recipe>(&self.api, "recipes", recipe_id, is_liked).await {
            Ok(updated) => {
                self.items.replace(FeedItem::Recipe(updated.clone()));
                self.toasts
                    .success(format!("Recipe {} successfully!", like_verb(is_liked)));
                Ok(updated)
            }
            Err(err) => {
                report_failure(
                    &self.toasts,
                    "toggling like",
                    &err,
                    "Failed to update like status. Please try again.",
                );
                Err(err)
            }
        }
    }

    pub async fn delete_post(&mut self, post_id: i64) -> Result<(), ApiError> {
        match self.api.delete_empty(&format!("posts/{post_id}")).await {
            Ok(()) => {
                self.items.remove(&FeedKey::Post(post_id));
                self.toasts.success("Post deleted successfully!");
                Ok(())
            }
            Err(err) => {
                report_failure(
                    &self.toasts,
                    "deleting post",
                    &err,
                    "Failed to delete post. Please try again.",
                );
                Err(err)
            }
        }
    }

    pub async fn delete_recipe(&mut self, recipe_id: i64) -> Result<(), ApiError> {
        match self.api.delete_empty(&format!("recipes/{recipe_id}")).await {
            Ok(()) => {
                self.items.remove(&FeedKey::Recipe(recipe_id));
                self.toasts.success("Recipe deleted successfully!");
                Ok(())
            }
            Err(err) => {
                report_failure(
                    &self.toasts,
                    "deleting recipe",
                    &err,
                    "Failed to delete recipe. Please try again.",
                );
                Err(err)
            }
        }
    }

    /// New posts go to the top of the feed.
    pub async fn create_post(&mut self, content: String, image_urls: Vec<String>) -> Result<Post, ApiError> {
        self.is_submitting_post = true;
        let body = NewPost {
            content,
            images: image_urls,
        };
        let result = self.api.post::<_, Post>("posts", &body).await;
        self.is_submitting_post = false;

        match result {
            Ok(post) => {
                self.items.prepend(FeedItem::Post(post.clone()));
                self.toasts.success("Post created successfully!");
                Ok(post)
            }
            Err(err) => {
                self.error = report_failure(
                    &self.toasts,
                    "creating post",
                    &err,
                    "Something went wrong, please try again later!",
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::*;
    use crate::common::fixtures::{post, recipe, user};
    use crate::common::{Identified, Page, Reaction, ReactionType};
    use crate::network::api::testing::client;
    use crate::network::transport::testing::ScriptedTransport;
    use crate::state::ToastKind;

    fn feed_page(number: u32, items: Vec<FeedItem>, last: bool) -> serde_json::Value {
        serde_json::to_value(Page::new(number, items, last)).unwrap()
    }

    fn keys(store: &FeedStore) -> Vec<FeedKey> {
        store.items().iter().map(Identified::key).collect()
    }

    #[tokio::test]
    async fn pages_accumulate_until_empty() {
        let transport = ScriptedTransport::new()
            .respond(
                Method::GET,
                "feed",
                200,
                feed_page(0, vec![FeedItem::Post(post(1)), FeedItem::Recipe(recipe(1))], false),
            )
            .respond(Method::GET, "feed", 200, feed_page(1, vec![FeedItem::Post(post(2))], false))
            .respond(Method::GET, "feed", 200, feed_page(2, vec![], false));
        let (api, transport) = client(transport);
        let mut feed = FeedStore::new(api, ToastQueue::default());

        assert!(feed.load_next().await.unwrap());
        assert!(feed.load_next().await.unwrap());
        assert!(feed.load_next().await.unwrap());
        assert!(!feed.items().has_more());
        assert!(!feed.load_next().await.unwrap(), "exhausted feed is not re-requested");

        assert_eq!(
            keys(&feed),
            vec![FeedKey::Post(1), FeedKey::Recipe(1), FeedKey::Post(2)]
        );
        assert_eq!(feed.posts().count(), 2);
        assert_eq!(feed.recipes().count(), 1);
        assert_eq!(transport.calls_to(&Method::GET, "feed"), 3);
    }

    #[tokio::test]
    async fn like_replaces_post_in_place() {
        let mut liked = post(2);
        liked.reactions.push(Reaction {
            id: 1,
            user: user(1),
            reaction_type: ReactionType::Like,
            created_at: None,
        });
        let transport = ScriptedTransport::new()
            .respond(
                Method::GET,
                "feed",
                200,
                feed_page(0, vec![FeedItem::Post(post(1)), FeedItem::Post(post(2))], true),
            )
            .respond(
                Method::POST,
                "posts/2/reactions",
                200,
                serde_json::to_value(&liked).unwrap(),
            );
        let (api, transport) = client(transport);
        let toasts = ToastQueue::default();
        let mut feed = FeedStore::new(api, toasts.clone());

        feed.load_feed(0).await.unwrap();
        feed.toggle_post_like(2, false).await.unwrap();

        let posts: Vec<&Post> = feed.posts().collect();
        assert_eq!(posts[1].id, 2);
        assert!(posts[1].is_liked_by(1));
        assert_eq!(
            transport.requests()[1].body,
            Some(json!({"reactionType": "LIKE"}))
        );
        assert_eq!(toasts.active()[0].message, "Post liked successfully!");
    }

    #[tokio::test]
    async fn unlike_recipe_uses_delete() {
        let transport = ScriptedTransport::new()
            .respond(Method::GET, "feed", 200, feed_page(0, vec![FeedItem::Recipe(recipe(5))], true))
            .respond(
                Method::DELETE,
                "recipes/5/reactions",
                200,
                serde_json::to_value(recipe(5)).unwrap(),
            );
        let (api, _) = client(transport);
        let toasts = ToastQueue::default();
        let mut feed = FeedStore::new(api, toasts.clone());

        feed.load_feed(0).await.unwrap();
        feed.toggle_recipe_like(5, true).await.unwrap();

        assert_eq!(toasts.active()[0].message, "Recipe unliked successfully!");
    }

    #[tokio::test]
    async fn delete_only_removes_matching_kind() {
        let transport = ScriptedTransport::new()
            .respond(
                Method::GET,
                "feed",
                200,
                feed_page(0, vec![FeedItem::Post(post(1)), FeedItem::Recipe(recipe(1))], true),
            )
            .respond(Method::DELETE, "posts/1", 200, json!({}));
        let (api, _) = client(transport);
        let mut feed = FeedStore::new(api, ToastQueue::default());

        feed.load_feed(0).await.unwrap();
        feed.delete_post(1).await.unwrap();

        assert_eq!(keys(&feed), vec![FeedKey::Recipe(1)]);
    }

    #[tokio::test]
    async fn created_post_goes_first() {
        let transport = ScriptedTransport::new()
            .respond(Method::GET, "feed", 200, feed_page(0, vec![FeedItem::Post(post(1))], false))
            .respond(Method::POST, "posts", 201, serde_json::to_value(post(50)).unwrap());
        let (api, transport) = client(transport);
        let mut feed = FeedStore::new(api, ToastQueue::default());

        feed.load_feed(0).await.unwrap();
        feed.create_post("fresh".into(), vec!["https://cdn/a.avif".into()])
            .await
            .unwrap();

        assert_eq!(keys(&feed), vec![FeedKey::Post(50), FeedKey::Post(1)]);
        assert!(!feed.is_submitting_post());
        let body = transport.requests()[1].body.clone().unwrap();
        assert_eq!(body, json!({"content": "fresh", "images": ["https://cdn/a.avif"]}));
    }

    #[tokio::test]
    async fn failed_delete_leaves_feed_untouched() {
        let transport = ScriptedTransport::new()
            .respond(Method::GET, "feed", 200, feed_page(0, vec![FeedItem::Post(post(1))], true))
            .respond(
                Method::DELETE,
                "posts/1",
                403,
                json!({"statusCode": 403, "message": "Not your post"}),
            );
        let (api, _) = client(transport);
        let toasts = ToastQueue::default();
        let mut feed = FeedStore::new(api, toasts.clone());

        feed.load_feed(0).await.unwrap();
        assert!(feed.delete_post(1).await.is_err());

        assert_eq!(feed.items().len(), 1);
        assert_eq!(toasts.active()[0].kind, ToastKind::Error);
    }
}

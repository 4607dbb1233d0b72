//! A single post with its comment thread.

use serde::Serialize;

use crate::common::{Comment, Post, ServerErrorResponse};
use crate::error::{ApiError, ErrorKind};
use crate::network::ApiClient;
use crate::state::ToastQueue;

use super::{report_failure, toggle_like};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentRequest<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<i64>,
}

#[derive(Serialize)]
struct ContentPatch<'a> {
    content: &'a str,
}

fn find_comment_mut(comments: &mut [Comment], id: i64) -> Option<&mut Comment> {
    for comment in comments {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find_comment_mut(&mut comment.replies, id) {
            return Some(found);
        }
    }
    None
}

/// Swaps in `updated` wherever its id sits in the tree.
fn replace_comment(comments: &mut [Comment], updated: Comment) -> bool {
    match find_comment_mut(comments, updated.id) {
        Some(slot) => {
            *slot = updated;
            true
        }
        None => false,
    }
}

fn remove_comment(comments: &mut Vec<Comment>, id: i64) -> Option<Comment> {
    if let Some(index) = comments.iter().position(|comment| comment.id == id) {
        return Some(comments.remove(index));
    }
    comments
        .iter_mut()
        .find_map(|comment| remove_comment(&mut comment.replies, id))
}

fn attach_reply(comments: &mut [Comment], parent_id: i64, reply: Comment) -> bool {
    match find_comment_mut(comments, parent_id) {
        Some(parent) => {
            parent.replies.push(reply);
            true
        }
        None => false,
    }
}

/// State behind a post's detail view.
pub struct PostThread {
    api: ApiClient,
    toasts: ToastQueue,
    post_id: i64,
    post: Option<Post>,
    comments: Vec<Comment>,
    is_loading: bool,
    is_submitting_comment: bool,
    error: Option<ServerErrorResponse>,
}

impl PostThread {
    pub fn new(api: ApiClient, toasts: ToastQueue, post_id: i64) -> Self {
        Self {
            api,
            toasts,
            post_id,
            post: None,
            comments: Vec::new(),
            is_loading: false,
            is_submitting_comment: false,
            error: None,
        }
    }

    pub fn post(&self) -> Option<&Post> {
        self.post.as_ref()
    }

    /// Top-level comments; replies hang off each one.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_submitting_comment(&self) -> bool {
        self.is_submitting_comment
    }

    pub fn error(&self) -> Option<&ServerErrorResponse> {
        self.error.as_ref()
    }

    /// Not-found and unauthorized answers are left to the caller to route;
    /// anything else also raises a toast.
    pub async fn fetch(&mut self) -> Result<(), ApiError> {
        self.is_loading = true;
        let result = self.api.get::<Post>(&format!("posts/{}", self.post_id)).await;
        self.is_loading = false;

        match result {
            Ok(post) => {
                self.comments = post.comments.clone();
                self.post = Some(post);
                self.error = None;
                Ok(())
            }
            Err(err) => {
                match err.kind() {
                    ErrorKind::NotFound | ErrorKind::Unauthorized => {
                        log::warn!("Post {} unavailable: {err}", self.post_id);
                        self.error = err.payload().cloned();
                    }
                    _ => {
                        self.error = report_failure(
                            &self.toasts,
                            "fetching post",
                            &err,
                            "Something went wrong, Please try again.",
                        );
                    }
                }
                Err(err)
            }
        }
    }

    pub async fn delete_post(&mut self) -> Result<(), ApiError> {
        match self.api.delete_empty(&format!("posts/{}", self.post_id)).await {
            Ok(()) => {
                self.post = None;
                self.comments.clear();
                Ok(())
            }
            Err(err) => {
                self.error = report_failure(
                    &self.toasts,
                    "deleting post",
                    &err,
                    "Failed to delete post. Please try again.",
                );
                Err(err)
            }
        }
    }

    pub async fn edit_post(&mut self, content: &str) -> Result<Post, ApiError> {
        let path = format!("posts/{}", self.post_id);
        match self.api.patch::<_, Post>(&path, &ContentPatch { content }).await {
            Ok(post) => {
                self.post = Some(post.clone());
                Ok(post)
            }
            Err(err) => {
                report_failure(
                    &self.toasts,
                    "editing post",
                    &err,
                    "Something went wrong. Please try again.",
                );
                Err(err)
            }
        }
    }

    /// The comment list is kept as is; only the post itself is replaced.
    pub async fn toggle_like(&mut self, is_liked: bool) -> Result<Post, ApiError> {
        match toggle_like::<Post>(&self.api, "posts", self.post_id, is_liked).await {
            Ok(post) => {
                self.post = Some(post.clone());
                Ok(post)
            }
            Err(err) => {
                report_failure(
                    &self.toasts,
                    "toggling post like",
                    &err,
                    "Failed to update like status. Please try again.",
                );
                Err(err)
            }
        }
    }

    pub async fn add_comment(&mut self, content: &str) -> Result<Comment, ApiError> {
        self.is_submitting_comment = true;
        let result = self.post_comment(content, None).await;
        self.is_submitting_comment = false;

        match result {
            Ok(comment) => {
                self.comments.push(comment.clone());
                Ok(comment)
            }
            Err(err) => {
                report_failure(
                    &self.toasts,
                    "posting comment",
                    &err,
                    "Failed to post comment. Please try again.",
                );
                Err(err)
            }
        }
    }

    /// Replies attach under their parent at any depth.
    pub async fn add_reply(&mut self, parent_id: i64, content: &str) -> Result<Comment, ApiError> {
        self.is_submitting_comment = true;
        let result = self.post_comment(content, Some(parent_id)).await;
        self.is_submitting_comment = false;

        match result {
            Ok(reply) => {
                if !attach_reply(&mut self.comments, parent_id, reply.clone()) {
                    log::warn!("Reply {} has no parent {parent_id} in the thread", reply.id);
                }
                Ok(reply)
            }
            Err(err) => {
                report_failure(
                    &self.toasts,
                    "adding reply",
                    &err,
                    "Failed to add reply. Please try again.",
                );
                Err(err)
            }
        }
    }

    async fn post_comment(&self, content: &str, parent_id: Option<i64>) -> Result<Comment, ApiError> {
        let path = format!("comments/posts/{}/comments", self.post_id);
        self.api
            .post(&path, &CommentRequest { content, parent_id })
            .await
    }

    pub async fn delete_comment(&mut self, comment_id: i64) -> Result<(), ApiError> {
        match self.api.delete_empty(&format!("comments/{comment_id}")).await {
            Ok(()) => {
                remove_comment(&mut self.comments, comment_id);
                self.toasts.success("Comment deleted successfully!");
                Ok(())
            }
            Err(err) => {
                report_failure(
                    &self.toasts,
                    "deleting comment",
                    &err,
                    "Failed to delete comment. Please try again.",
                );
                Err(err)
            }
        }
    }

    pub async fn edit_comment(&mut self, comment_id: i64, content: &str) -> Result<Comment, ApiError> {
        let path = format!("comments/{comment_id}");
        match self.api.patch::<_, Comment>(&path, &ContentPatch { content }).await {
            Ok(updated) => {
                replace_comment(&mut self.comments, updated.clone());
                self.toasts.success("Comment updated successfully!");
                Ok(updated)
            }
            Err(err) => {
                report_failure(
                    &self.toasts,
                    "updating comment",
                    &err,
                    "Failed to update comment. Please try again.",
                );
                Err(err)
            }
        }
    }

    pub async fn toggle_comment_like(&mut self, comment_id: i64, is_liked: bool) -> Result<Comment, ApiError> {
        match toggle_like::<Comment>(&self.api, "comments", comment_id, is_liked).await {
            Ok(updated) => {
                replace_comment(&mut self.comments, updated.clone());
                Ok(updated)
            }
            Err(err) => {
                report_failure(
                    &self.toasts,
                    "toggling comment like",
                    &err,
                    "Failed to update like status. Please try again.",
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
    use crate::common::fixtures::{post, user};
    use crate::network::api::testing::client;
    use crate::network::transport::testing::ScriptedTransport;
    use crate::state::ToastKind;

    fn comment(id: i64, parent_id: Option<i64>, replies: Vec<Comment>) -> Comment {
        Comment {
            id,
            user: user(1),
            content: format!("comment {id}"),
            parent_id,
            replies,
            reactions: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn thread() -> Vec<Comment> {
        vec![
            comment(1, None, vec![comment(2, Some(1), vec![comment(3, Some(2), vec![])])]),
            comment(4, None, vec![]),
        ]
    }

    fn post_with_thread() -> serde_json::Value {
        let mut post = post(7);
        post.comments = thread();
        serde_json::to_value(post).unwrap()
    }

    #[test]
    fn tree_edits_reach_nested_replies() {
        let mut comments = thread();

        let mut edited = comment(3, Some(2), vec![]);
        edited.content = "edited".into();
        assert!(replace_comment(&mut comments, edited));
        assert_eq!(comments[0].replies[0].replies[0].content, "edited");

        assert!(attach_reply(&mut comments, 3, comment(5, Some(3), vec![])));
        assert_eq!(comments[0].replies[0].replies[0].replies[0].id, 5);

        assert_eq!(remove_comment(&mut comments, 2).map(|c| c.id), Some(2));
        assert!(comments[0].replies.is_empty());
        assert!(remove_comment(&mut comments, 5).is_none());
        assert_eq!(remove_comment(&mut comments, 4).map(|c| c.id), Some(4));
        assert_eq!(comments.len(), 1);

        assert!(!attach_reply(&mut comments, 99, comment(6, Some(99), vec![])));
    }

    #[tokio::test]
    async fn comments_and_replies_land_in_the_thread() {
        let transport = ScriptedTransport::new()
            .respond(Method::GET, "posts/7", 200, post_with_thread())
            .respond(
                Method::POST,
                "comments/posts/7/comments",
                201,
                serde_json::to_value(comment(8, None, vec![])).unwrap(),
            )
            .respond(
                Method::POST,
                "comments/posts/7/comments",
                201,
                serde_json::to_value(comment(9, Some(4), vec![])).unwrap(),
            );
        let (api, transport) = client(transport);
        let mut thread = PostThread::new(api, ToastQueue::default(), 7);

        thread.fetch().await.unwrap();
        thread.add_comment("first!").await.unwrap();
        thread.add_reply(4, "agreed").await.unwrap();

        let top: Vec<i64> = thread.comments().iter().map(|c| c.id).collect();
        assert_eq!(top, vec![1, 4, 8]);
        assert_eq!(thread.comments()[1].replies[0].id, 9);
        assert!(!thread.is_submitting_comment());

        let requests = transport.requests();
        assert_eq!(requests[1].body, Some(json!({"content": "first!"})));
        assert_eq!(requests[2].body, Some(json!({"content": "agreed", "parentId": 4})));
    }

    #[tokio::test]
    async fn nested_delete_edit_and_like() {
        let mut liked = comment(3, Some(2), vec![]);
        liked.reactions = vec![crate::common::Reaction {
            id: 1,
            user: user(1),
            reaction_type: crate::common::ReactionType::Like,
            created_at: None,
        }];
        let mut edited = comment(4, None, vec![]);
        edited.content = "fixed typo".into();
        let transport = ScriptedTransport::new()
            .respond(Method::GET, "posts/7", 200, post_with_thread())
            .respond(Method::POST, "comments/3/reactions", 200, serde_json::to_value(liked).unwrap())
            .respond(Method::PATCH, "comments/4", 200, serde_json::to_value(edited).unwrap())
            .respond(Method::DELETE, "comments/2", 204, json!(null));
        let (api, _) = client(transport);
        let toasts = ToastQueue::default();
        let mut thread = PostThread::new(api, toasts.clone(), 7);
        thread.fetch().await.unwrap();

        thread.toggle_comment_like(3, false).await.unwrap();
        assert_eq!(thread.comments()[0].replies[0].replies[0].reactions.len(), 1);

        thread.edit_comment(4, "fixed typo").await.unwrap();
        assert_eq!(thread.comments()[1].content, "fixed typo");

        thread.delete_comment(2).await.unwrap();
        assert!(thread.comments()[0].replies.is_empty());

        let messages: Vec<_> = toasts.active().into_iter().map(|t| t.message).collect();
        assert_eq!(
            messages,
            vec!["Comment updated successfully!", "Comment deleted successfully!"]
        );
    }

    #[tokio::test]
    async fn missing_post_does_not_toast() {
        let transport = ScriptedTransport::new()
            .respond(
                Method::GET,
                "posts/7",
                404,
                json!({"statusCode": 404, "message": "Post not found"}),
            )
            .respond(Method::PATCH, "posts/7", 422, json!({"statusCode": 422, "message": "Too long"}));
        let (api, _) = client(transport);
        let toasts = ToastQueue::default();
        let mut thread = PostThread::new(api, toasts.clone(), 7);

        let err = thread.fetch().await.unwrap_err();
        assert!(err.is_not_found());
        assert!(thread.post().is_none());
        assert!(toasts.active().is_empty());

        assert!(thread.edit_post("x").await.is_err());
        let shown = toasts.active();
        assert_eq!(shown[0].kind, ToastKind::Error);
        assert_eq!(shown[0].message, "Something went wrong. Please try again.");
    }

    #[tokio::test]
    async fn post_like_keeps_comment_list() {
        let mut updated = post(7);
        updated.reactions = vec![crate::common::Reaction {
            id: 2,
            user: user(1),
            reaction_type: crate::common::ReactionType::Like,
            created_at: None,
        }];
        let transport = ScriptedTransport::new()
            .respond(Method::GET, "posts/7", 200, post_with_thread())
            .respond(Method::POST, "posts/7/reactions", 200, serde_json::to_value(updated).unwrap())
            .respond(Method::DELETE, "posts/7", 204, json!(null));
        let (api, _) = client(transport);
        let mut thread = PostThread::new(api, ToastQueue::default(), 7);
        thread.fetch().await.unwrap();

        thread.toggle_like(false).await.unwrap();
        assert!(thread.post().unwrap().is_liked_by(1));
        assert_eq!(thread.comments().len(), 2);

        thread.delete_post().await.unwrap();
        assert!(thread.post().is_none());
        assert!(thread.comments().is_empty());
    }
}

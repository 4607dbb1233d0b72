use crate::common::{Post, ServerErrorResponse, UserId};
use crate::error::ApiError;
use crate::network::ApiClient;
use crate::state::ToastQueue;

use super::paged::PagedList;
use super::{like_verb, report_failure, toggle_like};

/// Posts on one user's profile.
pub struct ProfilePosts {
    api: ApiClient,
    toasts: ToastQueue,
    user_id: UserId,
    posts: PagedList<Post>,
    error: Option<ServerErrorResponse>,
}

impl ProfilePosts {
    pub fn new(api: ApiClient, toasts: ToastQueue, user_id: UserId) -> Self {
        Self {
            api,
            toasts,
            user_id,
            posts: PagedList::new(),
            error: None,
        }
    }

    pub fn posts(&self) -> &PagedList<Post> {
        &self.posts
    }

    pub fn error(&self) -> Option<&ServerErrorResponse> {
        self.error.as_ref()
    }

    pub async fn load_posts(&mut self, page: u32) -> Result<bool, ApiError> {
        if !self.posts.begin_load(page) {
            return Ok(false);
        }
        let path = format!("posts/user/{}", self.user_id);
        match self.api.get_page::<Post>(&path, page).await {
            Ok(fetched) => {
                self.posts.apply_page(page, fetched);
                self.error = None;
                Ok(true)
            }
            Err(err) => {
                self.posts.fail_load();
                self.error = report_failure(
                    &self.toasts,
                    "fetching posts",
                    &err,
                    "Something went wrong, please try again later",
                );
                Err(err)
            }
        }
    }

    pub async fn load_next(&mut self) -> Result<bool, ApiError> {
        let page = self.posts.next_page();
        self.load_posts(page).await
    }

    pub async fn toggle_like(&mut self, post_id: i64, is_liked: bool) -> Result<Post, ApiError> {
        match toggle_like::<Post>(&self.api, "posts", post_id, is_liked).await {
            Ok(updated) => {
                self.posts.replace(updated.clone());
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

    pub async fn delete_post(&mut self, post_id: i64) -> Result<(), ApiError> {
        match self.api.delete_empty(&format!("posts/{post_id}")).await {
            Ok(()) => {
                self.posts.remove(&post_id);
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
}

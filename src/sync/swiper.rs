//! Swiper mode: a paginated stack of candidates, swipes, and the matches
//! they produce.

use crate::common::{
    PotentialMatch, PotentialMatchPage, ServerErrorResponse, SwipeDirection, SwipeRequest, User,
    UserId,
};
use crate::error::ApiError;
use crate::network::{ApiClient, ApiRequest};
use crate::state::ToastQueue;

use super::dedup::dedup_by_key;
use super::report_failure;

pub const DEFAULT_BATCH_SIZE: u32 = 4;

pub struct SwiperStore {
    api: ApiClient,
    toasts: ToastQueue,
    batch_size: u32,
    candidates: Vec<PotentialMatch>,
    matches: Vec<User>,
    current_page: u32,
    has_more: bool,
    is_loading: bool,
    is_loading_matches: bool,
    error: Option<ServerErrorResponse>,
}

impl SwiperStore {
    pub fn new(api: ApiClient, toasts: ToastQueue) -> Self {
        Self::with_batch_size(api, toasts, DEFAULT_BATCH_SIZE)
    }

    pub fn with_batch_size(api: ApiClient, toasts: ToastQueue, batch_size: u32) -> Self {
        Self {
            api,
            toasts,
            batch_size,
            candidates: Vec::new(),
            matches: Vec::new(),
            current_page: 0,
            has_more: false,
            is_loading: false,
            is_loading_matches: false,
            error: None,
        }
    }

    pub fn candidates(&self) -> &[PotentialMatch] {
        &self.candidates
    }

    pub fn matches(&self) -> &[User] {
        &self.matches
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_loading_matches(&self) -> bool {
        self.is_loading_matches
    }

    pub fn error(&self) -> Option<&ServerErrorResponse> {
        self.error.as_ref()
    }

    /// Page 0 replaces the stack, later pages extend it.
    pub async fn load_candidates(&mut self, page: u32) -> Result<(), ApiError> {
        self.is_loading = true;
        let request = ApiRequest::get("swipes/potential-matches")
            .with_query("page", page)
            .with_query("size", self.batch_size);
        let result = self.api.json::<PotentialMatchPage>(request).await;
        self.is_loading = false;

        match result {
            Ok(fetched) => {
                self.candidates = if page == 0 {
                    dedup_by_key(fetched.matches)
                } else {
                    let existing = std::mem::take(&mut self.candidates);
                    dedup_by_key(existing.into_iter().chain(fetched.matches))
                };
                self.has_more = fetched.has_next_page;
                self.current_page = page;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                self.error = report_failure(
                    &self.toasts,
                    "loading potential matches",
                    &err,
                    "Failed to load potential matches. Please try again later.",
                );
                Err(err)
            }
        }
    }

    /// Returns `Ok(false)` when there is nothing more or a load is running.
    pub async fn load_more(&mut self) -> Result<bool, ApiError> {
        if !self.has_more || self.is_loading {
            return Ok(false);
        }
        self.load_candidates(self.current_page + 1).await?;
        Ok(true)
    }

    /// Records a swipe; the candidate leaves the stack once the server
    /// accepts it.
    pub async fn swipe(&mut self, user_id: UserId, direction: SwipeDirection) -> Result<(), ApiError> {
        let body = serde_json::to_value(SwipeRequest {
            swiped_user_id: user_id,
            direction,
        })?;
        match self.api.execute(ApiRequest::post("swipes").with_json(body)).await {
            Ok(_) => {
                self.candidates.retain(|candidate| candidate.user_id() != user_id);
                self.toasts.success("Swiped successfully");
                Ok(())
            }
            Err(err) => {
                report_failure(
                    &self.toasts,
                    "registering swipe",
                    &err,
                    "Failed to register swipe. Please try again.",
                );
                Err(err)
            }
        }
    }

    pub async fn load_matches(&mut self) -> Result<(), ApiError> {
        self.is_loading_matches = true;
        let result = self.api.get::<Vec<User>>("swipes/matches").await;
        self.is_loading_matches = false;

        match result {
            Ok(matches) => {
                self.matches = matches;
                Ok(())
            }
            Err(err) => {
                log::error!("Error loading matches: {err}");
                self.error = err.payload().cloned();
                Err(err)
            }
        }
    }
}

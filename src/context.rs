//! Application-wide state, built once at start-up.

use std::sync::Arc;

use crate::common::{ChatId, User, UserId};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::network::{ApiClient, HttpTransport, ReqwestTransport};
use crate::state::{Credentials, SessionStore, ToastQueue};
use crate::sync::{
    ChatDirectory, ChatSession, FeedStore, LocationStore, NotificationStore, PostThread,
    ProfilePosts, RecipeStore, SwiperStore,
};

/// Owns the session, the toast queue and the API client every store shares.
pub struct AppContext {
    config: AppConfig,
    session: SessionStore,
    toasts: ToastQueue,
    api: ApiClient,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(&config.api_base_url, config.request_timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: AppConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let session = SessionStore::new(config.credentials.clone());
        let toasts = ToastQueue::new(config.toast_ttl());
        let api = ApiClient::new(transport, session.clone(), config.retry_policy());
        log::info!("Client context ready for {}", config.api_base_url);
        Self {
            config,
            session,
            toasts,
            api,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn sign_in(&self, user: User, credentials: Credentials) {
        log::info!("Signed in as {}", user.username);
        self.session.set_credentials(credentials);
        self.session.set_user(user);
    }

    pub fn logout(&self) {
        self.session.clear();
        self.toasts.reset();
        log::info!("Signed out");
    }

    pub fn chat_session(
        &self,
        user_id: UserId,
        chat_id: Option<ChatId>,
        first_time: bool,
    ) -> ChatSession {
        ChatSession::new(
            self.api.clone(),
            self.toasts.clone(),
            self.config.live_settings(),
            user_id,
            chat_id,
            first_time,
        )
    }

    pub fn chats(&self) -> ChatDirectory {
        ChatDirectory::new(self.api.clone(), self.toasts.clone())
    }

    pub fn feed(&self) -> FeedStore {
        FeedStore::new(self.api.clone(), self.toasts.clone())
    }

    pub fn profile_posts(&self, user_id: UserId) -> ProfilePosts {
        ProfilePosts::new(self.api.clone(), self.toasts.clone(), user_id)
    }

    pub fn recipes(&self, user_id: UserId) -> RecipeStore {
        RecipeStore::new(self.api.clone(), self.toasts.clone(), user_id)
    }

    pub fn notifications(&self) -> NotificationStore {
        NotificationStore::new(self.api.clone(), self.toasts.clone())
    }

    pub fn post_thread(&self, post_id: i64) -> PostThread {
        PostThread::new(self.api.clone(), self.toasts.clone(), post_id)
    }

    pub fn locations(&self) -> LocationStore {
        LocationStore::new(self.api.clone(), self.toasts.clone())
    }

    pub fn swiper(&self) -> SwiperStore {
        SwiperStore::new(self.api.clone(), self.toasts.clone())
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::*;
    use crate::common::fixtures::{post, user};
    use crate::common::Page;
    use crate::network::transport::testing::ScriptedTransport;

    fn context(transport: ScriptedTransport) -> (AppContext, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let mut config = AppConfig::default();
        config.retry.base_delay_ms = 0;
        config.credentials = Credentials::bearer("env-token");
        (AppContext::with_transport(config, transport.clone()), transport)
    }

    #[tokio::test]
    async fn stores_share_the_session_token() {
        let page = Page::new(0, vec![post(1)], true);
        let transport = ScriptedTransport::new().respond(
            Method::GET,
            "posts/user/1",
            200,
            serde_json::to_value(page).unwrap(),
        );
        let (ctx, transport) = context(transport);
        ctx.sign_in(user(1), Credentials::bearer("fresh"));

        let mut posts = ctx.profile_posts(1);
        posts.load_posts(0).await.unwrap();

        assert_eq!(posts.posts().len(), 1);
        let request = &transport.requests()[0];
        assert_eq!(request.header("Authorization"), Some("Bearer fresh"));
    }

    #[tokio::test]
    async fn logout_resets_session_and_toasts() {
        let transport = ScriptedTransport::new().respond(
            Method::GET,
            "feed",
            500,
            json!({"statusCode": 500, "message": "boom"}),
        );
        let (ctx, _) = context(transport);
        ctx.sign_in(user(7), Credentials::bearer("t"));
        let mut feed = ctx.feed();
        assert!(feed.load_feed(0).await.is_err());
        assert_eq!(ctx.toasts().active().len(), 1);

        ctx.logout();

        assert!(ctx.session().user().is_none());
        assert!(ctx.session().access_token().is_none());
        assert!(ctx.toasts().active().is_empty());
    }

    #[test]
    fn chat_sessions_use_configured_socket() {
        let (ctx, _) = context(ScriptedTransport::new());
        let session = ctx.chat_session(1, Some(4), false);

        assert_eq!(session.chat_id(), Some(4));
        assert!(!session.is_live());
        assert_eq!(ctx.config().live_settings().ws_base, "wss://core.vemeet.me");
    }
}

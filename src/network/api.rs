use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::common::Page;
use crate::error::ApiError;
use crate::state::SessionStore;

use super::auth;
use super::transport::{ApiRequest, ApiResponse, HttpTransport};

/// Limited automatic retry: idempotent verbs only, selected statuses only.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub limit: u32,
    pub status_codes: Vec<u16>,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            limit: 2,
            status_codes: vec![500],
            base_delay: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            limit: 0,
            ..Self::default()
        }
    }

    /// Whether the `attempt`-th retry (0-based) may be issued.
    pub fn allows(&self, method: &Method, status: u16, attempt: u32) -> bool {
        attempt < self.limit && is_idempotent(method) && self.status_codes.contains(&status)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE
    )
}

/// Authenticated JSON client. Cloning is cheap and shares the session.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    session: SessionStore,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, session: SessionStore, retry: RetryPolicy) -> Self {
        Self {
            transport,
            session,
            retry,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.json(ApiRequest::get(path)).await
    }

    /// `GET <path>?page=<page>` decoded as a page envelope.
    pub async fn get_page<T: DeserializeOwned>(&self, path: &str, page: u32) -> Result<Page<T>, ApiError> {
        self.json(ApiRequest::get(path).with_query("page", page)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.json(ApiRequest::post(path).with_json(body)).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.json(ApiRequest::patch(path).with_json(body)).await
    }

    /// POST without a body, ignoring whatever comes back.
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::post(path)).await.map(|_| ())
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.json(ApiRequest::delete(path)).await
    }

    pub async fn delete_empty(&self, path: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::delete(path)).await.map(|_| ())
    }

    pub async fn json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let token = self.access_token().await?;
        let request = request.with_header("Authorization", format!("Bearer {token}"));

        let mut attempt = 0;
        loop {
            let response = self.transport.execute(request.clone()).await?;
            if response.is_success() {
                return Ok(response);
            }

            if self.retry.allows(&request.method, response.status, attempt) {
                let delay = self.retry.delay(attempt);
                log::debug!(
                    "{} {} answered {}, retrying in {delay:?}",
                    request.method,
                    request.path,
                    response.status
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Err(ApiError::from_response(response));
        }
    }

    async fn access_token(&self) -> Result<String, ApiError> {
        if self.session.needs_refresh(Utc::now()) {
            auth::refresh_session(self.transport.as_ref(), &self.session).await?;
        }
        self.session.access_token().ok_or(ApiError::SessionExpired)
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::testing::client;
    use super::*;
    use crate::error::ErrorKind;
    use crate::network::transport::testing::ScriptedTransport;
    use crate::state::Credentials;

    #[test]
    fn retry_policy_only_covers_idempotent_verbs() {
        let policy = RetryPolicy::default();
        assert!(policy.allows(&Method::GET, 500, 0));
        assert!(policy.allows(&Method::DELETE, 500, 1));
        assert!(!policy.allows(&Method::GET, 500, 2));
        assert!(!policy.allows(&Method::POST, 500, 0));
        assert!(!policy.allows(&Method::GET, 503, 0));
        assert!(!policy.allows(&Method::GET, 404, 0));
        assert_eq!(policy.delay(0), Duration::from_millis(300));
        assert_eq!(policy.delay(2), Duration::from_millis(1200));
    }

    #[tokio::test]
    async fn attaches_bearer_token() {
        let (api, transport) =
            client(ScriptedTransport::new().respond(Method::GET, "chats", 200, json!([])));

        let chats: Vec<serde_json::Value> = api.get("chats").await.unwrap();

        assert!(chats.is_empty());
        assert_eq!(
            transport.requests()[0].header("authorization"),
            Some("Bearer token")
        );
    }

    #[tokio::test]
    async fn retries_get_on_500_then_succeeds() {
        let (api, transport) = client(
            ScriptedTransport::new()
                .respond(Method::GET, "feed", 500, json!({"statusCode": 500, "message": "boom"}))
                .respond(Method::GET, "feed", 200, json!({"ok": true})),
        );

        let body: serde_json::Value = api.get("feed").await.unwrap();

        assert_eq!(body["ok"], true);
        assert_eq!(transport.calls_to(&Method::GET, "feed"), 2);
    }

    #[tokio::test]
    async fn gives_up_after_retry_limit() {
        let mut transport = ScriptedTransport::new();
        for _ in 0..5 {
            transport = transport.respond(Method::GET, "feed", 500, json!({"statusCode": 500, "message": "boom"}));
        }
        let (api, transport) = client(transport);

        let err = api.get::<serde_json::Value>("feed").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(transport.calls_to(&Method::GET, "feed"), 3);
    }

    #[tokio::test]
    async fn never_retries_post() {
        let (api, transport) = client(ScriptedTransport::new().respond(
            Method::POST,
            "posts",
            500,
            json!({"statusCode": 500, "message": "boom"}),
        ));

        let err = api
            .post::<_, serde_json::Value>("posts", &json!({"content": "x"}))
            .await
            .unwrap_err();

        assert_eq!(err.payload().unwrap().message, "boom");
        assert_eq!(transport.calls_to(&Method::POST, "posts"), 1);
    }

    fn connection_error() -> ApiError {
        let err = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err();
        ApiError::Transport(err)
    }

    #[tokio::test]
    async fn transport_failures_are_not_retried() {
        let (api, transport) = client(
            ScriptedTransport::new()
                .fail(Method::GET, "feed", connection_error())
                .respond(Method::GET, "feed", 200, json!({"ok": true})),
        );

        let err = api.get::<serde_json::Value>("feed").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(transport.calls_to(&Method::GET, "feed"), 1);
    }

    #[tokio::test]
    async fn refreshes_missing_access_token_before_request() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(
                    Method::POST,
                    "auth/refresh",
                    200,
                    json!({"accessToken": "fresh", "accessTokenExpiry": 4_000_000_000i64}),
                )
                .respond(Method::GET, "chats", 200, json!([])),
        );
        let session = SessionStore::new(Credentials::default().with_refresh("r", "c"));
        let api = ApiClient::new(transport.clone(), session, RetryPolicy::none());

        let _: Vec<serde_json::Value> = api.get("chats").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].path, "auth/refresh");
        assert_eq!(requests[1].header("Authorization"), Some("Bearer fresh"));
    }

    #[tokio::test]
    async fn signed_out_session_is_rejected_locally() {
        let transport = Arc::new(ScriptedTransport::new());
        let api = ApiClient::new(transport.clone(), SessionStore::default(), RetryPolicy::none());

        let err = api.get::<serde_json::Value>("chats").await.unwrap_err();

        assert!(matches!(err, ApiError::SessionExpired));
        assert!(transport.requests().is_empty());
    }
}

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::RwLock;

use crate::common::{User, UserId};
use crate::network::auth::{EXPIRY_BUFFER_SECS, RefreshResponse};

/// Tokens for the authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub access_expires_at: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
    pub cognito_id: Option<String>,
}

impl Credentials {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..Self::default()
        }
    }

    pub fn with_refresh(mut self, refresh_token: impl Into<String>, cognito_id: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self.cognito_id = Some(cognito_id.into());
        self
    }

    /// An access token without a known expiry is trusted until the server rejects it.
    pub fn has_valid_access(&self, now: DateTime<Utc>) -> bool {
        self.access_token.is_some() && self.access_expires_at.is_none_or(|expiry| expiry > now)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some() && self.cognito_id.is_some()
    }

    /// Remaining lifetime of the access token, never negative.
    pub fn access_ttl(&self, now: DateTime<Utc>) -> Duration {
        match (self.access_token.as_ref(), self.access_expires_at) {
            (Some(_), Some(expiry)) => (expiry - now).max(Duration::zero()),
            _ => Duration::zero(),
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    credentials: Credentials,
}

/// Partial profile update applied after a successful edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub residence_name: Option<String>,
    pub is_private: Option<bool>,
    pub inbox_locked: Option<bool>,
}

impl UserPatch {
    fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(name) = self.name {
            user.name = Some(name);
        }
        if let Some(bio) = self.bio {
            user.bio = Some(bio);
        }
        if let Some(gender) = self.gender {
            user.gender = Some(gender);
        }
        if let Some(residence) = self.residence_name {
            user.residence_name = Some(residence);
        }
        if let Some(is_private) = self.is_private {
            user.is_private = is_private;
        }
        if let Some(inbox_locked) = self.inbox_locked {
            user.inbox_locked = inbox_locked;
        }
    }
}

/// Signed-in user and tokens. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionStore {
    pub fn new(credentials: Credentials) -> Self {
        let store = Self::default();
        store.set_credentials(credentials);
        store
    }

    pub fn user(&self) -> Option<User> {
        self.inner.read().user.clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.inner.read().user.as_ref().map(|user| user.id)
    }

    pub fn set_user(&self, user: User) {
        self.inner.write().user = Some(user);
    }

    /// Returns false when nobody is signed in.
    pub fn update_user(&self, patch: UserPatch) -> bool {
        let mut state = self.inner.write();
        match state.user.as_mut() {
            Some(user) => {
                patch.apply(user);
                true
            }
            None => false,
        }
    }

    pub fn credentials(&self) -> Credentials {
        self.inner.read().credentials.clone()
    }

    pub fn set_credentials(&self, credentials: Credentials) {
        self.inner.write().credentials = credentials;
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.read().credentials.access_token.clone()
    }

    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        let state = self.inner.read();
        !state.credentials.has_valid_access(now) && state.credentials.can_refresh()
    }

    /// `(refresh_token, cognito_id)` when both are known.
    pub fn refresh_material(&self) -> Option<(String, String)> {
        let state = self.inner.read();
        let credentials = &state.credentials;
        match (&credentials.refresh_token, &credentials.cognito_id) {
            (Some(refresh), Some(cognito_id)) => Some((refresh.clone(), cognito_id.clone())),
            _ => None,
        }
    }

    pub fn apply_refresh(&self, tokens: &RefreshResponse, now: DateTime<Utc>) {
        let expires_at = Utc
            .timestamp_opt(tokens.access_token_expiry - EXPIRY_BUFFER_SECS, 0)
            .single()
            .unwrap_or(now);
        let mut state = self.inner.write();
        state.credentials.access_token = Some(tokens.access_token.clone());
        state.credentials.access_expires_at = Some(expires_at);
    }

    pub fn clear_credentials(&self) {
        self.inner.write().credentials = Credentials::default();
    }

    /// Sign-out: forget the user and every token.
    pub fn clear(&self) {
        let mut state = self.inner.write();
        state.user = None;
        state.credentials = Credentials::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::{at, user};

    #[test]
    fn update_user_requires_a_user() {
        let session = SessionStore::default();
        assert!(!session.update_user(UserPatch {
            bio: Some("vegan".into()),
            ..UserPatch::default()
        }));

        session.set_user(user(4));
        assert!(session.update_user(UserPatch {
            bio: Some("vegan".into()),
            is_private: Some(true),
            ..UserPatch::default()
        }));
        let updated = session.user().unwrap();
        assert_eq!(updated.bio.as_deref(), Some("vegan"));
        assert!(updated.is_private);
        assert_eq!(updated.username, "user4");
    }

    #[test]
    fn refresh_needed_only_when_access_missing_or_expired() {
        let now = at(0);
        let session = SessionStore::new(Credentials::bearer("a").with_refresh("r", "c"));
        assert!(!session.needs_refresh(now));

        session.set_credentials(Credentials::default().with_refresh("r", "c"));
        assert!(session.needs_refresh(now));

        session.set_credentials(Credentials {
            access_expires_at: Some(at(-1)),
            ..Credentials::bearer("a").with_refresh("r", "c")
        });
        assert!(session.needs_refresh(now));

        session.set_credentials(Credentials::default());
        assert!(!session.needs_refresh(now), "nothing to refresh with");
    }

    #[test]
    fn refreshed_token_expires_one_minute_early() {
        let now = at(0);
        let session = SessionStore::new(Credentials::default().with_refresh("r", "c"));
        session.apply_refresh(
            &RefreshResponse {
                access_token: "fresh".into(),
                access_token_expiry: now.timestamp() + 600,
            },
            now,
        );

        let credentials = session.credentials();
        assert_eq!(credentials.access_token.as_deref(), Some("fresh"));
        assert_eq!(credentials.access_ttl(now), Duration::seconds(540));
        assert!(!session.needs_refresh(now));
        assert!(session.needs_refresh(at(541)));
    }

    #[test]
    fn clear_forgets_everything() {
        let session = SessionStore::new(Credentials::bearer("a"));
        session.set_user(user(1));
        session.clear();
        assert!(session.user().is_none());
        assert!(session.access_token().is_none());
    }
}

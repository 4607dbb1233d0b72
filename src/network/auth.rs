use chrono::Utc;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::SessionStore;

use super::transport::{ApiRequest, HttpTransport};

pub const REFRESH_HEADER: &str = "Refresh-Token-X";
/// Access tokens are treated as expired this many seconds early.
pub const EXPIRY_BUFFER_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    /// Epoch seconds.
    pub access_token_expiry: i64,
}

/// Exchanges a refresh token for a new access token.
pub async fn refresh(
    transport: &dyn HttpTransport,
    refresh_token: &str,
    cognito_id: &str,
) -> Result<RefreshResponse, ApiError> {
    let request = ApiRequest::post("auth/refresh")
        .with_query("id", cognito_id)
        .with_header(REFRESH_HEADER, refresh_token);

    let response = transport.execute(request).await?;
    if !response.is_success() {
        return Err(ApiError::from_response(response));
    }
    Ok(serde_json::from_str(&response.body)?)
}

/// Refreshes the session's access token in place. Any failure signs the
/// session out and reports [`ApiError::SessionExpired`].
pub async fn refresh_session(
    transport: &dyn HttpTransport,
    session: &SessionStore,
) -> Result<(), ApiError> {
    let Some((refresh_token, cognito_id)) = session.refresh_material() else {
        return Err(ApiError::SessionExpired);
    };

    match refresh(transport, &refresh_token, &cognito_id).await {
        Ok(tokens) => {
            let now = Utc::now();
            session.apply_refresh(&tokens, now);
            log::info!(
                "Access token refreshed, valid for {}s",
                session.credentials().access_ttl(now).num_seconds()
            );
            Ok(())
        }
        Err(err) => {
            log::error!("Failed to refresh token: {err}");
            session.clear_credentials();
            Err(ApiError::SessionExpired)
        }
    }
}

use thiserror::Error;

use crate::common::ServerErrorResponse;
use crate::network::transport::ApiResponse;

/// Broad classes of API failures, used to decide how a caller reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 422 with field-level errors.
    Validation,
    /// 401/403, or the session could not be refreshed.
    Unauthorized,
    /// 404, often a control-flow signal rather than a failure.
    NotFound,
    /// 5xx.
    Server,
    /// Connection or protocol failure before a status was received.
    Transport,
    Other,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("server responded {status}: {}", .payload.message)]
    Server {
        status: u16,
        payload: ServerErrorResponse,
    },

    #[error("server responded {status}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("session expired, sign in again")]
    SessionExpired,

    #[error("invalid url `{0}`")]
    InvalidUrl(String),
}

impl ApiError {
    /// Builds the error for a non-success response, keeping the server's
    /// error envelope when the body carries one.
    pub fn from_response(response: ApiResponse) -> Self {
        match serde_json::from_str::<ServerErrorResponse>(&response.body) {
            Ok(payload) => Self::Server {
                status: response.status,
                payload,
            },
            Err(_) => Self::Status {
                status: response.status,
                body: response.body,
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&ServerErrorResponse> {
        match self {
            Self::Server { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SessionExpired => return ErrorKind::Unauthorized,
            Self::Transport(err) if err.status().is_none() => return ErrorKind::Transport,
            _ => {}
        }
        match self.status() {
            Some(422) => ErrorKind::Validation,
            Some(401) | Some(403) => ErrorKind::Unauthorized,
            Some(404) => ErrorKind::NotFound,
            Some(status) if status >= 500 => ErrorKind::Server,
            _ => ErrorKind::Other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> ApiResponse {
        ApiResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn keeps_server_error_envelope() {
        let err = ApiError::from_response(response(
            422,
            r#"{"statusCode":422,"message":"Invalid","errors":[{"path":"email","error":"taken"}]}"#,
        ));
        assert_eq!(err.kind(), ErrorKind::Validation);
        let payload = err.payload().unwrap();
        assert_eq!(payload.errors.as_ref().unwrap()[0].path, "email");
        assert_eq!(err.to_string(), "server responded 422: Invalid");
    }

    #[test]
    fn falls_back_to_plain_status() {
        let err = ApiError::from_response(response(502, "<html>bad gateway</html>"));
        assert!(err.payload().is_none());
        assert_eq!(err.kind(), ErrorKind::Server);
        assert!(ApiError::from_response(response(404, "")).is_not_found());
        assert_eq!(
            ApiError::from_response(response(403, "")).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(ApiError::SessionExpired.kind(), ErrorKind::Unauthorized);
    }
}

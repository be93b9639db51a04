use http::StatusCode;
use shared::types::ErrorResponse;
use thiserror::Error;

use crate::board::columns::InvalidMove;
use crate::gateway::transport::TransportError;

/// Failures that end the session. Any of these surfaces as a forced return
/// to the login screen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("access token could not be decoded: {0}")]
    Decode(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("no refresh credential available")]
    NoRefreshCredential,

    #[error("token refresh rejected ({status}): {message}")]
    RefreshRejected { status: u16, message: String },

    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("session storage failed: {0}")]
    Storage(String),

    /// The session a refresh was started for was cleared or replaced before
    /// the refresh finished.
    #[error("session changed during token refresh")]
    SessionChanged,
}

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// A 401 that could not be recovered by refreshing (the request had
    /// already been retried, or there is no session to refresh).
    #[error("authorization expired")]
    AuthorizationExpired,

    #[error("not signed in")]
    NotAuthenticated,

    /// 4xx with field-level messages; shown to the user verbatim.
    #[error("{0}")]
    Validation(ErrorResponse),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] TransportError),

    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("failed to encode request body: {0}")]
    Encode(String),

    /// A mutation failed after it had been applied optimistically. The board
    /// has already been reloaded from the server when this is returned.
    #[error("sync conflict on board {board}: {reason}")]
    SyncConflict { board: i64, reason: String },

    #[error("invalid move: {0}")]
    InvalidMove(#[from] InvalidMove),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    /// Classify a non-2xx response.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let parsed = ErrorResponse::from_body(body);
        let message = if parsed.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        } else {
            parsed.message()
        };

        match status {
            StatusCode::UNAUTHORIZED => ClientError::AuthorizationExpired,
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            s if s.is_server_error() => ClientError::Server {
                status: s.as_u16(),
                message,
            },
            _ => {
                if parsed.is_empty() {
                    ClientError::Validation(ErrorResponse {
                        detail: Some(message),
                        fields: Default::default(),
                    })
                } else {
                    ClientError::Validation(parsed)
                }
            }
        }
    }

    /// Errors that must send the user back to the login screen.
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_) | ClientError::NotAuthenticated)
    }

    /// Stable upper-case identifier for logs and `--json` output.
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "AUTH_ERROR",
            Self::AuthorizationExpired => "AUTHORIZATION_EXPIRED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Server { .. } => "SERVER_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            Self::Encode(_) => "ENCODE_ERROR",
            Self::SyncConflict { .. } => "SYNC_CONFLICT",
            Self::InvalidMove(_) => "INVALID_MOVE",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

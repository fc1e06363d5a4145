//! Gate error definitions.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors that terminate a gate setup or a single authorization decision.
///
/// A denial by the authorization service is not an error; it is
/// [`Decision::Deny`](crate::forward_auth::Decision::Deny). Failures while
/// writing a denial to the client surface in hyper, which aborts the connection.
#[derive(Debug, Error)]
pub enum GateError {
    /// Gate configuration rejected at setup time.
    #[error("forward_auth configuration error: {0}")]
    Config(String),

    /// The authorization HTTP client could not be constructed.
    #[error("failed to build authorization client: {0}")]
    Client(#[source] reqwest::Error),

    /// The authorization service could not be reached or did not answer in time.
    #[error("authorization request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl GateError {
    /// True when the authorization service exceeded its time budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GateError::Transport(e) if e.is_timeout())
    }

    /// Status the host answers with when a decision fails. Never a success status.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GateError::Transport(_) if self.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            GateError::Transport(_) => StatusCode::BAD_GATEWAY,
            GateError::Config(_) | GateError::Client(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match status {
            StatusCode::GATEWAY_TIMEOUT => "Authorization service timed out",
            StatusCode::BAD_GATEWAY => "Authorization service unavailable",
            _ => "Authorization gate failure",
        };
        (status, message).into_response()
    }
}

/// Result type for gate operations.
pub type GateResult<T> = Result<T, GateError>;

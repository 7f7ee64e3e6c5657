use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Request-level failures surfaced to HTTP clients.
///
/// Everything maps to `400 Bad Request` with a short plain-text body, which is
/// what existing channel clients expect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// A required field is missing or has the wrong shape. The message names it.
    #[error("{0}")]
    Validation(&'static str),
    /// Missing or wrong credential. Deliberately says nothing more.
    #[error("Invalid authorization")]
    Unauthorized,
}

impl ChannelError {
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl IntoResponse for ChannelError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

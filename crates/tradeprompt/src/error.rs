use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tradeprompt_agents::CompletionError;
use tradeprompt_models::IntentError;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

/// A failed `/strategy/ask` request, rendered as `{"detail", "type"?}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
    pub kind: Option<&'static str>,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
            kind: None,
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn payload_too_large() -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large")
    }

    pub fn invalid_strategy(err: &IntentError) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Invalid strategy format: {err}"),
        )
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    /// Upstream messages and bodies stay in the logs; callers get a fixed
    /// detail per failure kind.
    pub fn completion(err: &CompletionError) -> Self {
        let status = StatusCode::from_u16(err.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let detail = match err {
            CompletionError::Config(_) => "Completion service not configured",
            CompletionError::Network(_) => "Completion service temporarily unavailable",
            CompletionError::MaxRetries { .. } => "Completion service did not respond",
            CompletionError::Parse(_) => "Invalid response from completion service",
        };
        Self::new(status, detail).with_kind(err.kind())
    }

    fn with_kind(mut self, kind: &'static str) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: &self.detail,
            kind: self.kind,
        };
        (self.status, Json(body)).into_response()
    }
}

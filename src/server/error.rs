use crate::error::{ExtractionError, KimiError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Error returned by HTTP handlers, rendered as `{"detail": ...}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    /// Error with an explicit status
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    /// 404 Not Found
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    /// HTTP status of the response
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Message placed in the `detail` field
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

fn status_for(error: &KimiError) -> StatusCode {
    match error {
        KimiError::InvalidSessionId(_)
        | KimiError::Extraction(ExtractionError::UnsupportedType { .. }) => {
            StatusCode::BAD_REQUEST
        }
        KimiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        KimiError::SessionClosed(_) => StatusCode::CONFLICT,
        KimiError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        let status = error
            .downcast_ref::<KimiError>()
            .map(status_for)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("Request failed: {:#}", error);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, error);
        }
        Self::new(status, error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

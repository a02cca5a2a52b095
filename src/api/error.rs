use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;
use serde::{Deserialize, Serialize};

use crate::types::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::GuardrailTripwire { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Llm(_) | AppError::Search(_) => StatusCode::BAD_GATEWAY,
            AppError::MaxTurnsExceeded(_)
            | AppError::ToolArguments { .. }
            | AppError::Config(_)
            | AppError::Storage(_)
            | AppError::Template(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(AppError::SessionNotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Llm("down".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::GuardrailTripwire {
                guardrail: "input_length".into(),
                reason: "too long".into(),
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::MaxTurnsExceeded(10).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! API error type and its mapping onto HTTP statuses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use wellspring_identity::SessionError;
use wellspring_verify::VerifyError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request shape problems caught before any flow state is touched.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("unauthorized: {0}")]
    Session(#[from] SessionError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Session(_) => StatusCode::UNAUTHORIZED,
            ApiError::Verify(e) => match e {
                VerifyError::MalformedCandidate { .. }
                | VerifyError::CodeMismatch
                | VerifyError::WeakPassword
                | VerifyError::Email(_) => StatusCode::UNPROCESSABLE_ENTITY,
                VerifyError::NoPending(_) | VerifyError::UnknownEmail(_) => StatusCode::NOT_FOUND,
                VerifyError::Expired(_) => StatusCode::GONE,
                VerifyError::AttemptsExhausted => StatusCode::TOO_MANY_REQUESTS,
                VerifyError::Delivery(_) => StatusCode::BAD_GATEWAY,
                VerifyError::EmailTaken(_) => StatusCode::CONFLICT,
                VerifyError::BadCredentials => StatusCode::UNAUTHORIZED,
                VerifyError::Password(_) | VerifyError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (
                ApiError::Validation("missing email".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                VerifyError::CodeMismatch.into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                VerifyError::NoPending("t".into()).into(),
                StatusCode::NOT_FOUND,
            ),
            (VerifyError::Expired("t".into()).into(), StatusCode::GONE),
            (
                VerifyError::AttemptsExhausted.into(),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                VerifyError::Delivery("down".into()).into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                VerifyError::EmailTaken("a@b.com".into()).into(),
                StatusCode::CONFLICT,
            ),
            (
                VerifyError::BadCredentials.into(),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::Session(SessionError::Expired),
                StatusCode::UNAUTHORIZED,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err}");
        }
    }
}

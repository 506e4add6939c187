//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::model::encoder::UnknownCategory;
use crate::model::scorer::ScoreError;

/// Detail text of the 401 body
pub const INVALID_API_KEY: &str = "Invalid API Key";

/// Outcome of a failed prediction.
///
/// The wire format collapses every processing failure into one `{"error": ...}`
/// shape; keeping authorization separate lets callers tell the two apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    #[error("Invalid API Key")]
    Unauthorized,

    #[error("{message}")]
    Processing { message: String },
}

impl PredictError {
    pub fn processing(message: impl Into<String>) -> Self {
        PredictError::Processing { message: message.into() }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, PredictError::Unauthorized)
    }
}

impl From<UnknownCategory> for PredictError {
    fn from(err: UnknownCategory) -> Self {
        PredictError::processing(err.to_string())
    }
}

impl From<ScoreError> for PredictError {
    fn from(err: ScoreError) -> Self {
        PredictError::processing(err.to_string())
    }
}

impl From<serde_json::Error> for PredictError {
    fn from(err: serde_json::Error) -> Self {
        PredictError::processing(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// HTTP-facing error
#[derive(Debug)]
pub enum AppError {
    /// 401 `{"detail": "Invalid API Key"}`
    Unauthorized,

    /// `{"error": message}` sent with `status`
    Processing { message: String, status: StatusCode },
}

impl AppError {
    /// Map a prediction failure onto the wire. `legacy_status` keeps processing
    /// errors on HTTP 200 the way existing clients expect.
    pub fn from_predict(err: PredictError, legacy_status: bool) -> Self {
        match err {
            PredictError::Unauthorized => AppError::Unauthorized,
            PredictError::Processing { message } => AppError::Processing {
                message,
                status: if legacy_status {
                    StatusCode::OK
                } else {
                    StatusCode::UNPROCESSABLE_ENTITY
                },
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": INVALID_API_KEY })),
            )
                .into_response(),
            AppError::Processing { message, status } => {
                (status, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_status_follows_legacy_flag() {
        let err = PredictError::processing("boom");
        match AppError::from_predict(err.clone(), true) {
            AppError::Processing { status, message } => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected {:?}", other),
        }
        match AppError::from_predict(err, false) {
            AppError::Processing { status, .. } => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unauthorized_response() {
        let response = AppError::from_predict(PredictError::Unauthorized, true).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_display() {
        assert_eq!(PredictError::Unauthorized.to_string(), "Invalid API Key");
        assert_eq!(PredictError::processing("bad input").to_string(), "bad input");
        assert!(PredictError::Unauthorized.is_unauthorized());
    }
}

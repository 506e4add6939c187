//! Prediction handler

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};

use crate::middleware::auth::presented_key;
use crate::models::PredictionResult;
use crate::{AppError, AppResult, AppState};

/// `POST /predict`
///
/// The body is taken raw so that decoding failures come back in the same
/// `{"error": ...}` shape as every other processing failure.
pub async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<PredictionResult>> {
    state
        .predictor
        .predict_json(&body, presented_key(&headers))
        .map(Json)
        .map_err(|err| {
            if !err.is_unauthorized() {
                tracing::warn!("Prediction failed: {}", err);
            }
            AppError::from_predict(err, state.config.legacy_error_status)
        })
}

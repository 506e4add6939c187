//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::features::LayoutInfo;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    model: ModelStatus,
}

#[derive(Serialize)]
pub struct ModelStatus {
    scorer: &'static str,
    feature_layout: LayoutInfo,
    product_types: usize,
    packaging_types: usize,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let artifacts = state.predictor.artifacts();

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        model: ModelStatus {
            scorer: artifacts.scorer.kind(),
            feature_layout: LayoutInfo::current(),
            product_types: artifacts.product_encoder.vocabulary_size(),
            packaging_types: artifacts.packaging_encoder.vocabulary_size(),
        },
    })
}

//! UrbanFlux Spoilage Prediction API
//!
//! Scores one shipment record per request and returns a spoilage-risk
//! probability with a HIGH / MEDIUM / LOW tier.
//!
//! # Request flow
//!
//! ```text
//! POST /predict
//!   │
//!   ├─ api-key check ───────────────────────────────▶ 401 {"detail": ...}
//!   ├─ decode body
//!   ├─ encode product_type / packaging_type
//!   ├─ derive storage_duration, transit_stress
//!   ├─ assemble vector (features::layout order)
//!   ├─ classifier → p(spoiled)
//!   └─ tier + round ────────────────────────────────▶ 200 {"spoilage_risk_probability", "risk_level"}
//!        (any failure above, after auth) ───────────▶ 200 {"error": ...}
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod handlers;
pub mod middleware;
pub mod model;
pub mod models;
pub mod predictor;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::{AppError, AppResult, PredictError};
pub use predictor::Predictor;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(predictor: Predictor, config: Config) -> Self {
        Self {
            predictor: Arc::new(predictor),
            config: Arc::new(config),
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check));

    // Prediction routes (api-key auth, checked before the body is read)
    let prediction_routes = Router::new()
        .route("/predict", post(handlers::predict::predict))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_api_key,
        ));

    Router::new()
        .merge(public_routes)
        .merge(prediction_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

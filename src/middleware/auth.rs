//! API key middleware

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::{AppError, AppState};

/// Header carrying the key
pub const API_KEY_HEADER: &str = "api-key";

/// Underscore spelling, accepted as well
pub const API_KEY_HEADER_ALIAS: &str = "api_key";

/// Key presented by the client, if any
pub fn presented_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .or_else(|| headers.get(API_KEY_HEADER_ALIAS))
        .and_then(|v| v.to_str().ok())
}

/// Middleware: reject requests without the configured API key before the
/// body is read
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Err(err) = state.predictor.authorize(presented_key(req.headers())) {
        tracing::warn!("Rejected {} {}: invalid API key", req.method(), req.uri().path());
        return Err(AppError::from_predict(err, state.config.legacy_error_status));
    }

    Ok(next.run(req).await)
}

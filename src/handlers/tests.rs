//! Router-level tests for /predict and /health

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::config::Config;
use crate::model::scorer::{ForestScorer, ScoreError};
use crate::model::Scorer;
use crate::predictor::tests::{artifacts, constant, record, KEY};
use crate::predictor::Predictor;
use crate::{create_router, AppState};

fn app_with(scorer: Box<dyn Scorer>, legacy_error_status: bool) -> Router {
    let config = Config {
        api_key: Some(KEY.to_string()),
        legacy_error_status,
        ..Config::default()
    };
    let predictor = Predictor::new(artifacts(scorer), config.api_key.clone());
    create_router(AppState::new(predictor, config))
}

fn app(probability: f64) -> Router {
    app_with(constant(probability), true)
}

fn predict_request(key: Option<(&str, &str)>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json");
    if let Some((name, value)) = key {
        builder = builder.header(name, value);
    }
    builder.body(body.into()).unwrap()
}

fn valid_body() -> String {
    serde_json::to_string(&record()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_predict_success() {
    let (status, body) = send(app(0.8123), predict_request(Some(("api-key", KEY)), valid_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"spoilage_risk_probability": 0.812, "risk_level": "HIGH"}));
}

#[tokio::test]
async fn test_underscore_header_accepted() {
    let (status, body) = send(app(0.5), predict_request(Some(("api_key", KEY)), valid_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk_level"], "MEDIUM");
}

#[tokio::test]
async fn test_wrong_or_missing_key_is_401() {
    for key in [None, Some(("api-key", "")), Some(("api-key", "nope"))] {
        let (status, body) = send(app(0.5), predict_request(key, valid_body())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{:?}", key);
        assert_eq!(body, json!({"detail": "Invalid API Key"}));
    }
}

#[tokio::test]
async fn test_auth_checked_before_body() {
    let (status, body) = send(app(0.5), predict_request(Some(("api-key", "nope")), "{garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid API Key");

    let (status, _) = send(app(0.5), predict_request(None, "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_body_is_legacy_error() {
    let (status, body) = send(app(0.5), predict_request(Some(("api-key", KEY)), "{garbage")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].is_string(), "{}", body);
}

#[tokio::test]
async fn test_missing_field_is_legacy_error() {
    let mut payload = serde_json::to_value(record()).unwrap();
    payload.as_object_mut().unwrap().remove("shelf_life");
    let (status, body) = send(app(0.5), predict_request(Some(("api-key", KEY)), payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].as_str().unwrap().contains("shelf_life"), "{}", body);
}

#[tokio::test]
async fn test_unknown_category_is_legacy_error() {
    let mut payload = serde_json::to_value(record()).unwrap();
    payload["packaging_type"] = json!("Glass");
    let (status, body) = send(app(0.5), predict_request(Some(("api-key", KEY)), payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("packaging_type"), "{}", message);
    assert!(message.contains("Glass"), "{}", message);
    assert!(body.get("risk_level").is_none());
}

#[tokio::test]
async fn test_processing_error_status_when_legacy_disabled() {
    let mut payload = serde_json::to_value(record()).unwrap();
    payload["product_type"] = json!("Seafood");
    let app = app_with(constant(0.5), false);
    let (status, body) = send(app, predict_request(Some(("api-key", KEY)), payload.to_string())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_model_failure_is_legacy_error() {
    let failing = |_: &crate::features::FeatureVector| -> Result<f64, ScoreError> {
        Err(ScoreError::Inference("backend unavailable".to_string()))
    };
    let app = app_with(Box::new(failing), true);
    let (status, body) = send(app, predict_request(Some(("api-key", KEY)), valid_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "model invocation failed: backend unavailable"}));
}

#[tokio::test]
async fn test_value_too_large_for_f32_is_legacy_error() {
    let mut payload = serde_json::to_value(record()).unwrap();
    payload["temperature"] = json!(1e39);
    let (status, body) = send(app(0.5), predict_request(Some(("api-key", KEY)), payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].as_str().unwrap().contains("temperature"), "{}", body);
    assert!(body.get("risk_level").is_none());
}

#[tokio::test]
async fn test_numeric_strings_are_coerced() {
    let mut payload = serde_json::to_value(record()).unwrap();
    payload["temperature"] = json!("10");
    payload["travel_time"] = json!(2);
    let (status, body) = send(app(0.3), predict_request(Some(("api-key", KEY)), payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk_level"], "LOW");
}

#[tokio::test]
async fn test_get_predict_not_allowed() {
    let request = Request::builder().uri("/predict").body(Body::empty()).unwrap();
    let response = app(0.5).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_forest_end_to_end() {
    let artifact = crate::model::scorer::tests::two_stump_forest().to_string();
    let forest = ForestScorer::from_json(artifact.as_bytes()).unwrap();
    let app = app_with(Box::new(forest), true);

    // temperature 10 > 8 → 0.8, transit_stress 50 <= 100 → 0.5
    let (status, body) = send(app, predict_request(Some(("api-key", KEY)), valid_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"spoilage_risk_probability": 0.65, "risk_level": "MEDIUM"}));
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(0.5), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"]["scorer"], "custom");
    assert_eq!(body["model"]["product_types"], 3);
    assert_eq!(body["model"]["packaging_types"], 5);
    assert_eq!(body["model"]["feature_layout"]["feature_count"], 8);
}

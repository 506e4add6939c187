//! UrbanFlux Spoilage Prediction API server

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use urbanflux_spoilage::features::LayoutInfo;
use urbanflux_spoilage::model::ModelArtifacts;
use urbanflux_spoilage::{create_router, AppState, Config, Predictor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "urbanflux_spoilage=debug,spoilage_api=debug,tower_http=debug".into());
    if config.json_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("UrbanFlux Spoilage Prediction API starting ({})...", config.environment);

    if config.api_key.is_none() {
        if config.is_production() {
            anyhow::bail!("API_KEY must be set in production");
        }
        tracing::warn!("API_KEY is not set: every /predict request will be rejected");
    }

    let layout = LayoutInfo::current();
    tracing::info!(
        "Feature layout v{} (hash {:08x}): {}",
        layout.version,
        layout.hash,
        layout.feature_names.join(", ")
    );

    // Artifacts are required; the service cannot answer without them
    let artifacts = ModelArtifacts::load(&config).context("Failed to load model artifacts")?;

    let addr = config.bind_addr();
    let predictor = Predictor::new(artifacts, config.api_key.clone());
    let app = create_router(AppState::new(predictor, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

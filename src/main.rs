use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wraith::config::Config;
use wraith::services::{HttpModelAdapter, ModelStatus, SessionStore};
use wraith::{api, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wraith=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!("Starting Wraith server on {}:{}", config.host, config.port);

    // Load the model artifact once; a failure leaves every session not-ready
    let status = ModelStatus::load(&config.model.dir);
    match &status {
        ModelStatus::Loaded(_) => info!(
            "Model ready: {} backend via {}",
            config.model.backend, config.model.endpoint
        ),
        ModelStatus::Failed(reason) => info!("Serving without a model: {}", reason),
    }

    let model_config = config.model.clone();
    let sessions = SessionStore::new(status, config.pipeline.clone(), move || {
        HttpModelAdapter::new(&model_config)
    });

    let state = AppState {
        config: config.clone(),
        sessions,
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = api::router::<HttpModelAdapter>()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Wraith server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

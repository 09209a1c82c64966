mod config;
mod error;
mod llm;

use axum::{
    extract::rejection::JsonRejection,
    routing::{get, post},
    Json, Router,
};
use config::Config;
use error::RelayError;
use llm::LlmService;
use recipe_relay_shared::{ChatRequest, ChatResponse, HealthStatus, DEFAULT_MODEL};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let config = Config::from_env()?;
    let cors = config.cors_layer()?;
    let llm_service = Arc::new(LlmService::new(&config)?);
    info!("Default model: {}", DEFAULT_MODEL);

    let app = app(llm_service, cors);

    info!("Server listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_line_number(true)
        .init();
}

fn app(llm_service: Arc<LlmService>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate-recipe", post({
            let llm = llm_service.clone();
            move |body| generate_recipe(body, llm)
        }))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::ok())
}

async fn generate_recipe(
    body: Result<Json<ChatRequest>, JsonRejection>,
    llm_service: Arc<LlmService>,
) -> Result<Json<ChatResponse>, RelayError> {
    // Credential first: a misconfigured server answers 500 whatever the body.
    llm_service.api_key()?;

    let Json(request) = body.map_err(|rejection| RelayError::InvalidRequest {
        status: rejection.status(),
        detail: rejection.body_text(),
    })?;
    request.validate().map_err(RelayError::invalid)?;

    let response = llm_service.complete(&request).await?;
    Ok(Json(response))
}

//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{FileStorage, MockGenerationAdapter, OpenAiGenerationAdapter},
    config::{Config, GeneratorKind},
    error::ApiError,
    web::{
        build_router,
        rest::ApiDoc,
        state::{AppState, StoreRegistry},
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    Router,
};
use doc_studio_core::{
    ports::GenerationService,
    rewrite::{RewriteEngine, SynonymTable},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn load_synonyms(config: &Config) -> Result<SynonymTable, ApiError> {
    let Some(path) = &config.synonyms_path else {
        return Ok(SynonymTable::default());
    };
    let raw = std::fs::read_to_string(path)?;
    let table = SynonymTable::from_json(&raw)?;
    info!(path = %path.display(), entries = table.len(), "Loaded synonym table.");
    Ok(table)
}

fn build_generator(config: &Config) -> Result<Arc<dyn GenerationService>, ApiError> {
    match config.generator {
        GeneratorKind::Mock => {
            info!(delay = ?config.generation_delay, "Using the mock generator.");
            Ok(Arc::new(MockGenerationAdapter::new(config.generation_delay)))
        }
        GeneratorKind::OpenAi => {
            let api_key = config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?;
            let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
            info!(model = %config.generation_model, "Using the OpenAI generator.");
            Ok(Arc::new(OpenAiGenerationAdapter::new(
                client,
                config.generation_model.clone(),
            )))
        }
    }
}

fn build_cors(config: &Config) -> Result<CorsLayer, ApiError> {
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static("x-user-id"),
            HeaderName::from_static("x-user-name"),
            HeaderName::from_static("x-user-email"),
        ]))
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open Document Storage ---
    let storage = Arc::new(FileStorage::new(&config.storage_dir)?);
    info!(dir = %storage.root().display(), "Document storage ready.");

    // --- 3. Initialize Service Adapters ---
    let generator = build_generator(&config)?;
    let rewrite_engine = Arc::new(RewriteEngine::new(load_synonyms(&config)?));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        generator,
        rewrite_engine,
        stores: Arc::new(StoreRegistry::new(storage)),
    });

    // --- 5. Create the Web Router ---
    let app = Router::new()
        .merge(build_router(app_state, build_cors(&config)?))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        ChatModel, DbAdapter, OfflineAdapter, OpenAiExplainAdapter, OpenAiFlashcardAdapter,
        OpenAiQuizAdapter, OpenAiSstAdapter, OpenAiSummaryAdapter,
    },
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let app_state = match config.openai_api_key.as_deref() {
        Some(api_key) => {
            let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
            let chat = |model: &str| ChatModel::new(client.clone(), model.to_string());
            AppState {
                db: db_adapter,
                config: config.clone(),
                quiz_adapter: Arc::new(OpenAiQuizAdapter::new(chat(&config.quiz_model))),
                flashcard_adapter: Arc::new(OpenAiFlashcardAdapter::new(chat(&config.flashcard_model))),
                summary_adapter: Arc::new(OpenAiSummaryAdapter::new(chat(&config.summary_model))),
                explain_adapter: Arc::new(OpenAiExplainAdapter::new(chat(&config.explain_model))),
                sst_adapter: Arc::new(OpenAiSstAdapter::new(client.clone(), config.sst_model.clone())),
            }
        }
        None => {
            warn!("OPENAI_API_KEY is not set; generation will use the built-in fallbacks");
            let offline = Arc::new(OfflineAdapter);
            AppState {
                db: db_adapter,
                config: config.clone(),
                quiz_adapter: offline.clone(),
                flashcard_adapter: offline.clone(),
                summary_adapter: offline.clone(),
                explain_adapter: offline.clone(),
                sst_adapter: offline,
            }
        }
    };

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    // --- 4. Create the Web Router ---
    let app = build_router(Arc::new(app_state));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

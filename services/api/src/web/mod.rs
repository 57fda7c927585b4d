pub mod auth;
pub mod explain;
pub mod feedback;
pub mod flashcards;
pub mod middleware;
pub mod quiz;
pub mod rest;
pub mod state;
pub mod stats;
pub mod summary;
pub mod uploads;

pub use middleware::require_auth;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use rest::ApiDoc;
use state::AppState;

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!("CORS origin '{}' is not a valid header value; allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}

/// Builds the complete application router: public routes, token-protected
/// routes, CORS, request tracing and the Swagger UI.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(rest::root_handler))
        .route("/users/signup", post(auth::signup_handler))
        .route("/users/login", post(auth::login_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/users/me", get(auth::me_handler))
        .route("/users/logout", post(auth::logout_handler))
        .route("/upload", post(uploads::upload_handler))
        .route("/uploads", get(uploads::list_uploads_handler))
        .route("/uploads/{file_id}", get(uploads::get_upload_handler))
        .route("/summary/{file_id}", get(summary::get_summary_handler))
        .route("/generate-summary/{file_id}", post(summary::generate_summary_handler))
        .route("/summarize", post(summary::summarize_handler))
        .route("/generate-quiz", post(quiz::generate_quiz_handler))
        .route("/quiz", get(quiz::list_quizzes_handler))
        .route("/quiz/{quiz_id}", get(quiz::get_quiz_handler))
        .route("/quiz/{quiz_id}/answer", post(quiz::submit_answer_handler))
        .route("/generate_flashcards", post(flashcards::generate_flashcards_handler))
        .route("/flashcards", get(flashcards::list_flashcards_handler))
        .route("/flashcards/{file_id}", get(flashcards::file_flashcards_handler))
        .route("/explain", post(explain::explain_handler))
        .route("/explain/{file_id}", get(explain::get_explanation_handler))
        .route("/feedback", post(feedback::submit_feedback_handler))
        .route("/feedback/{item_id}", get(feedback::item_feedback_handler))
        .route("/progress", get(stats::progress_handler))
        .route("/stats", get(stats::stats_handler))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    // Several files may share one multipart request.
    let body_limit = usize::try_from(state.config.max_upload_bytes.saturating_mul(10)).unwrap_or(usize::MAX);

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(&state.config.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

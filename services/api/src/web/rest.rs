//! services/api/src/web/rest.rs
//!
//! Shared REST plumbing: the master OpenAPI definition, the service banner,
//! listing parameters and helpers used by several handler modules.

use crate::error::HttpError;
use crate::web::{auth, explain, feedback, flashcards, quiz, stats, summary, uploads};
use axum::{body::Bytes, response::Json};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use study_assistant_core::listing::{Pagination, RawListParams};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    IntoParams, Modify, OpenApi, ToSchema,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        root_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::me_handler,
        auth::logout_handler,
        uploads::upload_handler,
        uploads::list_uploads_handler,
        uploads::get_upload_handler,
        summary::get_summary_handler,
        summary::generate_summary_handler,
        summary::summarize_handler,
        quiz::generate_quiz_handler,
        quiz::list_quizzes_handler,
        quiz::get_quiz_handler,
        quiz::submit_answer_handler,
        flashcards::generate_flashcards_handler,
        flashcards::list_flashcards_handler,
        flashcards::file_flashcards_handler,
        explain::explain_handler,
        explain::get_explanation_handler,
        feedback::submit_feedback_handler,
        feedback::item_feedback_handler,
        stats::progress_handler,
        stats::stats_handler,
    ),
    components(schemas(
        ServiceInfo,
        PaginationResponse,
        auth::SignupRequest,
        auth::LoginRequest,
        auth::UserResponse,
        auth::AuthResponse,
        auth::MeResponse,
        auth::MessageResponse,
        uploads::FileResponse,
        uploads::UploadErrorEntry,
        uploads::UploadResponse,
        uploads::FileListResponse,
        summary::SummaryOptions,
        summary::SummarizeRequest,
        summary::SummaryResponse,
        summary::StoredSummaryResponse,
        quiz::GenerateQuizRequest,
        quiz::GenerateQuizResponse,
        quiz::SubmitAnswerRequest,
        quiz::SubmitAnswerResponse,
        quiz::QuizResponse,
        quiz::QuizListResponse,
        flashcards::GenerateFlashcardsRequest,
        flashcards::GenerateFlashcardsResponse,
        flashcards::FlashcardListResponse,
        flashcards::FileFlashcardsResponse,
        explain::ExplainRequest,
        explain::ExplanationResponse,
        feedback::FeedbackRequest,
        feedback::FeedbackCreatedResponse,
        feedback::ItemFeedbackResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Study Assistant API", description = "Uploads, summaries, quizzes, flashcards and study statistics.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

//=========================================================================================
// Shared Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

/// Query string accepted by the quiz and flashcard listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// 1-based page number.
    pub page: Option<i64>,
    /// Page size, 1 to 100.
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub lecture: Option<String>,
    /// `Easy`, `Medium`, `Hard` or `all`.
    pub difficulty: Option<String>,
    /// `YYYY-MM-DD`, matching items created that UTC day.
    pub date: Option<String>,
}

impl From<ListParams> for RawListParams {
    fn from(p: ListParams) -> Self {
        RawListParams {
            page: p.page,
            limit: p.limit,
            search: p.search,
            lecture: p.lecture,
            difficulty: p.difficulty,
            date: p.date,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginationResponse {
    pub page: u32,
    pub limit: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl From<Pagination> for PaginationResponse {
    fn from(p: Pagination) -> Self {
        Self {
            page: p.page,
            limit: p.limit,
            total_count: p.total_count,
            total_pages: p.total_pages,
            has_next: p.has_next,
            has_prev: p.has_prev,
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Parses an optional JSON body. An empty body yields `T::default()`.
pub(crate) fn parse_optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, HttpError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| HttpError::bad_request(format!("Invalid JSON body: {}", e)))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Service banner listing the available endpoints.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service banner", body = ServiceInfo))
)]
pub async fn root_handler() -> Json<ServiceInfo> {
    let endpoints = [
        "POST /users/signup",
        "POST /users/login",
        "GET /users/me",
        "POST /users/logout",
        "POST /upload",
        "GET /uploads",
        "GET /uploads/{file_id}",
        "GET /summary/{file_id}",
        "POST /generate-summary/{file_id}",
        "POST /summarize",
        "POST /generate-quiz",
        "GET /quiz",
        "GET /quiz/{quiz_id}",
        "POST /quiz/{quiz_id}/answer",
        "POST /generate_flashcards",
        "GET /flashcards",
        "GET /flashcards/{file_id}",
        "POST /explain",
        "GET /explain/{file_id}",
        "POST /feedback",
        "GET /feedback/{item_id}",
        "GET /progress",
        "GET /stats",
    ];
    Json(ServiceInfo {
        message: "Study Assistant API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
    })
}

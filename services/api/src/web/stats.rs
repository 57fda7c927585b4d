//! services/api/src/web/stats.rs
//!
//! Progress report and summary statistics for the caller.

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use std::sync::Arc;
use study_assistant_core::progress::{build_progress, stats_summary, ProgressReport, StatsSummary};
use tracing::debug;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::state::AppState;

/// Quiz and flashcard activity, per-day accuracy and study recommendations.
#[utoipa::path(
    get,
    path = "/progress",
    responses(
        (status = 200, description = "The caller's progress report", body = serde_json::Value),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = []))
)]
pub async fn progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<ProgressReport>, HttpError> {
    let quizzes = state.db.quiz_overviews(user_id).await?;
    let answers = state.db.answer_history(user_id).await?;
    let flashcards = state.db.flashcard_activity(user_id).await?;
    debug!(
        "Building progress for {} from {} quizzes, {} answers, {} flashcards",
        user_id,
        quizzes.len(),
        answers.len(),
        flashcards.len()
    );
    Ok(Json(build_progress(&quizzes, &answers, &flashcards, Utc::now())))
}

/// Totals plus the average feedback rating and the latest feedback entries.
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Summary statistics", body = serde_json::Value),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = []))
)]
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<StatsSummary>, HttpError> {
    let quizzes = state.db.quiz_overviews(user_id).await?;
    let flashcards = state.db.flashcard_activity(user_id).await?;
    let feedback = state.db.feedback_by_user(user_id).await?;
    Ok(Json(stats_summary(quizzes.len(), flashcards.len(), &feedback)))
}

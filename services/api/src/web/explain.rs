//! services/api/src/web/explain.rs
//!
//! "Explain difficult parts": flags hard passages of a file and explains each one.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_assistant_core::complexity::{ComplexityAnalyzer, FALLBACK_EXPLANATION};
use study_assistant_core::domain::{ExplainedPassage, Explanation};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::state::AppState;
use crate::web::uploads::owned_file;

#[derive(Deserialize, ToSchema)]
pub struct ExplainRequest {
    pub file_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct PassageResponse {
    pub passage: String,
    pub score: f64,
    pub reasons: Vec<String>,
    pub explanation: String,
}

#[derive(Serialize, ToSchema)]
pub struct ExplanationResponse {
    pub id: Uuid,
    pub file_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub passage_count: usize,
    pub passages: Vec<PassageResponse>,
}

impl From<Explanation> for ExplanationResponse {
    fn from(e: Explanation) -> Self {
        Self {
            id: e.id,
            file_id: e.file_id,
            created_at: e.created_at,
            passage_count: e.passages.len(),
            passages: e
                .passages
                .into_iter()
                .map(|p| PassageResponse {
                    passage: p.passage,
                    score: p.score,
                    reasons: p.reasons,
                    explanation: p.explanation,
                })
                .collect(),
        }
    }
}

/// Analyze a file and explain its most difficult passages.
///
/// A passage whose explanation fails gets a fixed placeholder instead of
/// failing the request.
#[utoipa::path(
    post,
    path = "/explain",
    request_body = ExplainRequest,
    responses(
        (status = 201, description = "Explanation generated", body = ExplanationResponse),
        (status = 400, description = "The file has no extracted text"),
        (status = 404, description = "No such file for this user")
    ),
    security(("bearer" = []))
)]
pub async fn explain_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<ExplainRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let file = owned_file(&state, user_id, req.file_id).await?;
    let text = file
        .study_text()
        .ok_or_else(|| HttpError::bad_request("No extracted text available for this file"))?;

    let analyzer = ComplexityAnalyzer::default();
    let difficult = analyzer.top_passages(text, state.config.explain_max_passages);

    let mut passages = Vec::with_capacity(difficult.len());
    for part in difficult {
        let explanation = match state.explain_adapter.explain_passage(&part.sentence).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => FALLBACK_EXPLANATION.to_string(),
            Err(e) => {
                warn!("Explanation failed for a passage of file {}: {}", file.id, e);
                FALLBACK_EXPLANATION.to_string()
            }
        };
        passages.push(ExplainedPassage {
            passage: part.sentence,
            score: part.score,
            reasons: part.reasons,
            explanation,
        });
    }

    let explanation = Explanation {
        id: Uuid::new_v4(),
        user_id,
        file_id: file.id,
        passages,
        created_at: Utc::now(),
    };
    state.db.save_explanation(explanation.clone()).await?;
    info!(
        "Explained {} passages of file {}",
        explanation.passages.len(),
        file.id
    );

    Ok((StatusCode::CREATED, Json(ExplanationResponse::from(explanation))))
}

/// The most recent explanation generated for a file.
#[utoipa::path(
    get,
    path = "/explain/{file_id}",
    params(("file_id" = Uuid, Path, description = "The explained file.")),
    responses(
        (status = 200, description = "Latest explanation", body = ExplanationResponse),
        (status = 404, description = "No such file, or it was never explained")
    ),
    security(("bearer" = []))
)]
pub async fn get_explanation_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ExplanationResponse>, HttpError> {
    owned_file(&state, user_id, file_id).await?;
    let explanation = state.db.latest_explanation(user_id, file_id).await?;
    Ok(Json(explanation.into()))
}

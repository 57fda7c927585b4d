//! services/api/src/web/flashcards.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_assistant_core::domain::Flashcard;
use study_assistant_core::generation::{
    fallback_flashcards, GenerationSource, FLASHCARD_DECK_SIZE, MIN_CONTENT_CHARS,
};
use study_assistant_core::listing::ListQuery;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::rest::{ListParams, PaginationResponse};
use crate::web::state::AppState;
use crate::web::uploads::owned_file;

#[derive(Deserialize, ToSchema)]
pub struct GenerateFlashcardsRequest {
    pub file_id: Option<Uuid>,
    pub content: Option<String>,
    pub lecture_title: Option<String>,
}

#[derive(Clone, Serialize, ToSchema)]
pub struct FlashcardResponse {
    pub id: Uuid,
    pub file_id: Option<Uuid>,
    pub lecture_title: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl From<Flashcard> for FlashcardResponse {
    fn from(card: Flashcard) -> Self {
        Self {
            id: card.id,
            file_id: card.file_id,
            lecture_title: card.lecture_title,
            question: card.question,
            answer: card.answer,
            created_at: card.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct GenerateFlashcardsResponse {
    pub message: String,
    pub source: String,
    pub flashcards: Vec<FlashcardResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct FlashcardListResponse {
    pub flashcards: Vec<FlashcardResponse>,
    pub pagination: PaginationResponse,
}

#[derive(Serialize, ToSchema)]
pub struct FileFlashcardsResponse {
    pub file_id: Uuid,
    pub flashcards: Vec<FlashcardResponse>,
}

/// Generate a deck of flashcards from an uploaded file or from inline content.
///
/// Inline `content` wins over the file's text when both are given.
#[utoipa::path(
    post,
    path = "/generate_flashcards",
    request_body = GenerateFlashcardsRequest,
    responses(
        (status = 201, description = "Flashcards generated", body = GenerateFlashcardsResponse),
        (status = 400, description = "No usable content"),
        (status = 404, description = "The referenced file does not exist")
    ),
    security(("bearer" = []))
)]
pub async fn generate_flashcards_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<GenerateFlashcardsRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let file = match req.file_id {
        Some(file_id) => Some(owned_file(&state, user_id, file_id).await?),
        None => None,
    };

    let inline = req.content.filter(|c| !c.trim().is_empty());
    let content = match (inline, file.as_ref()) {
        (Some(text), _) => text,
        (None, Some(file)) => file
            .study_text()
            .map(str::to_string)
            .ok_or_else(|| HttpError::bad_request("No content available for this file"))?,
        (None, None) => return Err(HttpError::bad_request("Either file_id or content is required")),
    };
    let content = content.trim();
    if content.chars().count() < MIN_CONTENT_CHARS {
        return Err(HttpError::bad_request("Content too short to generate flashcards"));
    }

    let lecture_title = req
        .lecture_title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| file.as_ref().map(|f| f.original_name.clone()))
        .unwrap_or_else(|| "Flashcards".to_string());

    let (drafts, source) = match state.flashcard_adapter.generate_flashcards(content).await {
        Ok(drafts) if !drafts.is_empty() => (drafts, GenerationSource::Llm),
        outcome => {
            if let Err(e) = outcome {
                warn!("Flashcard model unavailable ({}); using fallback", e);
            }
            let drafts = fallback_flashcards(content).map_err(|e| HttpError::bad_request(e.to_string()))?;
            (drafts, GenerationSource::Fallback)
        }
    };

    let now = Utc::now();
    let flashcards: Vec<Flashcard> = drafts
        .into_iter()
        .take(FLASHCARD_DECK_SIZE)
        .map(|draft| Flashcard {
            id: Uuid::new_v4(),
            user_id,
            file_id: req.file_id,
            lecture_title: lecture_title.clone(),
            question: draft.question,
            answer: draft.answer,
            created_at: now,
        })
        .collect();
    state.db.save_flashcards(flashcards.clone()).await?;
    info!("Generated {} flashcards ({})", flashcards.len(), source.as_str());

    Ok((
        StatusCode::CREATED,
        Json(GenerateFlashcardsResponse {
            message: "Flashcards generated successfully".to_string(),
            source: source.as_str().to_string(),
            flashcards: flashcards.into_iter().map(FlashcardResponse::from).collect(),
        }),
    ))
}

/// List the caller's flashcards with filters and pagination.
#[utoipa::path(
    get,
    path = "/flashcards",
    params(ListParams),
    responses(
        (status = 200, description = "One page of flashcards", body = FlashcardListResponse),
        (status = 400, description = "Invalid date filter")
    ),
    security(("bearer" = []))
)]
pub async fn list_flashcards_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<Json<FlashcardListResponse>, HttpError> {
    let query = ListQuery::from_raw(params.into())?;
    let page = state.db.list_flashcards(user_id, &query).await?;
    Ok(Json(FlashcardListResponse {
        flashcards: page.items.into_iter().map(FlashcardResponse::from).collect(),
        pagination: page.pagination.into(),
    }))
}

/// All flashcards generated from one file.
#[utoipa::path(
    get,
    path = "/flashcards/{file_id}",
    params(("file_id" = Uuid, Path, description = "The source file.")),
    responses(
        (status = 200, description = "The file's flashcards", body = FileFlashcardsResponse),
        (status = 404, description = "No such file for this user")
    ),
    security(("bearer" = []))
)]
pub async fn file_flashcards_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<FileFlashcardsResponse>, HttpError> {
    owned_file(&state, user_id, file_id).await?;
    let cards = state.db.flashcards_for_file(user_id, file_id).await?;
    Ok(Json(FileFlashcardsResponse {
        file_id,
        flashcards: cards.into_iter().map(FlashcardResponse::from).collect(),
    }))
}

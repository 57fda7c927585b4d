//! services/api/src/web/summary.rs
//!
//! Summary endpoints. The model is tried first; the extractive summarizer
//! answers whenever it is unavailable.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_assistant_core::generation::GenerationSource;
use study_assistant_core::summary::{
    clean_text, extractive_summary, SummaryLength, MIN_SUMMARY_INPUT_CHARS, TOO_SHORT_MESSAGE,
};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::rest::parse_optional_json;
use crate::web::state::AppState;
use crate::web::uploads::owned_file;

#[derive(Deserialize, Default, ToSchema)]
pub struct SummaryOptions {
    /// `brief`, `detailed` (default) or `comprehensive`.
    pub summary_type: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub text: String,
    pub summary_type: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    pub file_id: Option<Uuid>,
    pub summary: String,
    pub summary_type: String,
    pub source: String,
    pub word_count: usize,
}

#[derive(Serialize, ToSchema)]
pub struct StoredSummaryResponse {
    pub file_id: Uuid,
    pub original_name: String,
    pub summary: String,
}

fn parse_length(raw: Option<&str>) -> Result<SummaryLength, HttpError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(label) => label.parse().map_err(HttpError::bad_request),
        None => Ok(SummaryLength::default()),
    }
}

/// Summarizes `text`, falling back to the extractive summary on any model failure.
/// Returns `None` when the text is too short to summarize.
pub(crate) async fn summarize_text(
    state: &AppState,
    text: &str,
    length: SummaryLength,
) -> Option<(String, GenerationSource)> {
    let cleaned = clean_text(text);
    if cleaned.chars().count() < MIN_SUMMARY_INPUT_CHARS {
        return None;
    }
    let summarized = match state.summary_adapter.summarize(&cleaned, length).await {
        Ok(summary) if !summary.trim().is_empty() => (summary, GenerationSource::Llm),
        Ok(_) => {
            warn!("Summary model returned an empty summary; using extractive fallback");
            (extractive_summary(&cleaned, length), GenerationSource::Fallback)
        }
        Err(e) => {
            warn!("Summary model unavailable ({}); using extractive fallback", e);
            (extractive_summary(&cleaned, length), GenerationSource::Fallback)
        }
    };
    Some(summarized)
}

fn too_short(file_id: Option<Uuid>, length: SummaryLength) -> SummaryResponse {
    response(file_id, TOO_SHORT_MESSAGE.to_string(), length, GenerationSource::Fallback)
}

fn response(file_id: Option<Uuid>, summary: String, length: SummaryLength, source: GenerationSource) -> SummaryResponse {
    SummaryResponse {
        file_id,
        word_count: summary.split_whitespace().count(),
        summary,
        summary_type: length.as_str().to_string(),
        source: source.as_str().to_string(),
    }
}

/// Fetch the stored summary of a file.
#[utoipa::path(
    get,
    path = "/summary/{file_id}",
    params(("file_id" = Uuid, Path, description = "The summarized file.")),
    responses(
        (status = 200, description = "The stored summary", body = StoredSummaryResponse),
        (status = 404, description = "No such file, or it has no summary yet")
    ),
    security(("bearer" = []))
)]
pub async fn get_summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<StoredSummaryResponse>, HttpError> {
    let file = owned_file(&state, user_id, file_id).await?;
    let summary = file
        .summary
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| HttpError::not_found("No summary available for this file"))?;
    Ok(Json(StoredSummaryResponse {
        file_id,
        original_name: file.original_name,
        summary,
    }))
}

/// (Re)generate and store the summary of an uploaded file.
#[utoipa::path(
    post,
    path = "/generate-summary/{file_id}",
    params(("file_id" = Uuid, Path, description = "The file to summarize.")),
    request_body(content = SummaryOptions, description = "Optional; defaults to a detailed summary."),
    responses(
        (status = 200, description = "Summary generated", body = SummaryResponse),
        (status = 400, description = "Unknown summary type, or the file has no extracted text"),
        (status = 404, description = "No such file")
    ),
    security(("bearer" = []))
)]
pub async fn generate_summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(file_id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<SummaryResponse>, HttpError> {
    let options: SummaryOptions = parse_optional_json(&body)?;
    let length = parse_length(options.summary_type.as_deref())?;

    let file = owned_file(&state, user_id, file_id).await?;
    let text = file
        .content
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| HttpError::bad_request("No extracted text available for this file"))?;

    let Some((summary, source)) = summarize_text(&state, text, length).await else {
        info!("File {} is too short to summarize; nothing stored", file_id);
        return Ok(Json(too_short(Some(file_id), length)));
    };
    state.db.update_file_summary(file_id, &summary).await?;
    info!("Generated {} summary for file {} ({})", length, file_id, source.as_str());

    Ok(Json(response(Some(file_id), summary, length, source)))
}

/// Summarize free text without storing anything.
#[utoipa::path(
    post,
    path = "/summarize",
    request_body = SummarizeRequest,
    responses(
        (status = 200, description = "Summary generated", body = SummaryResponse),
        (status = 400, description = "Missing text or unknown summary type")
    ),
    security(("bearer" = []))
)]
pub async fn summarize_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummarizeRequest>,
) -> Result<Json<SummaryResponse>, HttpError> {
    if req.text.trim().is_empty() {
        return Err(HttpError::bad_request("No text provided"));
    }
    let length = parse_length(req.summary_type.as_deref())?;
    match summarize_text(&state, &req.text, length).await {
        Some((summary, source)) => Ok(Json(response(None, summary, length, source))),
        None => Ok(Json(too_short(None, length))),
    }
}

//! services/api/src/web/feedback.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_assistant_core::domain::Feedback;
use study_assistant_core::progress::average_rating;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct FeedbackRequest {
    /// What is being rated, e.g. `quiz`, `flashcard` or `summary`.
    #[serde(rename = "type", default)]
    pub category: String,
    #[serde(default)]
    pub item_id: String,
    pub rating: i64,
    pub comment: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct FeedbackCreatedResponse {
    pub message: String,
    pub feedback_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct FeedbackEntryResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub category: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct ItemFeedbackResponse {
    pub item_id: String,
    pub feedback: Vec<FeedbackEntryResponse>,
    pub average_rating: f64,
    pub count: usize,
}

/// Checks the fields of a feedback submission and returns the rating.
fn validate(req: &FeedbackRequest) -> Result<u8, HttpError> {
    if req.category.trim().is_empty() || req.item_id.trim().is_empty() {
        return Err(HttpError::bad_request("type and item_id are required"));
    }
    match u8::try_from(req.rating) {
        Ok(rating @ 1..=5) => Ok(rating),
        _ => Err(HttpError::bad_request("Rating must be between 1 and 5")),
    }
}

/// Rate a generated item.
#[utoipa::path(
    post,
    path = "/feedback",
    request_body = FeedbackRequest,
    responses(
        (status = 201, description = "Feedback recorded", body = FeedbackCreatedResponse),
        (status = 400, description = "Missing field or rating outside 1..=5")
    ),
    security(("bearer" = []))
)]
pub async fn submit_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let rating = validate(&req)?;
    let feedback = Feedback {
        id: Uuid::new_v4(),
        user_id,
        category: req.category.trim().to_string(),
        item_id: req.item_id.trim().to_string(),
        rating,
        comment: req.comment.unwrap_or_default(),
        created_at: Utc::now(),
    };
    let feedback_id = feedback.id;
    state.db.save_feedback(feedback).await?;
    info!("Recorded feedback {} with rating {}", feedback_id, rating);

    Ok((
        StatusCode::CREATED,
        Json(FeedbackCreatedResponse {
            message: "Feedback submitted successfully".to_string(),
            feedback_id,
        }),
    ))
}

/// All feedback left for one item, with its average rating.
#[utoipa::path(
    get,
    path = "/feedback/{item_id}",
    params(("item_id" = String, Path, description = "The rated item.")),
    responses(
        (status = 200, description = "Feedback for the item", body = ItemFeedbackResponse)
    ),
    security(("bearer" = []))
)]
pub async fn item_feedback_handler(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
) -> Result<Json<ItemFeedbackResponse>, HttpError> {
    let entries = state.db.feedback_for_item(&item_id).await?;
    let average = average_rating(&entries);
    Ok(Json(ItemFeedbackResponse {
        item_id,
        count: entries.len(),
        average_rating: average,
        feedback: entries
            .into_iter()
            .map(|f| FeedbackEntryResponse {
                id: f.id,
                category: f.category,
                rating: f.rating,
                comment: f.comment,
                created_at: f.created_at,
            })
            .collect(),
    }))
}

//! services/api/src/web/quiz.rs
//!
//! Quiz generation, listing, retrieval and answer submission.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_assistant_core::domain::{
    Difficulty, Flashcard, NewQuiz, Quiz, QuizAnswer, QuizOverview, QuizQuestion,
};
use study_assistant_core::generation::{
    fallback_study_material, truncate_for_quiz, GenerationSource, StudyMaterial,
    QUIZ_FLASHCARD_TARGET, QUIZ_QUESTION_TARGET,
};
use study_assistant_core::listing::ListQuery;
use study_assistant_core::quiz_flow::score_percent;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::flashcards::FlashcardResponse;
use crate::web::rest::{ListParams, PaginationResponse};
use crate::web::state::AppState;
use crate::web::uploads::owned_file;

pub const DEFAULT_LECTURE_TITLE: &str = "Generated Quiz";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct GenerateQuizRequest {
    #[serde(default)]
    pub summary: String,
    pub lecture_title: Option<String>,
    pub difficulty: Option<String>,
    #[serde(default)]
    pub topic_tags: Vec<String>,
    pub file_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitAnswerRequest {
    pub question_index: usize,
    pub selected_answer: String,
    #[serde(default)]
    pub time_taken_ms: i64,
}

#[derive(Serialize, ToSchema)]
pub struct QuestionResponse {
    pub index: usize,
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Serialize, ToSchema)]
pub struct AnswerResponse {
    pub question_index: usize,
    pub selected_answer: String,
    pub is_correct: bool,
    pub time_taken_ms: i64,
    pub answered_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct QuizProgress {
    pub total_questions: usize,
    pub answered: usize,
    pub correct: usize,
    pub score_percent: u32,
}

impl QuizProgress {
    fn new(total_questions: usize, answered: usize, correct: usize) -> Self {
        Self {
            total_questions,
            answered,
            correct,
            score_percent: score_percent(correct, total_questions),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct QuizResponse {
    pub id: Uuid,
    pub file_id: Option<Uuid>,
    pub lecture_title: String,
    pub difficulty: String,
    pub topic_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub questions: Vec<QuestionResponse>,
    pub answers: Vec<AnswerResponse>,
    pub progress: QuizProgress,
}

impl From<Quiz> for QuizResponse {
    fn from(quiz: Quiz) -> Self {
        let correct = quiz.answers.iter().filter(|a| a.is_correct).count();
        let progress = QuizProgress::new(quiz.questions.len(), quiz.answers.len(), correct);
        Self {
            id: quiz.id,
            file_id: quiz.file_id,
            lecture_title: quiz.lecture_title,
            difficulty: quiz.difficulty.as_str().to_string(),
            topic_tags: quiz.topic_tags,
            created_at: quiz.created_at,
            completed_at: quiz.completed_at,
            questions: quiz
                .questions
                .into_iter()
                .map(|q| QuestionResponse {
                    index: q.position,
                    question: q.question,
                    options: q.options,
                    answer: q.answer,
                })
                .collect(),
            answers: quiz
                .answers
                .into_iter()
                .map(|a| AnswerResponse {
                    question_index: a.question_index,
                    selected_answer: a.selected_answer,
                    is_correct: a.is_correct,
                    time_taken_ms: a.time_taken_ms,
                    answered_at: a.answered_at,
                })
                .collect(),
            progress,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct QuizOverviewResponse {
    pub id: Uuid,
    pub file_id: Option<Uuid>,
    pub lecture_title: String,
    pub difficulty: String,
    pub topic_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress: QuizProgress,
}

impl From<QuizOverview> for QuizOverviewResponse {
    fn from(q: QuizOverview) -> Self {
        Self {
            id: q.id,
            file_id: q.file_id,
            lecture_title: q.lecture_title,
            difficulty: q.difficulty.as_str().to_string(),
            topic_tags: q.topic_tags,
            created_at: q.created_at,
            completed_at: q.completed_at,
            progress: QuizProgress::new(q.question_count, q.answered_count, q.correct_count),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct QuizListResponse {
    pub quizzes: Vec<QuizOverviewResponse>,
    pub pagination: PaginationResponse,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateQuizResponse {
    pub message: String,
    pub source: String,
    pub quiz: QuizResponse,
    pub flashcards: Vec<FlashcardResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct SubmitAnswerResponse {
    pub is_correct: bool,
    pub correct_answer: String,
    pub quiz_completed: bool,
    pub progress: QuizProgress,
}

//=========================================================================================
// Helpers
//=========================================================================================

async fn owned_quiz(state: &AppState, user_id: Uuid, quiz_id: Uuid) -> Result<Quiz, HttpError> {
    let quiz = state.db.get_quiz(quiz_id).await?;
    if quiz.user_id != user_id {
        return Err(HttpError::not_found(format!("Quiz {} not found", quiz_id)));
    }
    Ok(quiz)
}

/// Model output when it is good enough, otherwise the content-based generator.
async fn study_material_for(state: &AppState, content: &str) -> (StudyMaterial, GenerationSource) {
    match state.quiz_adapter.generate_study_material(content).await {
        Ok(material) if material.is_sufficient() => (material, GenerationSource::Llm),
        Ok(material) => {
            warn!(
                "Quiz model produced {} questions and {} flashcards; using fallback",
                material.questions.len(),
                material.flashcards.len()
            );
            (fallback_study_material(content), GenerationSource::Fallback)
        }
        Err(e) => {
            warn!("Quiz model unavailable ({}); using fallback", e);
            (fallback_study_material(content), GenerationSource::Fallback)
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Generate a quiz and companion flashcards from study text.
#[utoipa::path(
    post,
    path = "/generate-quiz",
    request_body = GenerateQuizRequest,
    responses(
        (status = 201, description = "Quiz and flashcards generated", body = GenerateQuizResponse),
        (status = 400, description = "Summary is required"),
        (status = 404, description = "The referenced file does not exist")
    ),
    security(("bearer" = []))
)]
pub async fn generate_quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, HttpError> {
    if req.summary.trim().is_empty() {
        return Err(HttpError::bad_request("Summary is required"));
    }
    if let Some(file_id) = req.file_id {
        owned_file(&state, user_id, file_id).await?;
    }

    let lecture_title = req
        .lecture_title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_LECTURE_TITLE.to_string());
    let difficulty = Difficulty::parse_or_default(req.difficulty.as_deref());
    let topic_tags: Vec<String> = req
        .topic_tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let content = truncate_for_quiz(req.summary.trim());
    let (material, source) = study_material_for(&state, content).await;

    let questions = material
        .questions
        .into_iter()
        .take(QUIZ_QUESTION_TARGET)
        .enumerate()
        .map(|(position, q)| QuizQuestion {
            position,
            question: q.question,
            options: q.options,
            answer: q.answer,
        })
        .collect();

    let now = Utc::now();
    let flashcards: Vec<Flashcard> = material
        .flashcards
        .into_iter()
        .take(QUIZ_FLASHCARD_TARGET)
        .map(|card| Flashcard {
            id: Uuid::new_v4(),
            user_id,
            file_id: req.file_id,
            lecture_title: lecture_title.clone(),
            question: card.question,
            answer: card.answer,
            created_at: now,
        })
        .collect();

    let quiz = state
        .db
        .create_quiz(
            NewQuiz {
                user_id,
                file_id: req.file_id,
                lecture_title,
                difficulty,
                topic_tags,
                questions,
            },
            flashcards.clone(),
        )
        .await?;

    info!(
        "Generated quiz {} with {} questions ({})",
        quiz.id,
        quiz.questions.len(),
        source.as_str()
    );

    Ok((
        StatusCode::CREATED,
        Json(GenerateQuizResponse {
            message: "Quiz and flashcards generated successfully".to_string(),
            source: source.as_str().to_string(),
            quiz: quiz.into(),
            flashcards: flashcards.into_iter().map(FlashcardResponse::from).collect(),
        }),
    ))
}

/// List the caller's quizzes with filters and pagination.
#[utoipa::path(
    get,
    path = "/quiz",
    params(ListParams),
    responses(
        (status = 200, description = "One page of quizzes", body = QuizListResponse),
        (status = 400, description = "Invalid date filter")
    ),
    security(("bearer" = []))
)]
pub async fn list_quizzes_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<Json<QuizListResponse>, HttpError> {
    let query = ListQuery::from_raw(params.into())?;
    let page = state.db.list_quizzes(user_id, &query).await?;
    Ok(Json(QuizListResponse {
        quizzes: page.items.into_iter().map(QuizOverviewResponse::from).collect(),
        pagination: page.pagination.into(),
    }))
}

/// Fetch one quiz with its questions and recorded answers.
#[utoipa::path(
    get,
    path = "/quiz/{quiz_id}",
    params(("quiz_id" = Uuid, Path, description = "The quiz to fetch.")),
    responses(
        (status = 200, description = "The quiz", body = QuizResponse),
        (status = 404, description = "No such quiz for this user")
    ),
    security(("bearer" = []))
)]
pub async fn get_quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<QuizResponse>, HttpError> {
    let quiz = owned_quiz(&state, user_id, quiz_id).await?;
    Ok(Json(quiz.into()))
}

/// Record the answer to one question. Each question can be answered once.
#[utoipa::path(
    post,
    path = "/quiz/{quiz_id}/answer",
    params(("quiz_id" = Uuid, Path, description = "The quiz being taken.")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = SubmitAnswerResponse),
        (status = 400, description = "Unknown question or option"),
        (status = 404, description = "No such quiz for this user"),
        (status = 409, description = "The question was already answered")
    ),
    security(("bearer" = []))
)]
pub async fn submit_answer_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, HttpError> {
    let quiz = owned_quiz(&state, user_id, quiz_id).await?;

    let question = quiz
        .questions
        .iter()
        .find(|q| q.position == req.question_index)
        .ok_or_else(|| {
            HttpError::bad_request(format!("Question {} does not exist", req.question_index))
        })?;
    if !question.has_option(&req.selected_answer) {
        return Err(HttpError::bad_request("Selected answer is not one of the options"));
    }
    if quiz.answer_for(req.question_index).is_some() {
        return Err(HttpError::new(
            StatusCode::CONFLICT,
            "This question has already been answered",
        ));
    }

    let is_correct = question.is_correct(&req.selected_answer);
    let tally = state
        .db
        .record_answer(
            QuizAnswer {
                quiz_id,
                question_index: req.question_index,
                selected_answer: req.selected_answer,
                is_correct,
                time_taken_ms: req.time_taken_ms.max(0),
                answered_at: Utc::now(),
            },
            quiz.questions.len(),
        )
        .await?;

    let quiz_completed = tally.is_complete();
    if quiz_completed {
        info!("Quiz {} completed: {}/{}", quiz_id, tally.correct, quiz.questions.len());
    }

    Ok(Json(SubmitAnswerResponse {
        is_correct,
        correct_answer: question.answer.clone(),
        quiz_completed,
        progress: QuizProgress::new(quiz.questions.len(), tally.answered, tally.correct),
    }))
}

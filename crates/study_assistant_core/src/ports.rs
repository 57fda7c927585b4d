//! crates/study_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or LLM APIs.

use crate::domain::{
    AnswerRecord, AnswerTally, Explanation, Feedback, Flashcard, FlashcardActivity, NewFile, NewQuiz, Quiz,
    QuizAnswer, QuizOverview, StoredFile, User, UserCredentials,
};
use crate::generation::{FlashcardDraft, StudyMaterial};
use crate::listing::{ListQuery, Page};
use crate::summary::SummaryLength;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users & Auth ---
    async fn create_user(
        &self,
        email: &str,
        full_name: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn create_auth_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owner of a live (unexpired) token.
    async fn validate_auth_session(&self, token: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, token: &str) -> PortResult<()>;

    // --- Files ---
    async fn create_file(&self, file: NewFile) -> PortResult<StoredFile>;

    async fn get_file(&self, file_id: Uuid) -> PortResult<StoredFile>;

    async fn list_files_by_user(&self, user_id: Uuid) -> PortResult<Vec<StoredFile>>;

    async fn update_file_summary(&self, file_id: Uuid, summary: &str) -> PortResult<()>;

    // --- Quizzes ---
    /// Stores a quiz together with the flashcards generated alongside it.
    /// Either both are stored or neither is.
    async fn create_quiz(&self, quiz: NewQuiz, flashcards: Vec<Flashcard>) -> PortResult<Quiz>;

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz>;

    async fn list_quizzes(&self, user_id: Uuid, query: &ListQuery) -> PortResult<Page<QuizOverview>>;

    /// Stores one answer and returns the quiz's counters including it. A second
    /// answer for the same question is a `Conflict`. The answer that brings the
    /// count to `question_count` sets `completed_at` in the same write, so
    /// concurrent final answers cannot leave a fully answered quiz open.
    async fn record_answer(&self, answer: QuizAnswer, question_count: usize) -> PortResult<AnswerTally>;

    // --- Flashcards ---
    async fn save_flashcards(&self, flashcards: Vec<Flashcard>) -> PortResult<()>;

    async fn list_flashcards(&self, user_id: Uuid, query: &ListQuery) -> PortResult<Page<Flashcard>>;

    async fn flashcards_for_file(&self, user_id: Uuid, file_id: Uuid) -> PortResult<Vec<Flashcard>>;

    // --- Explanations ---
    async fn save_explanation(&self, explanation: Explanation) -> PortResult<()>;

    async fn latest_explanation(&self, user_id: Uuid, file_id: Uuid) -> PortResult<Explanation>;

    // --- Feedback ---
    async fn save_feedback(&self, feedback: Feedback) -> PortResult<()>;

    async fn feedback_for_item(&self, item_id: &str) -> PortResult<Vec<Feedback>>;

    async fn feedback_by_user(&self, user_id: Uuid) -> PortResult<Vec<Feedback>>;

    // --- Statistics ---
    async fn quiz_overviews(&self, user_id: Uuid) -> PortResult<Vec<QuizOverview>>;

    async fn answer_history(&self, user_id: Uuid) -> PortResult<Vec<AnswerRecord>>;

    async fn flashcard_activity(&self, user_id: Uuid) -> PortResult<Vec<FlashcardActivity>>;
}

#[async_trait]
pub trait QuizGenerationService: Send + Sync {
    /// Generates quiz questions and flashcards from study text.
    async fn generate_study_material(&self, content: &str) -> PortResult<StudyMaterial>;
}

#[async_trait]
pub trait FlashcardGenerationService: Send + Sync {
    /// Generates a deck of flashcards from study text.
    async fn generate_flashcards(&self, content: &str) -> PortResult<Vec<FlashcardDraft>>;
}

#[async_trait]
pub trait SummaryService: Send + Sync {
    async fn summarize(&self, text: &str, length: SummaryLength) -> PortResult<String>;
}

#[async_trait]
pub trait ExplanationService: Send + Sync {
    /// Explains one difficult passage in plain language.
    async fn explain_passage(&self, passage: &str) -> PortResult<String>;
}

#[async_trait]
pub trait SpeechToTextService: Send + Sync {
    /// Transcribes an uploaded audio file (mp3, wav) into text.
    async fn transcribe_audio(&self, file_name: &str, audio_data: &[u8]) -> PortResult<String>;
}

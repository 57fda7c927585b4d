//! crates/study_assistant_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or wire format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Users and Auth
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

/// A bearer-token login session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Uploaded Files
//=========================================================================================

/// The storage bucket an uploaded file lands in, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Audio,
    Pdfs,
    Presentations,
    Documents,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Audio => "audio",
            FileCategory::Pdfs => "pdfs",
            FileCategory::Presentations => "presentations",
            FileCategory::Documents => "documents",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audio" => Ok(FileCategory::Audio),
            "pdfs" => Ok(FileCategory::Pdfs),
            "presentations" => Ok(FileCategory::Presentations),
            "documents" => Ok(FileCategory::Documents),
            other => Err(format!("unknown file category '{}'", other)),
        }
    }
}

/// Represents a document uploaded by a user.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub original_name: String,
    pub category: FileCategory,
    pub size_bytes: i64,
    pub stored_path: String,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl StoredFile {
    /// The best text available for generation: extracted content, then summary.
    pub fn study_text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| self.summary.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

/// The data needed to register a freshly stored upload.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub user_id: Uuid,
    pub original_name: String,
    pub category: FileCategory,
    pub size_bytes: i64,
    pub stored_path: String,
    pub content: Option<String>,
}

//=========================================================================================
// Quizzes
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Lenient parse used for request payloads: unknown labels become `Medium`.
    pub fn parse_or_default(label: Option<&str>) -> Self {
        label
            .and_then(|l| l.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub position: usize,
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

impl QuizQuestion {
    /// Correctness is plain string equality with the recorded answer.
    pub fn is_correct(&self, selected: &str) -> bool {
        selected == self.answer
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

/// One submitted answer for one question of a quiz.
#[derive(Debug, Clone)]
pub struct QuizAnswer {
    pub quiz_id: Uuid,
    pub question_index: usize,
    pub selected_answer: String,
    pub is_correct: bool,
    pub time_taken_ms: i64,
    pub answered_at: DateTime<Utc>,
}

/// Answer counters of a quiz right after an answer was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerTally {
    pub answered: usize,
    pub correct: usize,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AnswerTally {
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// A generated quiz (a "lecture") with its questions and recorded answers.
#[derive(Debug, Clone)]
pub struct Quiz {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_id: Option<Uuid>,
    pub lecture_title: String,
    pub difficulty: Difficulty,
    pub topic_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub questions: Vec<QuizQuestion>,
    pub answers: Vec<QuizAnswer>,
}

impl Quiz {
    pub fn answer_for(&self, question_index: usize) -> Option<&QuizAnswer> {
        self.answers
            .iter()
            .find(|a| a.question_index == question_index)
    }
}

/// The data needed to persist a freshly generated quiz.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub user_id: Uuid,
    pub file_id: Option<Uuid>,
    pub lecture_title: String,
    pub difficulty: Difficulty,
    pub topic_tags: Vec<String>,
    pub questions: Vec<QuizQuestion>,
}

/// A row of the quiz listing: metadata plus progress counters.
#[derive(Debug, Clone)]
pub struct QuizOverview {
    pub id: Uuid,
    pub file_id: Option<Uuid>,
    pub lecture_title: String,
    pub difficulty: Difficulty,
    pub topic_tags: Vec<String>,
    pub question_count: usize,
    pub answered_count: usize,
    pub correct_count: usize,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

//=========================================================================================
// Flashcards
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_id: Option<Uuid>,
    pub lecture_title: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Explanations
//=========================================================================================

/// A passage flagged as difficult together with the explanation generated for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainedPassage {
    pub passage: String,
    pub score: f64,
    pub reasons: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone)]
pub struct Explanation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_id: Uuid,
    pub passages: Vec<ExplainedPassage>,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Feedback
//=========================================================================================

#[derive(Debug, Clone)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub item_id: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Activity records used by the progress calculator
//=========================================================================================

/// One answered question, flattened for statistics.
#[derive(Debug, Clone)]
pub struct AnswerRecord {
    pub quiz_id: Uuid,
    pub lecture_title: String,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

/// One flashcard creation event, flattened for statistics.
#[derive(Debug, Clone)]
pub struct FlashcardActivity {
    pub lecture_title: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answer: &str) -> QuizQuestion {
        QuizQuestion {
            position: 0,
            question: "What is Rust?".into(),
            options: vec!["A language".into(), "A metal oxide".into(), "A game".into()],
            answer: answer.into(),
        }
    }

    #[test]
    fn test_difficulty_parse_is_lenient() {
        assert_eq!(Difficulty::parse_or_default(Some("hard")), Difficulty::Hard);
        assert_eq!(Difficulty::parse_or_default(Some("Easy")), Difficulty::Easy);
        assert_eq!(Difficulty::parse_or_default(Some("extreme")), Difficulty::Medium);
        assert_eq!(Difficulty::parse_or_default(None), Difficulty::Medium);
    }

    #[test]
    fn test_correctness_is_exact_string_equality() {
        let q = question("A language");
        assert!(q.is_correct("A language"));
        assert!(!q.is_correct("a language"));
        assert!(!q.is_correct("A language "));
    }

    #[test]
    fn test_study_text_prefers_content() {
        let mut file = StoredFile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            original_name: "notes.txt".into(),
            category: FileCategory::Documents,
            size_bytes: 10,
            stored_path: "uploads/documents/notes.txt".into(),
            content: Some("   ".into()),
            summary: Some("A summary".into()),
            uploaded_at: Utc::now(),
        };
        assert_eq!(file.study_text(), Some("A summary"));
        file.content = Some("Full text".into());
        assert_eq!(file.study_text(), Some("Full text"));
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for cat in [
            FileCategory::Audio,
            FileCategory::Pdfs,
            FileCategory::Presentations,
            FileCategory::Documents,
        ] {
            assert_eq!(cat.as_str().parse::<FileCategory>(), Ok(cat));
        }
    }
}

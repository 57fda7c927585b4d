//! crates/study_client/src/normalize.rs
//!
//! Converts raw JSON from the API into the client's own models. Several
//! historical spellings exist for the same field; each is resolved here once
//! so the rest of the client sees a single shape.

use serde_json::Value;
use study_assistant_core::domain::{Difficulty, QuizQuestion};
use study_assistant_core::progress::ProgressReport;

use crate::error::ClientError;

const ID_KEYS: &[&str] = &["id", "_id", "file_id"];
const NAME_KEYS: &[&str] = &["filename", "original_name", "name"];
const SIZE_KEYS: &[&str] = &["size", "size_bytes"];
const UPLOADED_AT_KEYS: &[&str] = &["uploaded_at", "upload_date", "created_at"];
const CREATED_AT_KEYS: &[&str] = &["created_at", "createdAt"];
const AVERAGE_RATING_KEYS: &[&str] = &["average_rating", "avg_rating"];

fn first<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| value.get(*k)).find(|v| !v.is_null())
}

/// Strings and numbers are both accepted as text.
fn first_str(value: &Value, keys: &[&str]) -> Option<String> {
    first(value, keys).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn first_u64(value: &Value, keys: &[&str]) -> Option<u64> {
    first(value, keys).and_then(|v| v.as_u64().or_else(|| v.as_str()?.parse().ok()))
}

fn first_f64(value: &Value, keys: &[&str]) -> Option<f64> {
    first(value, keys).and_then(|v| v.as_f64().or_else(|| v.as_str()?.parse().ok()))
}

fn strings(value: &Value, key: &str) -> Vec<String> {
    array_field(value, key)
        .iter()
        .filter_map(|t| t.as_str().map(str::to_string))
        .collect()
}

fn required(value: &Value, keys: &[&str], what: &str) -> Result<String, ClientError> {
    first_str(value, keys).ok_or_else(|| ClientError::Malformed(format!("{} is missing {}", what, keys[0])))
}

fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadSummary {
    pub id: String,
    pub filename: String,
    pub category: Option<String>,
    pub size: u64,
    pub uploaded_at: Option<String>,
    pub has_text: bool,
    pub summary: Option<String>,
}

impl UploadSummary {
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        let summary = first_str(value, &["summary"]).filter(|s| !s.is_empty());
        Ok(Self {
            id: required(value, ID_KEYS, "upload")?,
            filename: required(value, NAME_KEYS, "upload")?,
            category: first_str(value, &["category", "type"]),
            size: first_u64(value, SIZE_KEYS).unwrap_or(0),
            uploaded_at: first_str(value, UPLOADED_AT_KEYS),
            has_text: value
                .get("has_text")
                .and_then(Value::as_bool)
                .unwrap_or_else(|| first_str(value, &["content", "text"]).is_some_and(|t| !t.is_empty())),
            summary,
        })
    }

    /// An upload response carries its files under `files`; a listing may be a bare array.
    pub fn list_from_value(value: &Value) -> Result<Vec<Self>, ClientError> {
        let items = match value {
            Value::Array(items) => items.as_slice(),
            other => array_field(other, "files"),
        };
        items.iter().map(Self::from_value).collect()
    }
}

/// One row of the quiz list.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizCard {
    pub id: String,
    pub lecture_title: String,
    pub difficulty: Difficulty,
    pub topic_tags: Vec<String>,
    pub total_questions: usize,
    pub answered: usize,
    pub score_percent: u32,
    pub completed: bool,
}

impl QuizCard {
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        let progress = value.get("progress").unwrap_or(value);
        let total_questions = first_u64(progress, &["total_questions", "question_count"])
            .map(|n| n as usize)
            .unwrap_or_else(|| array_field(value, "questions").len());
        Ok(Self {
            id: required(value, &["id", "_id", "quiz_id"], "quiz")?,
            lecture_title: first_str(value, &["lecture_title", "lecture", "title"])
                .unwrap_or_else(|| "Untitled".to_string()),
            difficulty: Difficulty::parse_or_default(first_str(value, &["difficulty"]).as_deref()),
            topic_tags: array_field(value, "topic_tags")
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect(),
            total_questions,
            answered: first_u64(progress, &["answered", "answered_count"]).unwrap_or(0) as usize,
            score_percent: first_u64(progress, &["score_percent", "score"]).unwrap_or(0) as u32,
            completed: first(value, &["completed_at"]).is_some()
                || value.get("completed").and_then(Value::as_bool).unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageInfo {
    pub page: u32,
    pub total_pages: u64,
    pub total_count: u64,
    pub has_next: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuizListing {
    pub quizzes: Vec<QuizCard>,
    pub page: PageInfo,
}

impl QuizListing {
    /// Accepts a bare array of quizzes or an object with a `quizzes` key.
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        let (items, pagination) = match value {
            Value::Array(items) => (items.as_slice(), None),
            Value::Object(_) => (array_field(value, "quizzes"), value.get("pagination")),
            _ => return Err(ClientError::Malformed("quiz list is neither an array nor an object".into())),
        };
        let quizzes = items.iter().map(QuizCard::from_value).collect::<Result<Vec<_>, _>>()?;
        let page = match pagination {
            Some(p) => PageInfo {
                page: first_u64(p, &["page"]).unwrap_or(1) as u32,
                total_pages: first_u64(p, &["total_pages"]).unwrap_or(1),
                total_count: first_u64(p, &["total_count", "total"]).unwrap_or(quizzes.len() as u64),
                has_next: p.get("has_next").and_then(Value::as_bool).unwrap_or(false),
            },
            None => PageInfo {
                page: 1,
                total_pages: 1,
                total_count: quizzes.len() as u64,
                has_next: false,
            },
        };
        Ok(Self { quizzes, page })
    }
}

/// A quiz ready to be taken.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizDetail {
    pub id: String,
    pub lecture_title: String,
    pub questions: Vec<QuizQuestion>,
}

impl QuizDetail {
    /// Accepts the quiz object itself or a wrapper with a `quiz` key.
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        let quiz = value.get("quiz").filter(|q| q.is_object()).unwrap_or(value);
        let questions = array_field(quiz, "questions")
            .iter()
            .enumerate()
            .map(|(i, q)| {
                Ok(QuizQuestion {
                    position: first_u64(q, &["index", "position", "question_index"]).map_or(i, |n| n as usize),
                    question: required(q, &["question", "question_text", "text"], "question")?,
                    options: array_field(q, "options")
                        .iter()
                        .filter_map(|o| o.as_str().map(str::to_string))
                        .collect(),
                    answer: required(q, &["answer", "correct_answer"], "question")?,
                })
            })
            .collect::<Result<Vec<_>, ClientError>>()?;
        Ok(Self {
            id: required(quiz, &["id", "_id", "quiz_id"], "quiz")?,
            lecture_title: first_str(quiz, &["lecture_title", "lecture", "title"])
                .unwrap_or_else(|| "Untitled".to_string()),
            questions,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardItem {
    pub id: Option<String>,
    pub lecture_title: Option<String>,
    pub question: String,
    pub answer: String,
}

impl FlashcardItem {
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        Ok(Self {
            id: first_str(value, &["id", "_id"]),
            lecture_title: first_str(value, &["lecture_title", "lecture"]),
            question: required(value, &["question", "front"], "flashcard")?,
            answer: required(value, &["answer", "back"], "flashcard")?,
        })
    }

    /// Accepts a bare array or an object with a `flashcards` key.
    pub fn list_from_value(value: &Value) -> Result<Vec<Self>, ClientError> {
        let items = match value {
            Value::Array(items) => items.as_slice(),
            other => array_field(other, "flashcards"),
        };
        items.iter().map(Self::from_value).collect()
    }
}

/// One explained passage of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct PassageExplanation {
    pub passage: String,
    pub score: f64,
    pub reasons: Vec<String>,
    pub explanation: String,
}

impl PassageExplanation {
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        Ok(Self {
            passage: required(value, &["passage", "text", "original"], "passage")?,
            score: first_f64(value, &["score", "complexity"]).unwrap_or(0.0),
            reasons: strings(value, "reasons"),
            explanation: first_str(value, &["explanation", "simplified"]).unwrap_or_default(),
        })
    }
}

/// The explanations generated for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplanationReport {
    pub id: Option<String>,
    pub file_id: Option<String>,
    pub created_at: Option<String>,
    pub passages: Vec<PassageExplanation>,
}

impl ExplanationReport {
    /// Passages may be listed under `passages` or `explanations`.
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        let passages = match array_field(value, "passages") {
            [] => array_field(value, "explanations"),
            items => items,
        };
        Ok(Self {
            id: first_str(value, &["id", "_id", "explanation_id", "explanationId"]),
            file_id: first_str(value, &["file_id", "fileId"]),
            created_at: first_str(value, CREATED_AT_KEYS),
            passages: passages
                .iter()
                .map(PassageExplanation::from_value)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

/// One rating left on a quiz or a flashcard deck.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackNote {
    pub id: Option<String>,
    pub category: String,
    pub item_id: Option<String>,
    pub rating: u8,
    pub comment: String,
    pub created_at: Option<String>,
}

impl FeedbackNote {
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        let rating = first_u64(value, &["rating"])
            .filter(|r| (1..=5).contains(r))
            .ok_or_else(|| ClientError::Malformed("feedback has no rating between 1 and 5".into()))?;
        Ok(Self {
            id: first_str(value, &["id", "_id", "feedback_id"]),
            category: required(value, &["type", "category"], "feedback")?,
            item_id: first_str(value, &["item_id", "itemId"]),
            rating: rating as u8,
            comment: first_str(value, &["comment"]).unwrap_or_default(),
            created_at: first_str(value, CREATED_AT_KEYS),
        })
    }

    fn list(value: &Value, key: &str) -> Result<Vec<Self>, ClientError> {
        array_field(value, key).iter().map(Self::from_value).collect()
    }
}

/// All feedback for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFeedback {
    pub item_id: String,
    pub entries: Vec<FeedbackNote>,
    pub average_rating: f64,
}

impl ItemFeedback {
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        Ok(Self {
            item_id: required(value, &["item_id", "itemId"], "feedback listing")?,
            entries: FeedbackNote::list(value, "feedback")?,
            average_rating: first_f64(value, AVERAGE_RATING_KEYS).unwrap_or(0.0),
        })
    }
}

/// Totals for the stats page.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsOverview {
    pub total_quizzes: u64,
    pub total_flashcards: u64,
    pub average_rating: f64,
    pub recent_feedback: Vec<FeedbackNote>,
}

impl StatsOverview {
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        Ok(Self {
            total_quizzes: first_u64(value, &["total_quizzes", "quizzes"]).unwrap_or(0),
            total_flashcards: first_u64(value, &["total_flashcards", "flashcards"]).unwrap_or(0),
            average_rating: first_f64(value, AVERAGE_RATING_KEYS).unwrap_or(0.0),
            recent_feedback: FeedbackNote::list(value, "recent_feedback")?,
        })
    }
}

pub fn progress_from_value(value: Value) -> Result<ProgressReport, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::Malformed(format!("invalid progress report: {}", e)))
}

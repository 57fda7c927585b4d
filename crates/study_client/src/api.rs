//! crates/study_client/src/api.rs
//!
//! `StudyClient`: one typed method per REST endpoint. The bearer token of the
//! current session is attached to every protected request.

use reqwest::{multipart, Method, RequestBuilder, Response};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use study_assistant_core::progress::ProgressReport;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ClientError;
use crate::normalize::{
    progress_from_value, ExplanationReport, FlashcardItem, ItemFeedback, QuizDetail, QuizListing,
    StatsOverview, UploadSummary,
};
use crate::session::{Session, SessionStore, SessionUser};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Listing filters shared by quizzes and flashcards. `None` fields are omitted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QuizRequest {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecture_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topic_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FlashcardRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecture_title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackSubmission {
    #[serde(rename = "type")]
    pub category: String,
    pub item_id: String,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// What the server says about one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerReceipt {
    pub is_correct: bool,
    pub correct_answer: String,
    pub quiz_completed: bool,
}

#[derive(Clone)]
pub struct StudyClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl StudyClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// A client that reuses the token of a stored session.
    pub fn with_session(mut self, session: Option<&Session>) -> Self {
        self.token = session.map(|s| s.token.clone());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and returns the JSON body of a successful response.
    async fn send(&self, builder: RequestBuilder) -> Result<Value, ClientError> {
        let response = builder.send().await?;
        read_json(response).await
    }

    async fn get(&self, path: &str) -> Result<Value, ClientError> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ClientError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    fn session_from(value: &Value) -> Result<Session, ClientError> {
        let token = value
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Malformed("auth response has no access_token".into()))?;
        Ok(Session {
            token: token.to_string(),
            user: user_from(value)?,
        })
    }

    // --- Auth ---

    pub async fn signup(&mut self, email: &str, password: &str, full_name: &str) -> Result<Session, ClientError> {
        let body = json!({ "email": email, "password": password, "full_name": full_name });
        let session = Self::session_from(&self.post("/users/signup", &body).await?)?;
        self.token = Some(session.token.clone());
        Ok(session)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<Session, ClientError> {
        let body = json!({ "email": email, "password": password });
        let session = Self::session_from(&self.post("/users/login", &body).await?)?;
        self.token = Some(session.token.clone());
        Ok(session)
    }

    pub async fn me(&self) -> Result<SessionUser, ClientError> {
        user_from(&self.get("/users/me").await?)
    }

    /// Invalidates the token server-side. The in-memory token and the stored
    /// session are dropped even when the server call fails.
    pub async fn logout(&mut self, store: &SessionStore) -> Result<(), ClientError> {
        let result = self.post("/users/logout", &json!({})).await;
        self.token = None;
        store.clear().await?;
        if let Err(e) = &result {
            warn!("Server-side logout failed; local session cleared anyway: {}", e);
        }
        result.map(|_| ())
    }

    // --- Uploads & summaries ---

    /// Sends one file. Callers validate first; see `Uploader`.
    pub async fn upload_file(&self, file_name: &str, data: Vec<u8>) -> Result<Vec<UploadSummary>, ClientError> {
        let part = multipart::Part::bytes(data).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        let value = self.send(self.request(Method::POST, "/upload").multipart(form)).await?;
        UploadSummary::list_from_value(&value)
    }

    pub async fn list_uploads(&self) -> Result<Vec<UploadSummary>, ClientError> {
        UploadSummary::list_from_value(&self.get("/uploads").await?)
    }

    pub async fn get_upload(&self, file_id: &str) -> Result<(UploadSummary, Option<String>), ClientError> {
        let value = self.get(&format!("/uploads/{}", file_id)).await?;
        let content = value.get("content").and_then(Value::as_str).map(str::to_string);
        Ok((UploadSummary::from_value(&value)?, content))
    }

    pub async fn get_summary(&self, file_id: &str) -> Result<String, ClientError> {
        let value = self.get(&format!("/summary/{}", file_id)).await?;
        text_field(&value, "summary")
    }

    pub async fn generate_summary(&self, file_id: &str, summary_type: Option<&str>) -> Result<String, ClientError> {
        let body = json!({ "summary_type": summary_type });
        let value = self.post(&format!("/generate-summary/{}", file_id), &body).await?;
        text_field(&value, "summary")
    }

    pub async fn summarize(&self, text: &str, summary_type: Option<&str>) -> Result<String, ClientError> {
        let value = self
            .post("/summarize", &json!({ "text": text, "summary_type": summary_type }))
            .await?;
        text_field(&value, "summary")
    }

    // --- Quizzes ---

    pub async fn generate_quiz(&self, request: &QuizRequest) -> Result<(QuizDetail, Vec<FlashcardItem>), ClientError> {
        let value = self.post("/generate-quiz", request).await?;
        Ok((QuizDetail::from_value(&value)?, FlashcardItem::list_from_value(&value)?))
    }

    pub async fn list_quizzes(&self, filter: &ListFilter) -> Result<QuizListing, ClientError> {
        let value = self.send(self.request(Method::GET, "/quiz").query(filter)).await?;
        QuizListing::from_value(&value)
    }

    pub async fn get_quiz(&self, quiz_id: &str) -> Result<QuizDetail, ClientError> {
        QuizDetail::from_value(&self.get(&format!("/quiz/{}", quiz_id)).await?)
    }

    pub async fn submit_answer(
        &self,
        quiz_id: &str,
        question_index: usize,
        selected_answer: &str,
        time_taken_ms: i64,
    ) -> Result<AnswerReceipt, ClientError> {
        let body = json!({
            "question_index": question_index,
            "selected_answer": selected_answer,
            "time_taken_ms": time_taken_ms,
        });
        let value = self.post(&format!("/quiz/{}/answer", quiz_id), &body).await?;
        Ok(AnswerReceipt {
            is_correct: value.get("is_correct").and_then(Value::as_bool).unwrap_or(false),
            correct_answer: text_field(&value, "correct_answer")?,
            quiz_completed: value.get("quiz_completed").and_then(Value::as_bool).unwrap_or(false),
        })
    }

    // --- Flashcards ---

    pub async fn generate_flashcards(&self, request: &FlashcardRequest) -> Result<Vec<FlashcardItem>, ClientError> {
        FlashcardItem::list_from_value(&self.post("/generate_flashcards", request).await?)
    }

    pub async fn list_flashcards(&self, filter: &ListFilter) -> Result<Vec<FlashcardItem>, ClientError> {
        let value = self.send(self.request(Method::GET, "/flashcards").query(filter)).await?;
        FlashcardItem::list_from_value(&value)
    }

    pub async fn flashcards_for_file(&self, file_id: &str) -> Result<Vec<FlashcardItem>, ClientError> {
        FlashcardItem::list_from_value(&self.get(&format!("/flashcards/{}", file_id)).await?)
    }

    // --- Explanations, feedback, statistics ---

    pub async fn explain(&self, file_id: &str) -> Result<ExplanationReport, ClientError> {
        ExplanationReport::from_value(&self.post("/explain", &json!({ "file_id": file_id })).await?)
    }

    pub async fn get_explanation(&self, file_id: &str) -> Result<ExplanationReport, ClientError> {
        ExplanationReport::from_value(&self.get(&format!("/explain/{}", file_id)).await?)
    }

    pub async fn submit_feedback(&self, feedback: &FeedbackSubmission) -> Result<String, ClientError> {
        let value = self.post("/feedback", feedback).await?;
        text_field(&value, "feedback_id")
    }

    pub async fn feedback_for_item(&self, item_id: &str) -> Result<ItemFeedback, ClientError> {
        ItemFeedback::from_value(&self.get(&format!("/feedback/{}", item_id)).await?)
    }

    pub async fn progress(&self) -> Result<ProgressReport, ClientError> {
        progress_from_value(self.get("/progress").await?)
    }

    pub async fn stats(&self) -> Result<StatsOverview, ClientError> {
        StatsOverview::from_value(&self.get("/stats").await?)
    }
}

fn text_field(value: &Value, key: &str) -> Result<String, ClientError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ClientError::Malformed(format!("response has no '{}' field", key)))
}

fn user_from(value: &Value) -> Result<SessionUser, ClientError> {
    let user = value
        .get("user")
        .cloned()
        .ok_or_else(|| ClientError::Malformed("response has no user".into()))?;
    serde_json::from_value(user).map_err(|e| ClientError::Malformed(format!("invalid user: {}", e)))
}

/// The JSON body of a success response; otherwise the server's error message.
async fn read_json(response: Response) -> Result<Value, ClientError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    let body: Option<Value> = serde_json::from_slice(&bytes).ok();

    if !status.is_success() {
        let message = body
            .as_ref()
            .and_then(|b| b.get("error").or_else(|| b.get("message")))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| String::from_utf8_lossy(&bytes).trim().to_string());
        warn!("Request failed with {}: {}", status, message);
        return Err(ClientError::Status {
            code: status.as_u16(),
            message,
        });
    }

    debug!("Request succeeded with {}", status);
    Ok(body.unwrap_or(Value::Null))
}

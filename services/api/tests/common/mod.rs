//! Shared fixtures for the router tests: an in-memory `DatabaseService`
//! and an `AppState` wired to the offline model adapters.

#![allow(dead_code)]

use api_lib::adapters::OfflineAdapter;
use api_lib::config::Config;
use api_lib::web::state::AppState;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use study_assistant_core::domain::{
    AnswerRecord, AnswerTally, Explanation, Feedback, Flashcard, FlashcardActivity, NewFile, NewQuiz, Quiz,
    QuizAnswer, QuizOverview, StoredFile, User, UserCredentials,
};
use study_assistant_core::listing::{ListQuery, Page};
use study_assistant_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    files: Vec<StoredFile>,
    quizzes: Vec<Quiz>,
    flashcards: Vec<Flashcard>,
    explanations: Vec<Explanation>,
    feedback: Vec<Feedback>,
}

#[derive(Default)]
pub struct InMemoryDb {
    tables: Mutex<Tables>,
    failing: Mutex<HashSet<&'static str>>,
}

impl InMemoryDb {
    /// Makes every later call of the named operation fail with `error`.
    pub fn fail_on(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    fn check(&self, operation: &'static str, error: fn(String) -> PortError) -> PortResult<()> {
        if self.failing.lock().unwrap().contains(operation) {
            return Err(error(format!("{} failed", operation)));
        }
        Ok(())
    }

    /// Creates a user with a live token, bypassing password hashing.
    pub fn seed_user(&self, email: &str) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        let token = Uuid::new_v4().to_string();
        let mut t = self.tables.lock().unwrap();
        t.users.push(UserCredentials {
            user: User {
                user_id,
                email: email.to_string(),
                full_name: "Test User".to_string(),
            },
            hashed_password: String::new(),
        });
        t.sessions.insert(token.clone(), (user_id, Utc::now() + Duration::days(1)));
        (user_id, token)
    }

    pub fn quiz_count(&self) -> usize {
        self.tables.lock().unwrap().quizzes.len()
    }

    pub fn flashcard_count(&self) -> usize {
        self.tables.lock().unwrap().flashcards.len()
    }

    pub fn file_summary(&self, file_id: Uuid) -> Option<String> {
        let t = self.tables.lock().unwrap();
        t.files.iter().find(|f| f.id == file_id).and_then(|f| f.summary.clone())
    }

    pub fn answer_count(&self, quiz_id: Uuid) -> usize {
        let t = self.tables.lock().unwrap();
        t.quizzes
            .iter()
            .find(|q| q.id == quiz_id)
            .map(|q| q.answers.len())
            .unwrap_or(0)
    }

    fn overview(quiz: &Quiz) -> QuizOverview {
        QuizOverview {
            id: quiz.id,
            file_id: quiz.file_id,
            lecture_title: quiz.lecture_title.clone(),
            difficulty: quiz.difficulty,
            topic_tags: quiz.topic_tags.clone(),
            question_count: quiz.questions.len(),
            answered_count: quiz.answers.len(),
            correct_count: quiz.answers.iter().filter(|a| a.is_correct).count(),
            created_at: quiz.created_at,
            completed_at: quiz.completed_at,
        }
    }
}

fn paginate<T: Clone>(items: Vec<T>, query: &ListQuery) -> Page<T> {
    let total = items.len() as u64;
    let page = items
        .into_iter()
        .skip(query.offset() as usize)
        .take(query.limit as usize)
        .collect();
    Page::new(page, query, total)
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn create_user(&self, email: &str, full_name: &str, hashed_password: &str) -> PortResult<User> {
        let mut t = self.tables.lock().unwrap();
        if t.users.iter().any(|u| u.user.email == email) {
            return Err(PortError::Conflict(format!("User with email {} already exists", email)));
        }
        let user = User {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: full_name.to_string(),
        };
        t.users.push(UserCredentials {
            user: user.clone(),
            hashed_password: hashed_password.to_string(),
        });
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let t = self.tables.lock().unwrap();
        t.users
            .iter()
            .find(|u| u.user.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let t = self.tables.lock().unwrap();
        t.users
            .iter()
            .find(|u| u.user.user_id == user_id)
            .map(|u| u.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn create_auth_session(&self, token: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> PortResult<()> {
        self.tables
            .lock()
            .unwrap()
            .sessions
            .insert(token.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<Uuid> {
        self.check("validate_auth_session", PortError::Unavailable)?;
        let t = self.tables.lock().unwrap();
        match t.sessions.get(token) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        self.tables.lock().unwrap().sessions.remove(token);
        Ok(())
    }

    async fn create_file(&self, file: NewFile) -> PortResult<StoredFile> {
        self.check("create_file", PortError::Unexpected)?;
        let stored = StoredFile {
            id: Uuid::new_v4(),
            user_id: file.user_id,
            original_name: file.original_name,
            category: file.category,
            size_bytes: file.size_bytes,
            stored_path: file.stored_path,
            content: file.content,
            summary: None,
            uploaded_at: Utc::now(),
        };
        self.tables.lock().unwrap().files.push(stored.clone());
        Ok(stored)
    }

    async fn get_file(&self, file_id: Uuid) -> PortResult<StoredFile> {
        let t = self.tables.lock().unwrap();
        t.files
            .iter()
            .find(|f| f.id == file_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("File {} not found", file_id)))
    }

    async fn list_files_by_user(&self, user_id: Uuid) -> PortResult<Vec<StoredFile>> {
        let t = self.tables.lock().unwrap();
        let mut files: Vec<StoredFile> = t.files.iter().filter(|f| f.user_id == user_id).cloned().collect();
        files.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(files)
    }

    async fn update_file_summary(&self, file_id: Uuid, summary: &str) -> PortResult<()> {
        let mut t = self.tables.lock().unwrap();
        let file = t
            .files
            .iter_mut()
            .find(|f| f.id == file_id)
            .ok_or_else(|| PortError::NotFound(format!("File {} not found", file_id)))?;
        file.summary = Some(summary.to_string());
        Ok(())
    }

    async fn create_quiz(&self, quiz: NewQuiz, flashcards: Vec<Flashcard>) -> PortResult<Quiz> {
        self.check("create_quiz", PortError::Unexpected)?;
        let stored = Quiz {
            id: Uuid::new_v4(),
            user_id: quiz.user_id,
            file_id: quiz.file_id,
            lecture_title: quiz.lecture_title,
            difficulty: quiz.difficulty,
            topic_tags: quiz.topic_tags,
            created_at: Utc::now(),
            completed_at: None,
            questions: quiz.questions,
            answers: Vec::new(),
        };
        let mut t = self.tables.lock().unwrap();
        t.quizzes.push(stored.clone());
        t.flashcards.extend(flashcards);
        Ok(stored)
    }

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz> {
        let t = self.tables.lock().unwrap();
        t.quizzes
            .iter()
            .find(|q| q.id == quiz_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Quiz {} not found", quiz_id)))
    }

    async fn list_quizzes(&self, user_id: Uuid, query: &ListQuery) -> PortResult<Page<QuizOverview>> {
        let t = self.tables.lock().unwrap();
        let mut items: Vec<QuizOverview> = t
            .quizzes
            .iter()
            .filter(|q| q.user_id == user_id)
            .filter(|q| query.difficulty.map_or(true, |d| q.difficulty == d))
            .map(Self::overview)
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(items, query))
    }

    async fn record_answer(&self, answer: QuizAnswer, question_count: usize) -> PortResult<AnswerTally> {
        // Gives concurrent requests a chance to interleave, like a real round trip.
        tokio::task::yield_now().await;
        let mut t = self.tables.lock().unwrap();
        let quiz = t
            .quizzes
            .iter_mut()
            .find(|q| q.id == answer.quiz_id)
            .ok_or_else(|| PortError::NotFound(format!("Quiz {} not found", answer.quiz_id)))?;
        if quiz.answer_for(answer.question_index).is_some() {
            return Err(PortError::Conflict("Question already answered".to_string()));
        }
        let answered_at = answer.answered_at;
        quiz.answers.push(answer);
        if quiz.answers.len() >= question_count && quiz.completed_at.is_none() {
            quiz.completed_at = Some(answered_at);
        }
        Ok(AnswerTally {
            answered: quiz.answers.len(),
            correct: quiz.answers.iter().filter(|a| a.is_correct).count(),
            completed_at: quiz.completed_at,
        })
    }

    async fn save_flashcards(&self, flashcards: Vec<Flashcard>) -> PortResult<()> {
        self.tables.lock().unwrap().flashcards.extend(flashcards);
        Ok(())
    }

    async fn list_flashcards(&self, user_id: Uuid, query: &ListQuery) -> PortResult<Page<Flashcard>> {
        let t = self.tables.lock().unwrap();
        let mut items: Vec<Flashcard> = t.flashcards.iter().filter(|c| c.user_id == user_id).cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(items, query))
    }

    async fn flashcards_for_file(&self, user_id: Uuid, file_id: Uuid) -> PortResult<Vec<Flashcard>> {
        let t = self.tables.lock().unwrap();
        Ok(t.flashcards
            .iter()
            .filter(|c| c.user_id == user_id && c.file_id == Some(file_id))
            .cloned()
            .collect())
    }

    async fn save_explanation(&self, explanation: Explanation) -> PortResult<()> {
        self.tables.lock().unwrap().explanations.push(explanation);
        Ok(())
    }

    async fn latest_explanation(&self, user_id: Uuid, file_id: Uuid) -> PortResult<Explanation> {
        let t = self.tables.lock().unwrap();
        t.explanations
            .iter()
            .filter(|e| e.user_id == user_id && e.file_id == file_id)
            .max_by_key(|e| e.created_at)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("No explanation found for file {}", file_id)))
    }

    async fn save_feedback(&self, feedback: Feedback) -> PortResult<()> {
        self.tables.lock().unwrap().feedback.push(feedback);
        Ok(())
    }

    async fn feedback_for_item(&self, item_id: &str) -> PortResult<Vec<Feedback>> {
        let t = self.tables.lock().unwrap();
        Ok(t.feedback.iter().filter(|f| f.item_id == item_id).cloned().collect())
    }

    async fn feedback_by_user(&self, user_id: Uuid) -> PortResult<Vec<Feedback>> {
        let t = self.tables.lock().unwrap();
        Ok(t.feedback.iter().filter(|f| f.user_id == user_id).cloned().collect())
    }

    async fn quiz_overviews(&self, user_id: Uuid) -> PortResult<Vec<QuizOverview>> {
        let t = self.tables.lock().unwrap();
        Ok(t.quizzes.iter().filter(|q| q.user_id == user_id).map(Self::overview).collect())
    }

    async fn answer_history(&self, user_id: Uuid) -> PortResult<Vec<AnswerRecord>> {
        let t = self.tables.lock().unwrap();
        Ok(t.quizzes
            .iter()
            .filter(|q| q.user_id == user_id)
            .flat_map(|q| {
                q.answers.iter().map(move |a| AnswerRecord {
                    quiz_id: q.id,
                    lecture_title: q.lecture_title.clone(),
                    is_correct: a.is_correct,
                    answered_at: a.answered_at,
                })
            })
            .collect())
    }

    async fn flashcard_activity(&self, user_id: Uuid) -> PortResult<Vec<FlashcardActivity>> {
        let t = self.tables.lock().unwrap();
        Ok(t.flashcards
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| FlashcardActivity {
                lecture_title: c.lecture_title.clone(),
                created_at: c.created_at,
            })
            .collect())
    }
}

pub fn test_config(upload_dir: &Path) -> Config {
    Config {
        bind_address: ([127, 0, 0, 1], 0).into(),
        database_url: "postgres://unused".to_string(),
        log_level: tracing::Level::INFO,
        openai_api_key: None,
        quiz_model: "test".to_string(),
        flashcard_model: "test".to_string(),
        summary_model: "test".to_string(),
        explain_model: "test".to_string(),
        sst_model: "test".to_string(),
        upload_dir: upload_dir.to_path_buf(),
        max_upload_bytes: 1024 * 1024,
        token_ttl_days: 30,
        cors_origin: "http://localhost:3000".to_string(),
        explain_max_passages: 8,
    }
}

pub fn test_state(db: Arc<InMemoryDb>, upload_dir: &Path) -> Arc<AppState> {
    let offline = Arc::new(OfflineAdapter);
    Arc::new(AppState {
        db,
        config: Arc::new(test_config(upload_dir)),
        quiz_adapter: offline.clone(),
        flashcard_adapter: offline.clone(),
        summary_adapter: offline.clone(),
        explain_adapter: offline.clone(),
        sst_adapter: offline,
    })
}

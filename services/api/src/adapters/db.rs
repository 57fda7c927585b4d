//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use study_assistant_core::domain::{
    AnswerRecord, AnswerTally, Difficulty, ExplainedPassage, Explanation, Feedback, FileCategory, Flashcard,
    FlashcardActivity, NewFile, NewQuiz, Quiz, QuizAnswer, QuizOverview, QuizQuestion, StoredFile,
    User, UserCredentials,
};
use study_assistant_core::listing::{ListQuery, Page};
use study_assistant_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => unexpected(e),
    }
}

fn conflict_or_unexpected(e: sqlx::Error, what: &str) -> PortError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            PortError::Conflict(what.to_string())
        }
        _ => unexpected(e),
    }
}

fn flashcard_insert(flashcards: Vec<Flashcard>) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new(
        "INSERT INTO flashcards (id, user_id, file_id, lecture_title, question, answer, created_at) ",
    );
    qb.push_values(flashcards, |mut row, card| {
        row.push_bind(card.id)
            .push_bind(card.user_id)
            .push_bind(card.file_id)
            .push_bind(card.lecture_title)
            .push_bind(card.question)
            .push_bind(card.answer)
            .push_bind(card.created_at);
    });
    qb
}

fn parse_difficulty(raw: &str) -> Difficulty {
    Difficulty::parse_or_default(Some(raw))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
    full_name: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
            full_name: self.full_name,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    full_name: String,
    hashed_password: String,
}

#[derive(FromRow)]
struct FileRecord {
    id: Uuid,
    user_id: Uuid,
    original_name: String,
    category: String,
    size_bytes: i64,
    stored_path: String,
    content: Option<String>,
    summary: Option<String>,
    uploaded_at: DateTime<Utc>,
}
impl FileRecord {
    fn to_domain(self) -> PortResult<StoredFile> {
        let category = self
            .category
            .parse::<FileCategory>()
            .map_err(PortError::Unexpected)?;
        Ok(StoredFile {
            id: self.id,
            user_id: self.user_id,
            original_name: self.original_name,
            category,
            size_bytes: self.size_bytes,
            stored_path: self.stored_path,
            content: self.content,
            summary: self.summary,
            uploaded_at: self.uploaded_at,
        })
    }
}

const FILE_COLUMNS: &str =
    "id, user_id, original_name, category, size_bytes, stored_path, content, summary, uploaded_at";

#[derive(FromRow)]
struct QuizRecord {
    id: Uuid,
    user_id: Uuid,
    file_id: Option<Uuid>,
    lecture_title: String,
    difficulty: String,
    topic_tags: Vec<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct QuestionRecord {
    position: i32,
    question: String,
    options: Vec<String>,
    answer: String,
}
impl QuestionRecord {
    fn to_domain(self) -> QuizQuestion {
        QuizQuestion {
            position: self.position.max(0) as usize,
            question: self.question,
            options: self.options,
            answer: self.answer,
        }
    }
}

#[derive(FromRow)]
struct AnswerRowRecord {
    quiz_id: Uuid,
    question_index: i32,
    selected_answer: String,
    is_correct: bool,
    time_taken_ms: i64,
    answered_at: DateTime<Utc>,
}
impl AnswerRowRecord {
    fn to_domain(self) -> QuizAnswer {
        QuizAnswer {
            quiz_id: self.quiz_id,
            question_index: self.question_index.max(0) as usize,
            selected_answer: self.selected_answer,
            is_correct: self.is_correct,
            time_taken_ms: self.time_taken_ms,
            answered_at: self.answered_at,
        }
    }
}

#[derive(FromRow)]
struct OverviewRecord {
    id: Uuid,
    file_id: Option<Uuid>,
    lecture_title: String,
    difficulty: String,
    topic_tags: Vec<String>,
    question_count: i64,
    answered_count: i64,
    correct_count: i64,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}
impl OverviewRecord {
    fn to_domain(self) -> QuizOverview {
        QuizOverview {
            id: self.id,
            file_id: self.file_id,
            lecture_title: self.lecture_title,
            difficulty: parse_difficulty(&self.difficulty),
            topic_tags: self.topic_tags,
            question_count: self.question_count.max(0) as usize,
            answered_count: self.answered_count.max(0) as usize,
            correct_count: self.correct_count.max(0) as usize,
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

const OVERVIEW_SELECT: &str = "SELECT q.id, q.file_id, q.lecture_title, q.difficulty, q.topic_tags, \
     q.created_at, q.completed_at, \
     (SELECT COUNT(*) FROM quiz_questions qq WHERE qq.quiz_id = q.id) AS question_count, \
     (SELECT COUNT(*) FROM quiz_answers qa WHERE qa.quiz_id = q.id) AS answered_count, \
     (SELECT COUNT(*) FROM quiz_answers qa WHERE qa.quiz_id = q.id AND qa.is_correct) AS correct_count \
     FROM quizzes q";

#[derive(FromRow)]
struct FlashcardRecord {
    id: Uuid,
    user_id: Uuid,
    file_id: Option<Uuid>,
    lecture_title: String,
    question: String,
    answer: String,
    created_at: DateTime<Utc>,
}
impl FlashcardRecord {
    fn to_domain(self) -> Flashcard {
        Flashcard {
            id: self.id,
            user_id: self.user_id,
            file_id: self.file_id,
            lecture_title: self.lecture_title,
            question: self.question,
            answer: self.answer,
            created_at: self.created_at,
        }
    }
}

const FLASHCARD_COLUMNS: &str = "id, user_id, file_id, lecture_title, question, answer, created_at";

#[derive(FromRow)]
struct ExplanationRecord {
    id: Uuid,
    user_id: Uuid,
    file_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct PassageRecord {
    passage: String,
    score: f64,
    reasons: Vec<String>,
    explanation: String,
}

#[derive(FromRow)]
struct FeedbackRecord {
    id: Uuid,
    user_id: Uuid,
    category: String,
    item_id: String,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
}
impl FeedbackRecord {
    fn to_domain(self) -> Feedback {
        Feedback {
            id: self.id,
            user_id: self.user_id,
            category: self.category,
            item_id: self.item_id,
            rating: self.rating.clamp(0, u8::MAX as i16) as u8,
            comment: self.comment,
            created_at: self.created_at,
        }
    }
}

const FEEDBACK_COLUMNS: &str = "id, user_id, category, item_id, rating, comment, created_at";

#[derive(FromRow)]
struct AnswerHistoryRecord {
    quiz_id: Uuid,
    lecture_title: String,
    is_correct: bool,
    answered_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct ActivityRecord {
    lecture_title: String,
    created_at: DateTime<Utc>,
}

//=========================================================================================
// Listing filters
//=========================================================================================

fn push_quiz_filters(qb: &mut QueryBuilder<'static, Postgres>, user_id: Uuid, query: &ListQuery) {
    qb.push(" WHERE q.user_id = ").push_bind(user_id);
    if let Some(search) = &query.search {
        let pattern = ListQuery::like_pattern(search);
        qb.push(" AND (q.lecture_title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR EXISTS (SELECT 1 FROM quiz_questions qq WHERE qq.quiz_id = q.id AND qq.question ILIKE ")
            .push_bind(pattern)
            .push("))");
    }
    if let Some(lecture) = &query.lecture {
        qb.push(" AND q.lecture_title ILIKE ")
            .push_bind(ListQuery::like_pattern(lecture));
    }
    if let Some(difficulty) = query.difficulty {
        qb.push(" AND q.difficulty = ")
            .push_bind(difficulty.as_str().to_string());
    }
    if let Some((start, end)) = query.date_window() {
        qb.push(" AND q.created_at >= ")
            .push_bind(start)
            .push(" AND q.created_at < ")
            .push_bind(end);
    }
}

fn push_flashcard_filters(
    qb: &mut QueryBuilder<'static, Postgres>,
    user_id: Uuid,
    query: &ListQuery,
) {
    qb.push(" WHERE user_id = ").push_bind(user_id);
    if let Some(search) = &query.search {
        let pattern = ListQuery::like_pattern(search);
        qb.push(" AND (question ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR answer ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(lecture) = &query.lecture {
        qb.push(" AND lecture_title ILIKE ")
            .push_bind(ListQuery::like_pattern(lecture));
    }
    if let Some((start, end)) = query.date_window() {
        qb.push(" AND created_at >= ")
            .push_bind(start)
            .push(" AND created_at < ")
            .push_bind(end);
    }
}

fn push_paging(qb: &mut QueryBuilder<'static, Postgres>, query: &ListQuery) {
    qb.push(" LIMIT ")
        .push_bind(query.limit as i64)
        .push(" OFFSET ")
        .push_bind(query.offset());
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Users & Auth ---

    async fn create_user(
        &self,
        email: &str,
        full_name: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, full_name, hashed_password) \
             VALUES ($1, $2, $3, $4) RETURNING user_id, email, full_name",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(full_name)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, "User already exists with this email"))?;

        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, full_name, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User with email {} not found", email)))?;

        Ok(UserCredentials {
            user: User {
                user_id: record.user_id,
                email: record.email,
                full_name: record.full_name,
            },
            hashed_password: record.hashed_password,
        })
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, full_name FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User {} not found", user_id)))?;

        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE token = $1 AND expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    // --- Files ---

    async fn create_file(&self, file: NewFile) -> PortResult<StoredFile> {
        let sql = format!(
            "INSERT INTO files (id, user_id, original_name, category, size_bytes, stored_path, content) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            FILE_COLUMNS
        );
        let record = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(file.user_id)
            .bind(&file.original_name)
            .bind(file.category.as_str())
            .bind(file.size_bytes)
            .bind(&file.stored_path)
            .bind(&file.content)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        record.to_domain()
    }

    async fn get_file(&self, file_id: Uuid) -> PortResult<StoredFile> {
        let sql = format!("SELECT {} FROM files WHERE id = $1", FILE_COLUMNS);
        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(file_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| not_found_or_unexpected(e, format!("File {} not found", file_id)))?
            .to_domain()
    }

    async fn list_files_by_user(&self, user_id: Uuid) -> PortResult<Vec<StoredFile>> {
        let sql = format!(
            "SELECT {} FROM files WHERE user_id = $1 ORDER BY uploaded_at DESC",
            FILE_COLUMNS
        );
        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?
            .into_iter()
            .map(FileRecord::to_domain)
            .collect()
    }

    async fn update_file_summary(&self, file_id: Uuid, summary: &str) -> PortResult<()> {
        let result = sqlx::query("UPDATE files SET summary = $1 WHERE id = $2")
            .bind(summary)
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("File {} not found", file_id)));
        }
        Ok(())
    }

    // --- Quizzes ---

    async fn create_quiz(&self, quiz: NewQuiz, flashcards: Vec<Flashcard>) -> PortResult<Quiz> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let record = sqlx::query_as::<_, QuizRecord>(
            "INSERT INTO quizzes (id, user_id, file_id, lecture_title, difficulty, topic_tags) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, user_id, file_id, lecture_title, difficulty, topic_tags, created_at, completed_at",
        )
        .bind(Uuid::new_v4())
        .bind(quiz.user_id)
        .bind(quiz.file_id)
        .bind(&quiz.lecture_title)
        .bind(quiz.difficulty.as_str())
        .bind(&quiz.topic_tags)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        if !quiz.questions.is_empty() {
            let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new(
                "INSERT INTO quiz_questions (quiz_id, position, question, options, answer) ",
            );
            qb.push_values(quiz.questions.iter().cloned(), |mut row, q| {
                row.push_bind(record.id)
                    .push_bind(q.position as i32)
                    .push_bind(q.question)
                    .push_bind(q.options)
                    .push_bind(q.answer);
            });
            qb.build().execute(&mut *tx).await.map_err(unexpected)?;
        }

        if !flashcards.is_empty() {
            flashcard_insert(flashcards)
                .build()
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;

        Ok(Quiz {
            id: record.id,
            user_id: record.user_id,
            file_id: record.file_id,
            lecture_title: record.lecture_title,
            difficulty: parse_difficulty(&record.difficulty),
            topic_tags: record.topic_tags,
            created_at: record.created_at,
            completed_at: record.completed_at,
            questions: quiz.questions,
            answers: Vec::new(),
        })
    }

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz> {
        let record = sqlx::query_as::<_, QuizRecord>(
            "SELECT id, user_id, file_id, lecture_title, difficulty, topic_tags, created_at, completed_at \
             FROM quizzes WHERE id = $1",
        )
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Quiz {} not found", quiz_id)))?;

        let questions = sqlx::query_as::<_, QuestionRecord>(
            "SELECT position, question, options, answer FROM quiz_questions \
             WHERE quiz_id = $1 ORDER BY position",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let answers = sqlx::query_as::<_, AnswerRowRecord>(
            "SELECT quiz_id, question_index, selected_answer, is_correct, time_taken_ms, answered_at \
             FROM quiz_answers WHERE quiz_id = $1 ORDER BY question_index",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(Quiz {
            id: record.id,
            user_id: record.user_id,
            file_id: record.file_id,
            lecture_title: record.lecture_title,
            difficulty: parse_difficulty(&record.difficulty),
            topic_tags: record.topic_tags,
            created_at: record.created_at,
            completed_at: record.completed_at,
            questions: questions.into_iter().map(QuestionRecord::to_domain).collect(),
            answers: answers.into_iter().map(AnswerRowRecord::to_domain).collect(),
        })
    }

    async fn list_quizzes(&self, user_id: Uuid, query: &ListQuery) -> PortResult<Page<QuizOverview>> {
        let mut count_qb: QueryBuilder<'static, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM quizzes q");
        push_quiz_filters(&mut count_qb, user_id, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new(OVERVIEW_SELECT);
        push_quiz_filters(&mut qb, user_id, query);
        qb.push(" ORDER BY q.created_at DESC");
        push_paging(&mut qb, query);
        let rows = qb
            .build_query_as::<OverviewRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        let items = rows.into_iter().map(OverviewRecord::to_domain).collect();
        Ok(Page::new(items, query, total.max(0) as u64))
    }

    async fn record_answer(&self, answer: QuizAnswer, question_count: usize) -> PortResult<AnswerTally> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Row lock on the quiz serializes concurrent answers to it.
        sqlx::query("SELECT id FROM quizzes WHERE id = $1 FOR UPDATE")
            .bind(answer.quiz_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| not_found_or_unexpected(e, format!("Quiz {} not found", answer.quiz_id)))?;

        sqlx::query(
            "INSERT INTO quiz_answers \
             (quiz_id, question_index, selected_answer, is_correct, time_taken_ms, answered_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(answer.quiz_id)
        .bind(answer.question_index as i32)
        .bind(&answer.selected_answer)
        .bind(answer.is_correct)
        .bind(answer.time_taken_ms)
        .bind(answer.answered_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_or_unexpected(e, "This question has already been answered"))?;

        let (answered, correct) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_correct) FROM quiz_answers WHERE quiz_id = $1",
        )
        .bind(answer.quiz_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        let answered = answered.max(0) as usize;
        let completed_at = if answered >= question_count {
            sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
                "UPDATE quizzes SET completed_at = COALESCE(completed_at, $1) \
                 WHERE id = $2 RETURNING completed_at",
            )
            .bind(answer.answered_at)
            .bind(answer.quiz_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?
        } else {
            None
        };

        tx.commit().await.map_err(unexpected)?;

        Ok(AnswerTally {
            answered,
            correct: correct.max(0) as usize,
            completed_at,
        })
    }

    // --- Flashcards ---

    async fn save_flashcards(&self, flashcards: Vec<Flashcard>) -> PortResult<()> {
        if flashcards.is_empty() {
            return Ok(());
        }
        flashcard_insert(flashcards)
            .build()
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn list_flashcards(&self, user_id: Uuid, query: &ListQuery) -> PortResult<Page<Flashcard>> {
        let mut count_qb: QueryBuilder<'static, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM flashcards");
        push_flashcard_filters(&mut count_qb, user_id, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        let mut qb: QueryBuilder<'static, Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM flashcards", FLASHCARD_COLUMNS));
        push_flashcard_filters(&mut qb, user_id, query);
        qb.push(" ORDER BY created_at DESC");
        push_paging(&mut qb, query);
        let rows = qb
            .build_query_as::<FlashcardRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        let items = rows.into_iter().map(FlashcardRecord::to_domain).collect();
        Ok(Page::new(items, query, total.max(0) as u64))
    }

    async fn flashcards_for_file(&self, user_id: Uuid, file_id: Uuid) -> PortResult<Vec<Flashcard>> {
        let sql = format!(
            "SELECT {} FROM flashcards WHERE user_id = $1 AND file_id = $2 ORDER BY created_at DESC",
            FLASHCARD_COLUMNS
        );
        let rows = sqlx::query_as::<_, FlashcardRecord>(&sql)
            .bind(user_id)
            .bind(file_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(rows.into_iter().map(FlashcardRecord::to_domain).collect())
    }

    // --- Explanations ---

    async fn save_explanation(&self, explanation: Explanation) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query("INSERT INTO explanations (id, user_id, file_id, created_at) VALUES ($1, $2, $3, $4)")
            .bind(explanation.id)
            .bind(explanation.user_id)
            .bind(explanation.file_id)
            .bind(explanation.created_at)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        if !explanation.passages.is_empty() {
            let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new(
                "INSERT INTO explanation_parts (explanation_id, position, passage, score, reasons, explanation) ",
            );
            let id = explanation.id;
            qb.push_values(
                explanation.passages.into_iter().enumerate(),
                |mut row, (position, part)| {
                    row.push_bind(id)
                        .push_bind(position as i32)
                        .push_bind(part.passage)
                        .push_bind(part.score)
                        .push_bind(part.reasons)
                        .push_bind(part.explanation);
                },
            );
            qb.build().execute(&mut *tx).await.map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn latest_explanation(&self, user_id: Uuid, file_id: Uuid) -> PortResult<Explanation> {
        let record = sqlx::query_as::<_, ExplanationRecord>(
            "SELECT id, user_id, file_id, created_at FROM explanations \
             WHERE user_id = $1 AND file_id = $2 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(file_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            not_found_or_unexpected(e, format!("No explanation found for file {}", file_id))
        })?;

        let parts = sqlx::query_as::<_, PassageRecord>(
            "SELECT passage, score, reasons, explanation FROM explanation_parts \
             WHERE explanation_id = $1 ORDER BY position",
        )
        .bind(record.id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(Explanation {
            id: record.id,
            user_id: record.user_id,
            file_id: record.file_id,
            created_at: record.created_at,
            passages: parts
                .into_iter()
                .map(|p| ExplainedPassage {
                    passage: p.passage,
                    score: p.score,
                    reasons: p.reasons,
                    explanation: p.explanation,
                })
                .collect(),
        })
    }

    // --- Feedback ---

    async fn save_feedback(&self, feedback: Feedback) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO feedback (id, user_id, category, item_id, rating, comment, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(feedback.id)
        .bind(feedback.user_id)
        .bind(&feedback.category)
        .bind(&feedback.item_id)
        .bind(feedback.rating as i16)
        .bind(&feedback.comment)
        .bind(feedback.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn feedback_for_item(&self, item_id: &str) -> PortResult<Vec<Feedback>> {
        let sql = format!(
            "SELECT {} FROM feedback WHERE item_id = $1 ORDER BY created_at DESC",
            FEEDBACK_COLUMNS
        );
        let rows = sqlx::query_as::<_, FeedbackRecord>(&sql)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(rows.into_iter().map(FeedbackRecord::to_domain).collect())
    }

    async fn feedback_by_user(&self, user_id: Uuid) -> PortResult<Vec<Feedback>> {
        let sql = format!(
            "SELECT {} FROM feedback WHERE user_id = $1 ORDER BY created_at DESC",
            FEEDBACK_COLUMNS
        );
        let rows = sqlx::query_as::<_, FeedbackRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(rows.into_iter().map(FeedbackRecord::to_domain).collect())
    }

    // --- Statistics ---

    async fn quiz_overviews(&self, user_id: Uuid) -> PortResult<Vec<QuizOverview>> {
        let sql = format!("{} WHERE q.user_id = $1 ORDER BY q.created_at DESC", OVERVIEW_SELECT);
        let rows = sqlx::query_as::<_, OverviewRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(rows.into_iter().map(OverviewRecord::to_domain).collect())
    }

    async fn answer_history(&self, user_id: Uuid) -> PortResult<Vec<AnswerRecord>> {
        let rows = sqlx::query_as::<_, AnswerHistoryRecord>(
            "SELECT qa.quiz_id, q.lecture_title, qa.is_correct, qa.answered_at \
             FROM quiz_answers qa JOIN quizzes q ON q.id = qa.quiz_id \
             WHERE q.user_id = $1 ORDER BY qa.answered_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(rows
            .into_iter()
            .map(|r| AnswerRecord {
                quiz_id: r.quiz_id,
                lecture_title: r.lecture_title,
                is_correct: r.is_correct,
                answered_at: r.answered_at,
            })
            .collect())
    }

    async fn flashcard_activity(&self, user_id: Uuid) -> PortResult<Vec<FlashcardActivity>> {
        let rows = sqlx::query_as::<_, ActivityRecord>(
            "SELECT lecture_title, created_at FROM flashcards WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(rows
            .into_iter()
            .map(|r| FlashcardActivity {
                lecture_title: r.lecture_title,
                created_at: r.created_at,
            })
            .collect())
    }
}

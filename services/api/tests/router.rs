mod common;

use api_lib::web::build_router;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{test_state, InMemoryDb};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use study_assistant_core::summary::TOO_SHORT_MESSAGE;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "study-test-boundary";

struct Harness {
    app: Router,
    db: Arc<InMemoryDb>,
    token: String,
    uploads: TempDir,
}

fn harness() -> Harness {
    let uploads = TempDir::new().unwrap();
    let db = Arc::new(InMemoryDb::default());
    let (_, token) = db.seed_user("ada@example.com");
    let app = build_router(test_state(db.clone(), uploads.path()));
    Harness {
        app,
        db,
        token,
        uploads,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn multipart_upload(token: &str, files: &[(&str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, data) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn stored_file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .map(|path| if path.is_dir() { stored_file_count(&path) } else { 1 })
        .sum()
}

fn answer_request(token: &str, quiz_id: &str, question: &Value, choice: &Value) -> Request<Body> {
    json_request(
        Method::POST,
        &format!("/quiz/{}/answer", quiz_id),
        Some(token),
        json!({ "question_index": question["index"], "selected_answer": choice }),
    )
}

const LECTURE: &str = "Photosynthesis is the process by which green plants convert light energy into \
chemical energy. Chlorophyll is the pigment that absorbs light in the chloroplasts. The Calvin cycle \
uses carbon dioxide and ATP to build glucose molecules. Oxygen is released as a by-product of \
splitting water during the light reactions.";

async fn generate_quiz(h: &Harness) -> Value {
    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            "/generate-quiz",
            Some(&h.token),
            json!({ "summary": LECTURE, "lecture_title": "Biology 101", "difficulty": "hard" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn test_root_banner_is_public() {
    let h = harness();
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["endpoints"].as_array().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn test_missing_bearer_is_unauthorized() {
    let h = harness();
    let request = Request::builder().uri("/quiz").body(Body::empty()).unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status_code"], 401);

    let (status, _) = send(&h.app, get("/stats", "not-a-real-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_rejects_weak_password_and_duplicates() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            "/users/signup",
            None,
            json!({ "email": "grace@example.com", "password": "weak", "full_name": "Grace" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("8 characters"));

    let (status, _) = send(
        &h.app,
        json_request(
            Method::POST,
            "/users/signup",
            None,
            json!({ "email": "ada@example.com", "password": "Str0ngPass", "full_name": "Ada" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_signup_then_logout_invalidates_token() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            "/users/signup",
            None,
            json!({ "email": "Grace@Example.com", "password": "Str0ngPass", "full_name": "Grace Hopper" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "grace@example.com");
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, me) = send(&h.app, get("/users/me", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["full_name"], "Grace Hopper");

    let (status, _) = send(&h.app, json_request(Method::POST, "/users/logout", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&h.app, get("/users/me", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_exe_upload_is_rejected() {
    let h = harness();
    let (status, body) = send(&h.app, multipart_upload(&h.token, &[("setup.exe", b"MZ\x90\x00")])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("exe"));
}

#[tokio::test]
async fn test_batch_upload_reports_per_file_results() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        multipart_upload(&h.token, &[("notes.txt", LECTURE.as_bytes()), ("virus.exe", b"MZ")]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["files"].as_array().unwrap().len(), 1);
    assert_eq!(body["files"][0]["category"], "documents");
    assert_eq!(body["files"][0]["has_text"], true);
    assert_eq!(body["errors"][0]["filename"], "virus.exe");

    let file_id = body["files"][0]["id"].as_str().unwrap().to_string();
    let (status, file) = send(&h.app, get(&format!("/uploads/{}", file_id), &h.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(file["content"].as_str().unwrap().starts_with("Photosynthesis"));

    // Summaries fall back to the extractive summarizer without a model.
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/generate-summary/{}", file_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", h.token))
        .body(Body::empty())
        .unwrap();
    let (status, summary) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["source"], "fallback");
    assert_eq!(summary["summary_type"], "detailed");

    let (status, stored) = send(&h.app, get(&format!("/summary/{}", file_id), &h.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["summary"], summary["summary"]);
}

#[tokio::test]
async fn test_failed_registration_removes_written_upload() {
    let h = harness();
    h.db.fail_on("create_file");
    let (status, _) = send(&h.app, multipart_upload(&h.token, &[("notes.txt", LECTURE.as_bytes())])).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stored_file_count(h.uploads.path()), 0);
}

#[tokio::test]
async fn test_short_text_summary_is_not_stored() {
    let h = harness();
    let (_, body) = send(&h.app, multipart_upload(&h.token, &[("memo.txt", b"Read chapter two.")])).await;
    let file_id = body["files"][0]["id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/generate-summary/{}", file_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", h.token))
        .body(Body::empty())
        .unwrap();
    let (status, summary) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["summary"], TOO_SHORT_MESSAGE);

    assert_eq!(h.db.file_summary(Uuid::parse_str(&file_id).unwrap()), None);
    let (status, _) = send(&h.app, get(&format!("/summary/{}", file_id), &h.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_store_outage_is_not_unauthorized() {
    let h = harness();
    h.db.fail_on("validate_auth_session");
    let (status, _) = send(&h.app, get("/uploads", &h.token)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_other_users_files_are_not_found() {
    let h = harness();
    let (_, body) = send(&h.app, multipart_upload(&h.token, &[("notes.md", LECTURE.as_bytes())])).await;
    let file_id = body["files"][0]["id"].as_str().unwrap().to_string();

    let (_, intruder) = h.db.seed_user("mallory@example.com");
    let (status, _) = send(&h.app, get(&format!("/uploads/{}", file_id), &intruder)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_quiz_generation_uses_fallback_without_model() {
    let h = harness();
    let body = generate_quiz(&h).await;
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["quiz"]["lecture_title"], "Biology 101");
    assert_eq!(body["quiz"]["difficulty"], "Hard");
    assert_eq!(body["quiz"]["questions"].as_array().unwrap().len(), 3);
    assert_eq!(body["flashcards"].as_array().unwrap().len(), 3);

    let (status, list) = send(&h.app, get("/quiz?page=0&limit=500", &h.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["pagination"]["page"], 1);
    assert_eq!(list["pagination"]["limit"], 10);
    assert_eq!(list["quizzes"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_quiz_without_summary_is_rejected() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        json_request(Method::POST, "/generate-quiz", Some(&h.token), json!({ "summary": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Summary is required");
}

#[tokio::test]
async fn test_invalid_listing_date_is_bad_request() {
    let h = harness();
    let (status, _) = send(&h.app, get("/flashcards?date=yesterday", &h.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_answer_is_conflict() {
    let h = harness();
    let quiz = generate_quiz(&h).await;
    let quiz_id = quiz["quiz"]["id"].as_str().unwrap().to_string();
    let correct = quiz["quiz"]["questions"][0]["answer"].as_str().unwrap().to_string();
    let uri = format!("/quiz/{}/answer", quiz_id);

    let answer = json!({ "question_index": 0, "selected_answer": correct, "time_taken_ms": 1200 });
    let (status, body) = send(&h.app, json_request(Method::POST, &uri, Some(&h.token), answer.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_correct"], true);
    assert_eq!(body["quiz_completed"], false);

    let (status, _) = send(&h.app, json_request(Method::POST, &uri, Some(&h.token), answer)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(h.db.answer_count(Uuid::parse_str(&quiz_id).unwrap()), 1);
}

#[tokio::test]
async fn test_answering_every_question_completes_the_quiz() {
    let h = harness();
    let quiz = generate_quiz(&h).await;
    let quiz_id = quiz["quiz"]["id"].as_str().unwrap().to_string();
    let questions = quiz["quiz"]["questions"].as_array().unwrap().clone();
    let uri = format!("/quiz/{}/answer", quiz_id);

    let mut last = Value::Null;
    for (i, q) in questions.iter().enumerate() {
        // Answer the first question wrong whenever possible.
        let options = q["options"].as_array().unwrap();
        let choice = if i == 0 {
            options.iter().find(|o| **o != q["answer"]).unwrap_or(&q["answer"]).clone()
        } else {
            q["answer"].clone()
        };
        let (status, body) = send(
            &h.app,
            json_request(
                Method::POST,
                &uri,
                Some(&h.token),
                json!({ "question_index": q["index"], "selected_answer": choice }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        last = body;
    }
    assert_eq!(last["quiz_completed"], true);
    assert_eq!(last["progress"]["answered"], 3);
    assert_eq!(last["progress"]["correct"], 2);
    assert_eq!(last["progress"]["score_percent"], 67);

    let (status, fetched) = send(&h.app, get(&format!("/quiz/{}", quiz_id), &h.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(fetched["completed_at"].is_string());
}

#[tokio::test]
async fn test_concurrent_final_answers_complete_the_quiz() {
    let h = harness();
    let quiz = generate_quiz(&h).await;
    let quiz_id = quiz["quiz"]["id"].as_str().unwrap().to_string();
    let questions = quiz["quiz"]["questions"].as_array().unwrap().clone();
    assert_eq!(questions.len(), 3);

    let (status, _) = send(
        &h.app,
        answer_request(&h.token, &quiz_id, &questions[0], &questions[0]["answer"]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let ((first, a), (second, b)) = tokio::join!(
        send(&h.app, answer_request(&h.token, &quiz_id, &questions[1], &questions[1]["answer"])),
        send(&h.app, answer_request(&h.token, &quiz_id, &questions[2], &questions[2]["answer"])),
    );
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert!(a["quiz_completed"] == true || b["quiz_completed"] == true);

    let (_, fetched) = send(&h.app, get(&format!("/quiz/{}", quiz_id), &h.token)).await;
    assert!(fetched["completed_at"].is_string(), "{fetched}");
}

#[tokio::test]
async fn test_failed_quiz_save_leaves_no_quiz_or_flashcards() {
    let h = harness();
    h.db.fail_on("create_quiz");
    let (status, _) = send(
        &h.app,
        json_request(
            Method::POST,
            "/generate-quiz",
            Some(&h.token),
            json!({ "summary": LECTURE, "lecture_title": "Biology 101" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(h.db.quiz_count(), 0);
    assert_eq!(h.db.flashcard_count(), 0);

    let (status, listing) = send(&h.app, get("/quiz", &h.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["quizzes"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_answer_must_be_an_option() {
    let h = harness();
    let quiz = generate_quiz(&h).await;
    let uri = format!("/quiz/{}/answer", quiz["quiz"]["id"].as_str().unwrap());
    let (status, _) = send(
        &h.app,
        json_request(
            Method::POST,
            &uri,
            Some(&h.token),
            json!({ "question_index": 0, "selected_answer": "Not an option" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &h.app,
        json_request(
            Method::POST,
            &uri,
            Some(&h.token),
            json!({ "question_index": 42, "selected_answer": "x" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_flashcards_from_inline_content() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        json_request(Method::POST, "/generate_flashcards", Some(&h.token), json!({ "content": LECTURE })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["flashcards"].as_array().unwrap().len(), 5);

    let (status, _) = send(
        &h.app,
        json_request(Method::POST, "/generate_flashcards", Some(&h.token), json!({ "content": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, list) = send(&h.app, get("/flashcards?limit=2", &h.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["flashcards"].as_array().unwrap().len(), 2);
    assert_eq!(list["pagination"]["total_count"], 5);
    assert_eq!(list["pagination"]["has_next"], true);
}

#[tokio::test]
async fn test_rating_out_of_range_is_rejected() {
    let h = harness();
    let (status, _) = send(
        &h.app,
        json_request(
            Method::POST,
            "/feedback",
            Some(&h.token),
            json!({ "type": "quiz", "item_id": "q-1", "rating": 6 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for rating in [4, 5] {
        let (status, _) = send(
            &h.app,
            json_request(
                Method::POST,
                "/feedback",
                Some(&h.token),
                json!({ "type": "quiz", "item_id": "q-1", "rating": rating, "comment": "useful" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&h.app, get("/feedback/q-1", &h.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["average_rating"], 4.5);
}

#[tokio::test]
async fn test_stats_reflect_activity() {
    let h = harness();
    generate_quiz(&h).await;
    send(
        &h.app,
        json_request(
            Method::POST,
            "/feedback",
            Some(&h.token),
            json!({ "type": "quiz", "item_id": "q-1", "rating": 3 }),
        ),
    )
    .await;

    let (status, stats) = send(&h.app, get("/stats", &h.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_quizzes"], 1);
    assert_eq!(stats["total_flashcards"], 3);
    assert_eq!(stats["average_rating"], 3.0);

    let (status, progress) = send(&h.app, get("/progress", &h.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["quiz_stats"]["generated"], 1);
    assert_eq!(progress["flashcard_stats"]["created"], 3);
}

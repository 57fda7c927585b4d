//! services/api/src/web/uploads.rs
//!
//! File upload and retrieval endpoints.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use study_assistant_core::domain::{NewFile, StoredFile};
use study_assistant_core::upload_rules::UploadPolicy;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::adapters::extract::extract_text;
use crate::error::HttpError;
use crate::web::state::AppState;

//=========================================================================================
// Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct FileResponse {
    pub id: Uuid,
    pub original_name: String,
    pub category: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
    pub has_text: bool,
    pub summary: Option<String>,
    /// Only present when a single file is requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FileResponse {
    fn from_domain(file: StoredFile, with_content: bool) -> Self {
        Self {
            id: file.id,
            has_text: file.content.as_deref().is_some_and(|c| !c.trim().is_empty()),
            original_name: file.original_name,
            category: file.category.as_str().to_string(),
            size_bytes: file.size_bytes,
            uploaded_at: file.uploaded_at,
            summary: file.summary,
            content: if with_content { file.content } else { None },
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UploadErrorEntry {
    pub filename: String,
    pub error: String,
}

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub files: Vec<FileResponse>,
    pub errors: Vec<UploadErrorEntry>,
}

#[derive(Serialize, ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Loads a file and checks that it belongs to `user_id`. Other users' files are
/// reported as missing.
pub(crate) async fn owned_file(
    state: &AppState,
    user_id: Uuid,
    file_id: Uuid,
) -> Result<StoredFile, HttpError> {
    let file = state.db.get_file(file_id).await?;
    if file.user_id != user_id {
        return Err(HttpError::not_found(format!("File {} not found", file_id)));
    }
    Ok(file)
}

/// Validates, writes and registers one uploaded file.
async fn store_upload(
    state: &AppState,
    policy: &UploadPolicy,
    user_id: Uuid,
    file_name: &str,
    data: &[u8],
) -> Result<StoredFile, HttpError> {
    let accepted = policy.validate(file_name, data.len() as u64)?;

    let dir = state.config.upload_dir.join(accepted.category.as_str());
    tokio::fs::create_dir_all(&dir).await.map_err(|e| {
        error!("Failed to create upload directory {}: {}", dir.display(), e);
        HttpError::internal("Failed to store file")
    })?;
    let path = dir.join(format!("{}_{}", Uuid::new_v4().simple(), accepted.stored_name));
    tokio::fs::write(&path, data).await.map_err(|e| {
        error!("Failed to write upload {}: {}", path.display(), e);
        HttpError::internal("Failed to store file")
    })?;

    let content = extract_text(
        &accepted.extension,
        &accepted.original_name,
        data,
        state.sst_adapter.as_ref(),
    )
    .await;

    let created = state
        .db
        .create_file(NewFile {
            user_id,
            original_name: accepted.original_name,
            category: accepted.category,
            size_bytes: data.len() as i64,
            stored_path: path.to_string_lossy().into_owned(),
            content,
        })
        .await;
    let file = match created {
        Ok(file) => file,
        Err(e) => {
            // No row points at the file, so it must not stay on disk.
            if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                warn!("Failed to remove orphaned upload {}: {}", path.display(), cleanup);
            }
            return Err(e.into());
        }
    };

    info!("Stored upload {} as {}", file.original_name, file.id);
    Ok(file)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Upload one or more files.
///
/// Each `file` part is validated and stored independently; a rejected file does not
/// undo the ones stored before it.
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content_type = "multipart/form-data", description = "One or more `file` parts."),
    responses(
        (status = 201, description = "At least one file was stored", body = UploadResponse),
        (status = 400, description = "No file part, or every file was rejected"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = []))
)]
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let policy = state.upload_policy();
    let mut files = Vec::new();
    let mut failures: Vec<(String, HttpError)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(format!("Failed to read multipart data: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| HttpError::bad_request(format!("Failed to read file bytes: {}", e)))?;

        match store_upload(&state, &policy, user_id, &file_name, &data).await {
            Ok(file) => files.push(FileResponse::from_domain(file, false)),
            Err(e) => {
                warn!("Rejected upload '{}': {}", file_name, e.message);
                failures.push((file_name, e));
            }
        }
    }

    if files.is_empty() {
        let status = failures
            .first()
            .map(|(_, e)| e.status)
            .unwrap_or(StatusCode::BAD_REQUEST);
        let message = if failures.is_empty() {
            "No file part in the request".to_string()
        } else {
            failures
                .iter()
                .map(|(_, e)| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        };
        return Err(HttpError::new(status, message));
    }

    let errors = failures
        .into_iter()
        .map(|(filename, e)| UploadErrorEntry {
            filename,
            error: e.message,
        })
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            success: true,
            files,
            errors,
        }),
    ))
}

/// List the caller's uploads, newest first.
#[utoipa::path(
    get,
    path = "/uploads",
    responses(
        (status = 200, description = "The caller's files", body = FileListResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = []))
)]
pub async fn list_uploads_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<FileListResponse>, HttpError> {
    let files = state.db.list_files_by_user(user_id).await?;
    Ok(Json(FileListResponse {
        files: files
            .into_iter()
            .map(|f| FileResponse::from_domain(f, false))
            .collect(),
    }))
}

/// Fetch one upload including its extracted text.
#[utoipa::path(
    get,
    path = "/uploads/{file_id}",
    params(("file_id" = Uuid, Path, description = "The file to fetch.")),
    responses(
        (status = 200, description = "The file", body = FileResponse),
        (status = 404, description = "No such file for this user")
    ),
    security(("bearer" = []))
)]
pub async fn get_upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<FileResponse>, HttpError> {
    let file = owned_file(&state, user_id, file_id).await?;
    Ok(Json(FileResponse::from_domain(file, true)))
}

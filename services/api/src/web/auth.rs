//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, profile and logout.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use study_assistant_core::domain::User;
use study_assistant_core::ports::PortError;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::middleware::bearer_token;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.user_id,
            email: user.email,
            full_name: user.full_name,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub access_token: String,
    pub user: UserResponse,
}

#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserResponse,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

//=========================================================================================
// Validation
//=========================================================================================

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("static regex is valid")
    })
}

pub fn validate_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// At least 8 characters with an uppercase letter, a lowercase letter and a digit.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number");
    }
    Ok(())
}

/// Issues a fresh opaque token for `user_id`.
async fn issue_token(state: &AppState, user_id: Uuid) -> Result<String, HttpError> {
    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(state.config.token_ttl_days);
    state
        .db
        .create_auth_session(&token, user_id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            HttpError::internal("Failed to create session")
        })?;
    Ok(token)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /users/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/users/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Missing field, invalid email or weak password"),
        (status = 409, description = "A user with this email already exists")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let email = req.email.trim().to_lowercase();
    let full_name = req.full_name.trim().to_string();
    for (field, value) in [("email", &email), ("password", &req.password), ("full_name", &full_name)] {
        if value.is_empty() {
            return Err(HttpError::bad_request(format!("{} is required", field)));
        }
    }
    if !validate_email(&email) {
        return Err(HttpError::bad_request("Invalid email format"));
    }
    validate_password(&req.password).map_err(HttpError::bad_request)?;

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            HttpError::internal("Failed to hash password")
        })?
        .to_string();

    // 2. Create user in database
    let user = state.db.create_user(&email, &full_name, &password_hash).await?;

    // 3. Log the new user in
    let access_token = issue_token(&state, user.user_id).await?;
    info!("New user {} signed up", user.user_id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".to_string(),
            access_token,
            user: user.into(),
        }),
    ))
}

/// POST /users/login - Login with existing account
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Email and password are required"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(HttpError::bad_request("Email and password are required"));
    }

    // 1. Get user by email
    let creds = match state.db.get_user_by_email(&email).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => {
            return Err(HttpError::unauthorized("Invalid email or password"))
        }
        Err(e) => return Err(e.into()),
    };

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        HttpError::internal("Authentication error")
    })?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(HttpError::unauthorized("Invalid email or password"));
    }

    // 3. Issue a token
    let access_token = issue_token(&state, creds.user.user_id).await?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        access_token,
        user: creds.user.into(),
    }))
}

/// GET /users/me - The profile behind the bearer token
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    security(("bearer" = []))
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<MeResponse>, HttpError> {
    let user = state.db.get_user_by_id(user_id).await?;
    Ok(Json(MeResponse { user: user.into() }))
}

/// POST /users/logout - Invalidate the bearer token
#[utoipa::path(
    post,
    path = "/users/logout",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = []))
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, HttpError> {
    let token = bearer_token(&headers).ok_or_else(|| HttpError::unauthorized("Missing bearer token"))?;
    state.db.delete_auth_session(token).await?;
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("ada@example.com"));
        assert!(validate_email("first.last+tag@uni.ac.uk"));
        assert!(!validate_email("ada@example"));
        assert!(!validate_email("not an email"));
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("Secr3tPass").is_ok());
        assert_eq!(validate_password("Sh0rt"), Err("Password must be at least 8 characters long"));
        assert!(validate_password("alllowercase1").is_err());
        assert!(validate_password("ALLUPPERCASE1").is_err());
        assert!(validate_password("NoDigitsHere").is_err());
    }
}

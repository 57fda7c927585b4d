//! crates/study_client/src/session.rs
//!
//! The logged-in session and its on-disk store. The store is only touched at
//! explicit points: after login or signup, after refreshing the profile, and
//! at logout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

/// Persists one `Session` as a JSON file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored session, or `None` when nobody is logged in.
    pub async fn load(&self) -> Result<Option<Session>, ClientError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ClientError::Session(format!("Failed to read session: {}", e))),
        };
        let session = serde_json::from_slice(&raw)
            .map_err(|e| ClientError::Session(format!("Stored session is corrupt: {}", e)))?;
        debug!("Loaded session from {}", self.path.display());
        Ok(Some(session))
    }

    pub async fn save(&self, session: &Session) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClientError::Session(format!("Failed to create session directory: {}", e)))?;
        }
        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| ClientError::Session(format!("Failed to encode session: {}", e)))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| ClientError::Session(format!("Failed to write session: {}", e)))?;
        info!("Saved session for {}", session.user.email);
        Ok(())
    }

    /// Removes the stored session. Clearing an absent session is not an error.
    pub async fn clear(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Session(format!("Failed to clear session: {}", e))),
        }
    }
}

/// The screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Signup,
    Dashboard,
    Upload,
    Summaries,
    Quiz,
    Flashcards,
    Explain,
    Progress,
    Stats,
    Profile,
}

impl Route {
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Home | Route::Login | Route::Signup)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
}

/// Protected routes need a session; everything else is always allowed.
pub fn guard(route: Route, session: Option<&Session>) -> GuardDecision {
    if route.is_protected() && session.is_none() {
        GuardDecision::RedirectToLogin
    } else {
        GuardDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            token: "tok-1".into(),
            user: SessionUser {
                id: Uuid::new_v4(),
                email: "ada@example.com".into(),
                full_name: "Ada Lovelace".into(),
            },
        }
    }

    #[tokio::test]
    async fn test_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.load().await.unwrap(), None);

        let s = session();
        store.save(&s).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(s));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_session_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        let err = SessionStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, ClientError::Session(_)));
    }

    #[test]
    fn test_guard() {
        let s = session();
        assert_eq!(guard(Route::Quiz, None), GuardDecision::RedirectToLogin);
        assert_eq!(guard(Route::Quiz, Some(&s)), GuardDecision::Allow);
        assert_eq!(guard(Route::Login, None), GuardDecision::Allow);
        assert_eq!(guard(Route::Home, None), GuardDecision::Allow);
    }
}

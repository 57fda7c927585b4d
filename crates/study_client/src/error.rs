//! crates/study_client/src/error.rs

use study_assistant_core::upload_rules::UploadRejection;

/// Everything a client call can fail with. Nothing is retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Request failed with status {code}: {message}")]
    Status { code: u16, message: String },

    /// Rejected locally; no request was sent.
    #[error("Upload rejected: {0}")]
    Rejected(#[from] UploadRejection),

    #[error("Session error: {0}")]
    Session(String),

    /// Reading a local file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ClientError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Status { code, .. } => Some(*code),
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for 401 responses, after which the stored session is useless.
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }
}

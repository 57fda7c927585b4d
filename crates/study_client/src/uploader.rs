//! crates/study_client/src/uploader.rs
//!
//! Batch uploads. Every file is validated locally before anything is sent,
//! files go up one at a time, and a failure never undoes earlier successes.

use std::path::{Path, PathBuf};
use study_assistant_core::upload_rules::UploadPolicy;
use tracing::{info, warn};

use crate::api::StudyClient;
use crate::error::ClientError;
use crate::normalize::UploadSummary;

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, ClientError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data = tokio::fs::read(path).await?;
        Ok(Self { name, data })
    }
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub file_name: String,
    pub result: Result<Vec<UploadSummary>, ClientError>,
}

/// Per-file results of one batch, in submission order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl BatchReport {
    pub fn uploaded(&self) -> impl Iterator<Item = &UploadSummary> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ClientError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.file_name.as_str(), e)))
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures().next().is_none()
    }
}

pub struct Uploader {
    client: StudyClient,
    policy: UploadPolicy,
}

impl Uploader {
    pub fn new(client: StudyClient, policy: UploadPolicy) -> Self {
        Self { client, policy }
    }

    /// Local validation only; a rejected file never reaches the network.
    pub fn check(&self, file: &PendingFile) -> Result<(), ClientError> {
        self.policy.validate(&file.name, file.data.len() as u64)?;
        Ok(())
    }

    pub async fn upload(&self, file: PendingFile) -> UploadOutcome {
        let result = match self.check(&file) {
            Ok(()) => self.client.upload_file(&file.name, file.data).await,
            Err(e) => Err(e),
        };
        match &result {
            Ok(_) => info!("Uploaded {}", file.name),
            Err(e) => warn!("Upload of {} failed: {}", file.name, e),
        }
        UploadOutcome {
            file_name: file.name,
            result,
        }
    }

    /// Uploads `files` sequentially and reports on each one.
    pub async fn upload_batch(&self, files: Vec<PendingFile>) -> BatchReport {
        let mut report = BatchReport::default();
        for file in files {
            report.outcomes.push(self.upload(file).await);
        }
        report
    }

    pub async fn upload_paths(&self, paths: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport::default();
        for path in paths {
            let outcome = match PendingFile::from_path(path).await {
                Ok(file) => self.upload(file).await,
                Err(e) => UploadOutcome {
                    file_name: path.display().to_string(),
                    result: Err(e),
                },
            };
            report.outcomes.push(outcome);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_assistant_core::upload_rules::UploadRejection;

    // Nothing listens here; any request that slipped through would be a Network error.
    fn offline_uploader(max_bytes: u64) -> Uploader {
        let client = StudyClient::new("http://127.0.0.1:9").unwrap();
        Uploader::new(client, UploadPolicy::new(max_bytes))
    }

    #[tokio::test]
    async fn test_exe_is_rejected_before_the_network() {
        let uploader = offline_uploader(1024);
        let outcome = uploader.upload(PendingFile::new("setup.exe", vec![1, 2, 3])).await;
        assert!(matches!(
            outcome.result,
            Err(ClientError::Rejected(UploadRejection::UnsupportedExtension { .. }))
        ));
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected_before_the_network() {
        let uploader = offline_uploader(4);
        let outcome = uploader.upload(PendingFile::new("notes.txt", vec![b'a'; 5])).await;
        assert!(matches!(
            outcome.result,
            Err(ClientError::Rejected(UploadRejection::TooLarge { size: 5, limit: 4, .. }))
        ));
    }

    #[tokio::test]
    async fn test_batch_reports_every_file() {
        let uploader = offline_uploader(1024);
        let report = uploader
            .upload_batch(vec![
                PendingFile::new("a.exe", vec![1]),
                PendingFile::new("b.txt", Vec::new()),
                PendingFile::new("c", vec![1]),
            ])
            .await;
        assert_eq!(report.outcomes.len(), 3);
        assert!(!report.all_succeeded());
        let names: Vec<&str> = report.failures().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a.exe", "b.txt", "c"]);
        assert!(report
            .failures()
            .all(|(_, e)| matches!(e, ClientError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_unreadable_path_is_an_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let uploader = offline_uploader(1024);
        let report = uploader.upload_paths(&[missing]).await;
        assert_eq!(report.outcomes.len(), 1);
        assert!(matches!(report.outcomes[0].result, Err(ClientError::Io(_))));
    }
}

//! crates/study_assistant_core/src/upload_rules.rs
//!
//! Which files may be uploaded, where they are filed, and what name they are stored under.
//! Both the client (before any network call) and the server apply these rules.

use crate::domain::FileCategory;

/// Default per-file size limit: 10 MB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[(&str, FileCategory)] = &[
    ("pdf", FileCategory::Pdfs),
    ("docx", FileCategory::Presentations),
    ("pptx", FileCategory::Presentations),
    ("txt", FileCategory::Documents),
    ("md", FileCategory::Documents),
    ("mp3", FileCategory::Audio),
    ("wav", FileCategory::Audio),
];

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("No selected file")]
    EmptyName,
    #[error("File '{0}' has no extension")]
    MissingExtension(String),
    #[error("File type '.{extension}' is not allowed. Supported: {supported}")]
    UnsupportedExtension { extension: String, supported: String },
    #[error("File '{0}' is empty")]
    EmptyFile(String),
    #[error("File '{name}' is {size} bytes; the limit is {limit} bytes")]
    TooLarge { name: String, size: u64, limit: u64 },
}

/// A file that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedUpload {
    pub original_name: String,
    pub stored_name: String,
    pub extension: String,
    pub category: FileCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn supported_extensions() -> Vec<&'static str> {
        ALLOWED_EXTENSIONS.iter().map(|(ext, _)| *ext).collect()
    }

    /// Checks name, extension and size of a candidate upload.
    pub fn validate(&self, file_name: &str, size: u64) -> Result<AcceptedUpload, UploadRejection> {
        let name = file_name.trim();
        if name.is_empty() {
            return Err(UploadRejection::EmptyName);
        }

        let extension = extension_of(name)
            .ok_or_else(|| UploadRejection::MissingExtension(name.to_string()))?;
        let category = category_for_extension(&extension).ok_or_else(|| {
            UploadRejection::UnsupportedExtension {
                extension: extension.clone(),
                supported: Self::supported_extensions().join(", "),
            }
        })?;

        if size == 0 {
            return Err(UploadRejection::EmptyFile(name.to_string()));
        }
        if size > self.max_bytes {
            return Err(UploadRejection::TooLarge {
                name: name.to_string(),
                size,
                limit: self.max_bytes,
            });
        }

        Ok(AcceptedUpload {
            original_name: name.to_string(),
            stored_name: secure_filename(name),
            extension,
            category,
        })
    }
}

/// Lowercased extension after the last dot, if any.
pub fn extension_of(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn category_for_extension(extension: &str) -> Option<FileCategory> {
    let ext = extension.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .iter()
        .find(|(allowed, _)| *allowed == ext)
        .map(|(_, category)| *category)
}

/// Reduces a client-supplied name to something safe to use as a path component.
pub fn secure_filename(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']).to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

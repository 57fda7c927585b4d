//! services/api/src/adapters/extract.rs
//!
//! Pulls study text out of an uploaded file.

use study_assistant_core::ports::SpeechToTextService;
use tracing::{info, warn};

/// Returns the text of an upload, or `None` when the format carries no
/// extractable text or extraction fails. Failures never reject the upload.
pub async fn extract_text(
    extension: &str,
    file_name: &str,
    data: &[u8],
    sst: &dyn SpeechToTextService,
) -> Option<String> {
    let text = match extension {
        "txt" | "md" => Some(String::from_utf8_lossy(data).into_owned()),
        "pdf" => {
            let bytes = data.to_vec();
            match tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await {
                Ok(Ok(text)) => Some(text),
                Ok(Err(e)) => {
                    warn!("Failed to extract text from PDF {}: {}", file_name, e);
                    None
                }
                Err(e) => {
                    warn!("PDF extraction task for {} failed: {}", file_name, e);
                    None
                }
            }
        }
        "mp3" | "wav" => match sst.transcribe_audio(file_name, data).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Failed to transcribe {}: {}", file_name, e);
                None
            }
        },
        _ => None,
    };

    let text = text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    if let Some(t) = &text {
        info!("Extracted {} chars from {}", t.len(), file_name);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::offline::OfflineAdapter;

    #[tokio::test]
    async fn test_plain_text_is_read_as_utf8() {
        let text = extract_text("md", "notes.md", b"  # Cells\nThe cell is the unit of life.\n", &OfflineAdapter).await;
        assert_eq!(text.as_deref(), Some("# Cells\nThe cell is the unit of life."));
    }

    #[tokio::test]
    async fn test_unsupported_or_failed_extraction_yields_none() {
        assert_eq!(extract_text("pptx", "slides.pptx", b"PK\x03\x04", &OfflineAdapter).await, None);
        assert_eq!(extract_text("mp3", "talk.mp3", b"ID3", &OfflineAdapter).await, None);
        assert_eq!(extract_text("pdf", "broken.pdf", b"not a pdf", &OfflineAdapter).await, None);
        assert_eq!(extract_text("txt", "blank.txt", b"   \n", &OfflineAdapter).await, None);
    }
}

//! services/api/src/adapters/offline.rs
//!
//! Stand-in for every model-backed port when no OpenAI key is configured.
//! Each call reports `Unavailable`, which sends the handlers to their fallbacks.

use async_trait::async_trait;
use study_assistant_core::generation::{FlashcardDraft, StudyMaterial};
use study_assistant_core::ports::{
    ExplanationService, FlashcardGenerationService, PortError, PortResult, QuizGenerationService,
    SpeechToTextService, SummaryService,
};
use study_assistant_core::summary::SummaryLength;

#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineAdapter;

fn unavailable<T>() -> PortResult<T> {
    Err(PortError::Unavailable(
        "No language model is configured (OPENAI_API_KEY is not set)".to_string(),
    ))
}

#[async_trait]
impl QuizGenerationService for OfflineAdapter {
    async fn generate_study_material(&self, _content: &str) -> PortResult<StudyMaterial> {
        unavailable()
    }
}

#[async_trait]
impl FlashcardGenerationService for OfflineAdapter {
    async fn generate_flashcards(&self, _content: &str) -> PortResult<Vec<FlashcardDraft>> {
        unavailable()
    }
}

#[async_trait]
impl SummaryService for OfflineAdapter {
    async fn summarize(&self, _text: &str, _length: SummaryLength) -> PortResult<String> {
        unavailable()
    }
}

#[async_trait]
impl ExplanationService for OfflineAdapter {
    async fn explain_passage(&self, _passage: &str) -> PortResult<String> {
        unavailable()
    }
}

#[async_trait]
impl SpeechToTextService for OfflineAdapter {
    async fn transcribe_audio(&self, _file_name: &str, _audio_data: &[u8]) -> PortResult<String> {
        unavailable()
    }
}

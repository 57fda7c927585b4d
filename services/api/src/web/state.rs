//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use study_assistant_core::ports::{
    DatabaseService, ExplanationService, FlashcardGenerationService, QuizGenerationService,
    SpeechToTextService, SummaryService,
};
use study_assistant_core::upload_rules::UploadPolicy;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub quiz_adapter: Arc<dyn QuizGenerationService>,
    pub flashcard_adapter: Arc<dyn FlashcardGenerationService>,
    pub summary_adapter: Arc<dyn SummaryService>,
    pub explain_adapter: Arc<dyn ExplanationService>,
    pub sst_adapter: Arc<dyn SpeechToTextService>,
}

impl AppState {
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(self.config.max_upload_bytes)
    }
}

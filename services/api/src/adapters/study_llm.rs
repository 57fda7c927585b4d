//! services/api/src/adapters/study_llm.rs
//!
//! Adapters for the quiz and flashcard generating LLMs.
//! They implement `QuizGenerationService` and `FlashcardGenerationService`.

use crate::adapters::chat::ChatModel;
use async_trait::async_trait;
use study_assistant_core::generation::{
    parse_flashcards, parse_study_material, FlashcardDraft, StudyMaterial, FLASHCARD_DECK_SIZE,
};
use study_assistant_core::ports::{
    FlashcardGenerationService, PortError, PortResult, QuizGenerationService,
};
use tracing::debug;

const QUIZ_SYSTEM_PROMPT: &str = "You are an expert quiz generator. You only ever answer with valid JSON.";

const QUIZ_PROMPT_TEMPLATE: &str = r#"Based on the following content, create EXACTLY 3 multiple-choice quiz questions and EXACTLY 3 flashcards.

Content:
{content}

Instructions:
1. Create questions that test understanding of key concepts
2. Make sure each multiple choice question has 4 options
3. Ensure one option is clearly correct and copy it verbatim into "answer"
4. Create flashcards that help memorize important information
5. Be specific and accurate to the content provided

Return ONLY valid JSON in this exact format:
{
  "quiz": [
    {"question": "...", "options": ["A", "B", "C", "D"], "answer": "A"}
  ],
  "flashcards": [
    {"question": "...", "answer": "..."}
  ]
}"#;

const FLASHCARD_SYSTEM_PROMPT: &str =
    "You create study flashcards. You only ever answer with a valid JSON array.";

const FLASHCARD_PROMPT_TEMPLATE: &str = r#"Generate exactly {count} high-quality flashcards from the following content.

Content: {content}

Instructions:
1. Cover the most important concepts
2. Questions should be clear, concise, and test key understanding
3. Answers should be 2-3 sentences at most
4. Focus on definitions, key concepts, processes, and important facts

Return ONLY a JSON array in this exact format:
[
  {"question": "What is the main concept?", "answer": "The main concept is..."}
]"#;

//=========================================================================================
// Quiz generation
//=========================================================================================

/// An adapter that implements `QuizGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiQuizAdapter {
    chat: ChatModel,
}

impl OpenAiQuizAdapter {
    pub fn new(chat: ChatModel) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl QuizGenerationService for OpenAiQuizAdapter {
    async fn generate_study_material(&self, content: &str) -> PortResult<StudyMaterial> {
        let prompt = QUIZ_PROMPT_TEMPLATE.replace("{content}", content);
        let raw = self.chat.complete(QUIZ_SYSTEM_PROMPT, prompt, 1500, 0.3).await?;
        debug!("Quiz model {} replied with {} chars", self.chat.model(), raw.len());

        parse_study_material(&raw).map_err(|e| PortError::Unavailable(e.to_string()))
    }
}

//=========================================================================================
// Flashcard generation
//=========================================================================================

/// An adapter that implements `FlashcardGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiFlashcardAdapter {
    chat: ChatModel,
}

impl OpenAiFlashcardAdapter {
    pub fn new(chat: ChatModel) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl FlashcardGenerationService for OpenAiFlashcardAdapter {
    async fn generate_flashcards(&self, content: &str) -> PortResult<Vec<FlashcardDraft>> {
        let prompt = FLASHCARD_PROMPT_TEMPLATE
            .replace("{count}", &FLASHCARD_DECK_SIZE.to_string())
            .replace("{content}", content);
        let raw = self.chat.complete(FLASHCARD_SYSTEM_PROMPT, prompt, 1500, 0.3).await?;

        let mut cards = parse_flashcards(&raw).map_err(|e| PortError::Unavailable(e.to_string()))?;
        if cards.is_empty() {
            return Err(PortError::Unavailable(
                "Flashcard model returned no usable cards".to_string(),
            ));
        }
        cards.truncate(FLASHCARD_DECK_SIZE);
        Ok(cards)
    }
}

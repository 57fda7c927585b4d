//! services/api/src/adapters/explain_llm.rs
//!
//! This module contains the adapter for the passage-explaining LLM.
//! It implements the `ExplanationService` port from the `core` crate.

use crate::adapters::chat::ChatModel;
use async_trait::async_trait;
use study_assistant_core::ports::{ExplanationService, PortResult};

const SYSTEM_PROMPT: &str = "You are a teaching assistant. Explain complex ideas simply for university students. \
Give a concise explanation, one short concrete example, and an optional analogy.";

const USER_PROMPT_TEMPLATE: &str = r#"Identify the key idea and explain it simply in 2-3 lines.
Then provide ONE short example and (optional) an analogy.

Sentence:
"""{sentence}"""

Format:
- Core idea:
- Simple explanation (2-3 lines):
- Example:
- Analogy (optional):"#;

/// An adapter that implements `ExplanationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiExplainAdapter {
    chat: ChatModel,
}

impl OpenAiExplainAdapter {
    pub fn new(chat: ChatModel) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl ExplanationService for OpenAiExplainAdapter {
    async fn explain_passage(&self, passage: &str) -> PortResult<String> {
        let prompt = USER_PROMPT_TEMPLATE.replace("{sentence}", passage);
        let explanation = self.chat.complete(SYSTEM_PROMPT, prompt, 400, 0.2).await?;
        Ok(explanation.trim().to_string())
    }
}

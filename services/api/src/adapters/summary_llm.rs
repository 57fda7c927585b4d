//! services/api/src/adapters/summary_llm.rs
//!
//! This module contains the adapter for the summarizing LLM.
//! It implements the `SummaryService` port from the `core` crate.

use crate::adapters::chat::ChatModel;
use async_trait::async_trait;
use study_assistant_core::ports::{PortResult, SummaryService};
use study_assistant_core::summary::SummaryLength;

const SYSTEM_PROMPT: &str = "You are an expert at summarizing lecture material for university students. \
Write clear, well-organized prose that keeps the key concepts, definitions and conclusions. \
Separate paragraphs with a blank line. Do not add information that is not in the text.";

/// An adapter that implements `SummaryService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiSummaryAdapter {
    chat: ChatModel,
}

impl OpenAiSummaryAdapter {
    pub fn new(chat: ChatModel) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl SummaryService for OpenAiSummaryAdapter {
    async fn summarize(&self, text: &str, length: SummaryLength) -> PortResult<String> {
        let (min_words, max_words) = length.target_words();
        let prompt = format!(
            "Write a {} summary of the following text in roughly {} to {} words.\n\nTEXT:\n{}",
            length, min_words, max_words, text
        );
        // ~1.3 tokens per word, plus headroom.
        let max_tokens = (max_words as u32) * 2;
        let summary = self.chat.complete(SYSTEM_PROMPT, prompt, max_tokens, 0.3).await?;
        Ok(summary.trim().to_string())
    }
}

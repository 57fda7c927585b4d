//! services/api/src/adapters/sst.rs
//!
//! Whisper transcription for uploaded lecture recordings. A failed or empty
//! transcription leaves the upload without extracted text.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{AudioInput, CreateTranscriptionRequest},
    Client,
};
use async_trait::async_trait;
use study_assistant_core::ports::{PortError, PortResult, SpeechToTextService};
use tracing::info;

#[derive(Clone)]
pub struct OpenAiSstAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiSstAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl SpeechToTextService for OpenAiSstAdapter {
    /// Uploaded mp3/wav files are sent as-is; Whisper detects the format from the name.
    async fn transcribe_audio(&self, file_name: &str, audio_data: &[u8]) -> PortResult<String> {
        let input = AudioInput::from_vec_u8(file_name.to_string(), audio_data.to_vec());

        let request = CreateTranscriptionRequest {
            file: input,
            model: self.model.clone(),
            ..Default::default()
        };

        let transcript = self
            .client
            .audio()
            .transcription()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unavailable(format!("Transcription failed: {}", e)))?
            .text;

        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(PortError::Unavailable(format!("No speech recognized in {}", file_name)));
        }
        info!("Transcribed {} ({} chars)", file_name, transcript.len());
        Ok(transcript.to_string())
    }
}

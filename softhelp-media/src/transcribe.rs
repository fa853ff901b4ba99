//! Speech-to-text transcription of uploaded audio.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{MediaError, Result, api_error_detail};

/// The OpenAI transcription API endpoint.
const OPENAI_TRANSCRIPTIONS_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Default transcription model.
const DEFAULT_MODEL: &str = "whisper-1";

/// Default spoken language of uploaded questions.
const DEFAULT_LANGUAGE: &str = "es";

/// Default per-request timeout; uploads carry whole audio files.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A service that turns recorded speech into text.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe the bytes of one uploaded audio file.
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String>;
}

/// [`SpeechToText`] backed by the OpenAI transcription API.
pub struct OpenAiTranscriber {
    client: reqwest::Client,
    api_key: String,
    model: String,
    language: String,
    timeout: Duration,
}

impl OpenAiTranscriber {
    /// Create a new transcriber with the given API key.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Transcription`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(MediaError::Transcription {
                provider: "OpenAI".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.into(),
            language: DEFAULT_LANGUAGE.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the expected spoken language (ISO 639-1 code).
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl SpeechToText for OpenAiTranscriber {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String> {
        debug!(
            provider = "OpenAI",
            bytes = audio.len(),
            file_name,
            model = %self.model,
            "transcribing audio"
        );

        let part = Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str("audio/mpeg")
            .map_err(|e| MediaError::Transcription {
                provider: "OpenAI".into(),
                message: format!("failed to build upload part: {e}"),
            })?;
        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("language", self.language.clone());

        let response = self
            .client
            .post(OPENAI_TRANSCRIPTIONS_URL)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "OpenAI", error = %e, "transcription request failed");
                MediaError::Transcription {
                    provider: "OpenAI".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = api_error_detail(response.text().await.unwrap_or_default());
            error!(provider = "OpenAI", %status, "transcription API error");
            return Err(MediaError::Transcription {
                provider: "OpenAI".into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let parsed: TranscriptionResponse =
            response.json().await.map_err(|e| MediaError::Transcription {
                provider: "OpenAI".into(),
                message: format!("failed to parse response: {e}"),
            })?;

        Ok(parsed.text)
    }
}

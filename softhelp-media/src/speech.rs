//! Speech synthesis of assistant answers.
//!
//! Answers go back to the user as text plus a spoken mp3; the synthesizer
//! writes the audio into a configured output directory served by the HTTP
//! layer.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{MediaError, Result, api_error_detail};

/// The OpenAI speech synthesis API endpoint.
const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Default synthesis model.
const DEFAULT_MODEL: &str = "gpt-4o-mini-tts";

/// Default voice.
const DEFAULT_VOICE: &str = "alloy";

/// Default per-request timeout; responses carry whole audio files.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A service that speaks text into an audio file.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` in the given language (ISO 639-1 code) and return
    /// the path of the written mp3.
    async fn synthesize(&self, text: &str, language: &str) -> Result<PathBuf>;
}

/// [`SpeechSynthesizer`] backed by the OpenAI speech API.
///
/// Files are written to the configured output directory as
/// `{yyyymmdd_hhmmss}_{suffix}.mp3`, so concurrent answers never collide.
pub struct OpenAiSpeech {
    client: reqwest::Client,
    api_key: String,
    model: String,
    voice: String,
    output_dir: PathBuf,
    timeout: Duration,
}

impl OpenAiSpeech {
    /// Create a new synthesizer writing into `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Synthesis`] if the key is empty.
    pub fn new(api_key: impl Into<String>, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(MediaError::Synthesis {
                provider: "OpenAI".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.into(),
            voice: DEFAULT_VOICE.into(),
            output_dir: output_dir.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the voice.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }
}

/// Output file name: timestamp plus a short random suffix.
fn audio_file_name() -> String {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{stamp}_{}.mp3", &suffix[..8])
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str, language: &str) -> Result<PathBuf> {
        debug!(
            provider = "OpenAI",
            text_len = text.len(),
            language,
            model = %self.model,
            "synthesizing speech"
        );

        let body = json!({
            "model": self.model,
            "voice": self.voice,
            "input": text,
            "response_format": "mp3",
            "instructions": format!("Habla con naturalidad en el idioma '{language}'."),
        });

        let response = self
            .client
            .post(OPENAI_SPEECH_URL)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "OpenAI", error = %e, "speech request failed");
                MediaError::Synthesis {
                    provider: "OpenAI".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = api_error_detail(response.text().await.unwrap_or_default());
            error!(provider = "OpenAI", %status, "speech API error");
            return Err(MediaError::Synthesis {
                provider: "OpenAI".into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let audio = response.bytes().await.map_err(|e| MediaError::Synthesis {
            provider: "OpenAI".into(),
            message: format!("failed to read audio body: {e}"),
        })?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(audio_file_name());
        tokio::fs::write(&path, &audio).await?;
        info!(path = %path.display(), bytes = audio.len(), "wrote synthesized audio");

        Ok(path)
    }
}

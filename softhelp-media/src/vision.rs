//! On-screen text extraction from screenshots.
//!
//! Support questions often arrive as a screenshot of an error dialog; the
//! extractor reads every piece of visible text out of the image so the
//! answering pipeline can treat it as the `Message_System` context.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::error::{MediaError, Result, api_error_detail};

/// The OpenAI chat completions API endpoint.
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default vision-capable model.
const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Instruction for verbatim extraction of all visible text.
const EXTRACTION_PROMPT: &str = "## Role\n\
    Extrae TODO el texto que ves en esta captura de pantalla de un software.\n\
    ## Rules\n\
    - Respóndelo tal cual aparece, sin comentar nada más.\n\
    - Incluye códigos de error, rutas de archivos y mensajes en inglés o español.";

/// A service that reads the visible text out of a screenshot.
#[async_trait]
pub trait ImageTextExtractor: Send + Sync {
    /// Extract the visible text from an uploaded image.
    async fn extract_text(&self, image: Vec<u8>, mime_type: &str) -> Result<String>;
}

/// [`ImageTextExtractor`] backed by a vision-capable OpenAI chat model.
pub struct OpenAiScreenReader {
    client: reqwest::Client,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiScreenReader {
    /// Create a new screen reader with the given API key.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Vision`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(MediaError::Vision {
                provider: "OpenAI".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Inline `data:` URL for an uploaded image.
fn data_url(mime_type: &str, image: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64.encode(image))
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl ImageTextExtractor for OpenAiScreenReader {
    async fn extract_text(&self, image: Vec<u8>, mime_type: &str) -> Result<String> {
        debug!(
            provider = "OpenAI",
            bytes = image.len(),
            mime_type,
            model = %self.model,
            "extracting screen text"
        );

        let body = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": EXTRACTION_PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url(mime_type, &image) } },
                ],
            }],
        });

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "OpenAI", error = %e, "screen reading request failed");
                MediaError::Vision {
                    provider: "OpenAI".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = api_error_detail(response.text().await.unwrap_or_default());
            error!(provider = "OpenAI", %status, "screen reading API error");
            return Err(MediaError::Vision {
                provider: "OpenAI".into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| MediaError::Vision {
            provider: "OpenAI".into(),
            message: format!("failed to parse response: {e}"),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| MediaError::Vision {
                provider: "OpenAI".into(),
                message: "response contained no message content".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_an_empty_api_key() {
        assert!(matches!(OpenAiScreenReader::new(""), Err(MediaError::Vision { .. })));
    }

    #[test]
    fn data_urls_carry_the_mime_type_and_payload() {
        let url = data_url("image/png", &[1, 2, 3]);
        assert!(url.starts_with("data:image/png;base64,"));
        assert!(url.ends_with(&BASE64.encode([1, 2, 3])));
    }
}

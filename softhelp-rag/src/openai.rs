//! OpenAI clients for embeddings and chat completions.
//!
//! Both clients call the HTTP API directly through `reqwest`, apply a
//! per-request timeout, and retry transient failures once with backoff.
//! Responses are parsed against the documented schema only; an
//! unrecognized shape is an error, never a guess.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::completion::CompletionProvider;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::retry::RetryPolicy;

/// The OpenAI embeddings API endpoint.
const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// The OpenAI chat completions API endpoint.
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default embedding model; corpus and query must use the same one.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default dimensionality for `text-embedding-3-small`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// Default chat model for answer generation.
const DEFAULT_CHAT_MODEL: &str = "gpt-4.1-mini";

/// Default per-request timeout for both endpoints.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ── Shared request plumbing ────────────────────────────────────────

/// A failed request, classified so the retry loop can tell transient
/// failures from permanent ones.
enum RequestFailure {
    Transport(reqwest::Error),
    Api { status: StatusCode, detail: String },
    Decode(String),
}

impl RequestFailure {
    fn retryable(&self) -> bool {
        match self {
            RequestFailure::Transport(_) => true,
            RequestFailure::Api { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            RequestFailure::Decode(_) => false,
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestFailure::Transport(e) => write!(f, "request failed: {e}"),
            RequestFailure::Api { status, detail } => {
                write!(f, "API returned {status}: {detail}")
            }
            RequestFailure::Decode(e) => write!(f, "failed to parse response: {e}"),
        }
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

async fn post_json<B, R>(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    timeout: Duration,
    body: &B,
) -> std::result::Result<R, RequestFailure>
where
    B: Serialize,
    R: DeserializeOwned,
{
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .timeout(timeout)
        .json(body)
        .send()
        .await
        .map_err(RequestFailure::Transport)?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(RequestFailure::Api { status, detail });
    }

    response.json::<R>().await.map_err(|e| RequestFailure::Decode(e.to_string()))
}

async fn post_json_with_retry<B, R>(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    timeout: Duration,
    body: &B,
    policy: RetryPolicy,
    provider: &str,
) -> std::result::Result<R, RequestFailure>
where
    B: Serialize,
    R: DeserializeOwned,
{
    let mut attempt = 0u32;
    loop {
        match post_json(client, url, api_key, timeout, body).await {
            Ok(value) => return Ok(value),
            Err(failure) if attempt < policy.max_retries && failure.retryable() => {
                let delay = policy.delay_for(attempt);
                warn!(
                    provider,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %failure,
                    "request failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(failure) => return Err(failure),
        }
    }
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
///
/// # Configuration
///
/// - `model` – defaults to `text-embedding-3-small`.
/// - `api_key` – from the constructor or the `OPENAI_API_KEY` environment
///   variable.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
    timeout: Duration,
    retry: RetryPolicy,
}

impl OpenAiEmbeddings {
    /// Create a new provider with the given API key.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingService`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::EmbeddingService {
                provider: "OpenAI".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        })
    }

    /// Create a new provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| RagError::Config(
            "OPENAI_API_KEY environment variable not set".to_string(),
        ))?;
        Self::new(api_key)
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the dimensionality advertised to the index.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| RagError::EmbeddingService {
            provider: "OpenAI".into(),
            message: "API returned empty response".into(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "OpenAI",
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let request = EmbeddingRequest { model: &self.model, input: texts };
        let response: EmbeddingResponse = post_json_with_retry(
            &self.client,
            OPENAI_EMBEDDINGS_URL,
            &self.api_key,
            self.timeout,
            &request,
            self.retry,
            "OpenAI embeddings",
        )
        .await
        .map_err(|failure| {
            error!(provider = "OpenAI", error = %failure, "embedding request failed");
            RagError::EmbeddingService { provider: "OpenAI".into(), message: failure.to_string() }
        })?;

        if response.data.len() != texts.len() {
            return Err(RagError::EmbeddingService {
                provider: "OpenAI".into(),
                message: format!(
                    "API returned {} embeddings for {} inputs",
                    response.data.len(),
                    texts.len()
                ),
            });
        }

        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Chat completions ───────────────────────────────────────────────

/// A [`CompletionProvider`] backed by the OpenAI chat completions API.
///
/// The response is read from `choices[0].message.content` and nowhere
/// else; a response without it fails with [`RagError::AnswerService`].
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl OpenAiChat {
    /// Create a new client with the given API key.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::AnswerService`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::AnswerService {
                provider: "OpenAI".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_CHAT_MODEL.into(),
            temperature: None,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        })
    }

    /// Create a new client using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| RagError::Config(
            "OPENAI_API_KEY environment variable not set".to_string(),
        ))?;
        Self::new(api_key)
    }

    /// Set the model name (e.g. `gpt-4.1`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
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
impl CompletionProvider for OpenAiChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(provider = "OpenAI", model = %self.model, prompt_len = prompt.len(), "requesting completion");

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
        };

        let response: ChatResponse = post_json_with_retry(
            &self.client,
            OPENAI_CHAT_URL,
            &self.api_key,
            self.timeout,
            &request,
            self.retry,
            "OpenAI chat",
        )
        .await
        .map_err(|failure| {
            error!(provider = "OpenAI", error = %failure, "completion request failed");
            RagError::AnswerService { provider: "OpenAI".into(), message: failure.to_string() }
        })?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| RagError::AnswerService {
                provider: "OpenAI".into(),
                message: "completion response contained no message content".into(),
            })?;

        Ok(answer.trim().to_string())
    }
}

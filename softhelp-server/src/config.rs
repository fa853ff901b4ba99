//! Environment-driven server configuration.

use std::env;
use std::path::PathBuf;

use softhelp_rag::{RagConfig, RagError};

/// Runtime configuration, read from the environment.
///
/// `OPENAI_API_KEY` is required; everything else has a default:
/// `SOFTHELP_HOST` (0.0.0.0), `SOFTHELP_PORT` (8000),
/// `SOFTHELP_CORPUS_DIR` (knowledge_base), `SOFTHELP_AUDIO_DIR`
/// (generated_audio), `SOFTHELP_CHAT_MODEL`, `SOFTHELP_EMBEDDING_MODEL`,
/// `SOFTHELP_TTS_LANGUAGE` (es), and the chunking/retrieval knobs
/// `SOFTHELP_CHUNK_SIZE`, `SOFTHELP_CHUNK_OVERLAP`, `SOFTHELP_TOP_K`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Knowledge-base directory indexed at startup and on reindex.
    pub corpus_dir: PathBuf,
    /// Directory for synthesized answer audio, served under `/media`.
    pub audio_dir: PathBuf,
    /// API key shared by all hosted-service clients.
    pub openai_api_key: String,
    /// Chat model for answer generation.
    pub chat_model: String,
    /// Embedding model for corpus and questions.
    pub embedding_model: String,
    /// Language of the synthesized answers.
    pub tts_language: String,
    /// Chunking and retrieval parameters.
    pub rag: RagConfig,
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `OPENAI_API_KEY` is missing or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self, RagError> {
        let openai_api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| RagError::Config("OPENAI_API_KEY is not set".to_string()))?;

        let rag = RagConfig::builder()
            .chunk_size(env_usize("SOFTHELP_CHUNK_SIZE", 500)?)
            .chunk_overlap(env_usize("SOFTHELP_CHUNK_OVERLAP", 50)?)
            .top_k(env_usize("SOFTHELP_TOP_K", 4)?)
            .build()?;

        Ok(Self {
            host: env::var("SOFTHELP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_u16("SOFTHELP_PORT", 8000)?,
            corpus_dir: env_path("SOFTHELP_CORPUS_DIR", "knowledge_base"),
            audio_dir: env_path("SOFTHELP_AUDIO_DIR", "generated_audio"),
            chat_model: env::var("SOFTHELP_CHAT_MODEL")
                .unwrap_or_else(|_| "gpt-4.1-mini".to_string()),
            embedding_model: env::var("SOFTHELP_EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            tts_language: env::var("SOFTHELP_TTS_LANGUAGE").unwrap_or_else(|_| "es".to_string()),
            openai_api_key,
            rag,
        })
    }
}

fn env_usize(name: &str, default: usize) -> Result<usize, RagError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| RagError::Config(format!("{name} must be an integer, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}

fn env_u16(name: &str, default: u16) -> Result<u16, RagError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| RagError::Config(format!("{name} must be a port number, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}

fn env_path(name: &str, default: &str) -> PathBuf {
    env::var(name).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

//! Error types for the `softhelp-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while indexing the corpus or answering a question.
#[derive(Debug, Error)]
pub enum RagError {
    /// The configured corpus directory does not exist.
    #[error("Corpus directory not found: {0}")]
    CorpusNotFound(PathBuf),

    /// Scanning the corpus directory produced zero loadable documents.
    #[error("No loadable documents in corpus directory: {0}")]
    EmptyCorpus(PathBuf),

    /// The embedding service call failed.
    #[error("Embedding service error ({provider}): {message}")]
    EmbeddingService {
        /// The embedding backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The chat completion service call failed.
    #[error("Answer service error ({provider}): {message}")]
    AnswerService {
        /// The completion backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

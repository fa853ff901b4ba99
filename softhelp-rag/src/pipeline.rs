//! Pipeline orchestration: corpus indexing and question answering.
//!
//! [`SupportPipeline`] owns the shared index and coordinates
//! load → chunk → embed → swap on reindex and embed → search → compose per
//! question. Index builds happen at startup or on an explicit reindex,
//! never per request; answering only reads a snapshot.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::completion::CompletionProvider;
use crate::composer::AnswerComposer;
use crate::config::RagConfig;
use crate::document::{AnswerResult, Chunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::{SharedIndex, VectorIndex};
use crate::loader::{self, LoadWarning};

/// Summary of a corpus (re)index.
#[derive(Debug, Serialize)]
pub struct CorpusReport {
    /// Documents loaded (PDF pages count individually).
    pub documents: usize,
    /// Chunks embedded and indexed.
    pub chunks: usize,
    /// Files that were skipped, with the reason.
    pub warnings: Vec<LoadWarning>,
}

/// The support-assistant pipeline.
///
/// Construct via [`SupportPipeline::builder()`].
pub struct SupportPipeline {
    config: RagConfig,
    corpus_dir: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
    composer: AnswerComposer,
    index: SharedIndex,
}

impl SupportPipeline {
    /// Create a new [`SupportPipelineBuilder`].
    pub fn builder() -> SupportPipelineBuilder {
        SupportPipelineBuilder::default()
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// The corpus directory this pipeline indexes.
    pub fn corpus_dir(&self) -> &PathBuf {
        &self.corpus_dir
    }

    /// Rebuild the shared index from the corpus directory.
    ///
    /// Loads every supported file, chunks the documents, embeds all chunks
    /// in one batch, and swaps the finished index in; requests holding the
    /// previous snapshot keep it until they finish. Returns counts and the
    /// per-file warnings from the load.
    ///
    /// # Errors
    ///
    /// - [`RagError::CorpusNotFound`] / [`RagError::EmptyCorpus`] from the load.
    /// - [`RagError::EmbeddingService`] if embedding the corpus fails; the
    ///   previous index stays in place.
    pub async fn rebuild_index(&self) -> Result<CorpusReport> {
        let load = loader::load_directory(&self.corpus_dir)?;
        let document_count = load.documents.len();

        let mut chunks: Vec<Chunk> = Vec::new();
        for document in &load.documents {
            chunks.extend(self.chunker.chunk(document));
        }
        if chunks.is_empty() {
            return Err(RagError::EmptyCorpus(self.corpus_dir.clone()));
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during reindex");
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::EmbeddingService {
                provider: "embedding".into(),
                message: format!(
                    "provider returned {} embeddings for {} chunks",
                    embeddings.len(),
                    chunks.len()
                ),
            });
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let index = VectorIndex::build(chunks)?;
        let chunk_count = index.len();
        self.index.swap(index).await;

        info!(
            documents = document_count,
            chunks = chunk_count,
            warnings = load.warnings.len(),
            "corpus index rebuilt"
        );

        Ok(CorpusReport {
            documents: document_count,
            chunks: chunk_count,
            warnings: load.warnings,
        })
    }

    /// Answer a question against the current index.
    ///
    /// `screen_context` is auxiliary text extracted from the user's screen;
    /// pass an empty string when there is none.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyCorpus`] if no index has been built yet.
    /// - [`RagError::EmbeddingService`] / [`RagError::AnswerService`] when a
    ///   hosted service fails; these surface to the caller, no degraded
    ///   answer is fabricated.
    pub async fn answer(&self, question: &str, screen_context: &str) -> Result<AnswerResult> {
        let index = self.index.snapshot().await;
        if index.is_empty() {
            return Err(RagError::EmptyCorpus(self.corpus_dir.clone()));
        }

        let query_embedding = self.embedder.embed(question).await.inspect_err(|e| {
            error!(error = %e, "embedding failed for question");
        })?;
        let results = index.search(&query_embedding, self.config.top_k);
        self.composer.compose(question, screen_context, &results).await
    }
}

/// Builder for constructing a [`SupportPipeline`].
///
/// `corpus_dir`, `embedder`, and `completion` are required; `config`
/// defaults to [`RagConfig::default()`] and the chunker to a
/// [`RecursiveChunker`] derived from it.
#[derive(Default)]
pub struct SupportPipelineBuilder {
    config: Option<RagConfig>,
    corpus_dir: Option<PathBuf>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    completion: Option<Arc<dyn CompletionProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl SupportPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the knowledge-base directory.
    pub fn corpus_dir(mut self, corpus_dir: impl Into<PathBuf>) -> Self {
        self.corpus_dir = Some(corpus_dir.into());
        self
    }

    /// Set the embedding provider.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the completion provider used to generate answers.
    pub fn completion(mut self, completion: Arc<dyn CompletionProvider>) -> Self {
        self.completion = Some(completion);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`SupportPipeline`], validating required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing.
    pub fn build(self) -> Result<SupportPipeline> {
        let config = self.config.unwrap_or_default();
        let corpus_dir = self
            .corpus_dir
            .ok_or_else(|| RagError::Config("corpus_dir is required".to_string()))?;
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::Config("embedder is required".to_string()))?;
        let completion = self
            .completion
            .ok_or_else(|| RagError::Config("completion is required".to_string()))?;
        let chunker = self
            .chunker
            .unwrap_or_else(|| Arc::new(RecursiveChunker::from_config(&config)));

        Ok(SupportPipeline {
            config,
            corpus_dir,
            embedder,
            chunker,
            composer: AnswerComposer::new(completion),
            index: SharedIndex::new(),
        })
    }
}

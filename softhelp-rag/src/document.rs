//! Data types for source documents, chunks, and answers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A document loaded from the knowledge-base directory.
///
/// Plain-text files produce one document each; paginated files produce one
/// per page. The `origin` always names the file the content came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDocument {
    /// Unique identifier: the path relative to the corpus root, plus a
    /// `#page=N` suffix for pages of paginated files.
    pub id: String,
    /// The text content.
    pub content: String,
    /// Path of the originating file.
    pub origin: PathBuf,
}

/// A bounded segment of a [`SourceDocument`] with its vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier, `{document_id}_{chunk_index}`.
    pub id: String,
    /// The text content of the chunk.
    pub content: String,
    /// The vector embedding for this chunk's text. Empty until the
    /// pipeline attaches one.
    pub embedding: Vec<f32>,
    /// Path of the originating file, inherited from the parent document.
    pub origin: PathBuf,
    /// The ID of the parent [`SourceDocument`].
    pub document_id: String,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// The grounded answer to one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerResult {
    /// The assistant's answer text.
    pub answer: String,
    /// Distinct file names of the documents whose chunks were given to the
    /// model as context, in retrieval order.
    pub source_documents: Vec<String>,
}

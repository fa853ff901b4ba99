//! Retrieval-augmented answering core for the SoftHelp support assistant.
//!
//! The crate covers the full path from a directory of knowledge-base files
//! to a grounded answer:
//!
//! - [`loader`] — reads text and PDF files into [`SourceDocument`]s,
//!   skipping unreadable files with explicit warnings
//! - [`chunking`] — splits documents into bounded, overlapping [`Chunk`]s
//! - [`embedding`] / [`openai`] — embeds chunks and queries through a
//!   hosted embedding API
//! - [`index`] — an in-memory cosine-similarity index, rebuilt as a whole
//!   and shared across requests via copy-on-swap
//! - [`composer`] — renders the support prompt, submits it to the chat
//!   completion service, and tracks which source files backed the answer
//! - [`pipeline`] — wires the stages together behind one builder
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use softhelp_rag::{OpenAiChat, OpenAiEmbeddings, SupportPipeline};
//!
//! let pipeline = SupportPipeline::builder()
//!     .corpus_dir("knowledge_base")
//!     .embedder(Arc::new(OpenAiEmbeddings::from_env()?))
//!     .completion(Arc::new(OpenAiChat::from_env()?))
//!     .build()?;
//!
//! pipeline.rebuild_index().await?;
//! let result = pipeline.answer("¿Cómo reinicio mi contraseña?", "").await?;
//! ```

pub mod chunking;
pub mod completion;
pub mod composer;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod loader;
pub mod openai;
pub mod pipeline;
mod retry;

pub use chunking::{Chunker, RecursiveChunker};
pub use completion::CompletionProvider;
pub use composer::{AnswerComposer, FALLBACK_ANSWER};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{AnswerResult, Chunk, SearchResult, SourceDocument};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use index::{SharedIndex, VectorIndex};
pub use loader::{CorpusLoad, LoadWarning, load_directory};
pub use openai::{OpenAiChat, OpenAiEmbeddings};
pub use pipeline::{CorpusReport, SupportPipeline, SupportPipelineBuilder};

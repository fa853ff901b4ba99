//! Document chunking.
//!
//! [`RecursiveChunker`] splits a document along a preference-ordered list
//! of boundaries: paragraph breaks first, then line breaks, then the FAQ
//! question/answer markers, then single spaces, and finally a plain
//! character cut when nothing else fits. Adjacent chunks from the same
//! document share a configurable overlap so context survives a cut.
//!
//! All sizes are measured in characters and every cut lands on a `char`
//! boundary; the corpus is Spanish and accented text must never split a
//! code point.

use std::collections::VecDeque;

use crate::config::RagConfig;
use crate::document::{Chunk, SourceDocument};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with content and provenance but no
/// embeddings; embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks of at most the configured size.
    ///
    /// Returns an empty `Vec` if the document has no text. Chunks never
    /// span two documents.
    fn chunk(&self, document: &SourceDocument) -> Vec<Chunk>;
}

/// Splits text at the coarsest boundary that fits, carrying overlap
/// between adjacent chunks.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a chunker with an explicit separator preference order.
    ///
    /// `chunk_overlap` must be smaller than `chunk_size`; the pipeline
    /// validates this through [`RagConfig`](crate::RagConfig).
    pub fn new(chunk_size: usize, chunk_overlap: usize, separators: Vec<String>) -> Self {
        Self { chunk_size, chunk_overlap, separators }
    }

    /// Create a chunker from pipeline configuration.
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap, config.separators.clone())
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &SourceDocument) -> Vec<Chunk> {
        if document.content.trim().is_empty() {
            return Vec::new();
        }

        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        let segments =
            split_segments(&document.content, self.chunk_size, self.chunk_overlap, &separators);
        let pieces = merge_segments(segments, self.chunk_size, self.chunk_overlap);

        pieces
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk {
                id: format!("{}_{i}", document.id),
                content,
                embedding: Vec::new(),
                origin: document.origin.clone(),
                document_id: document.id.clone(),
            })
            .collect()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment, so that concatenating the parts reproduces the text.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        parts.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        parts.push(&text[start..]);
    }

    parts
}

/// Character-window fallback for text with no usable boundary.
///
/// Windows are `chunk_size` characters long and step by
/// `chunk_size - overlap`, so the overlap is applied here directly.
fn split_by_chars(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut windows = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        windows.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    windows
}

/// Recursively cut `text` into segments no longer than `chunk_size`
/// characters, trying separators coarsest-first and descending to finer
/// ones only for parts that are still too large.
fn split_segments(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if char_len(text) <= chunk_size {
        return vec![text.to_string()];
    }

    let Some((separator, finer)) = separators.split_first() else {
        return split_by_chars(text, chunk_size, overlap);
    };

    let parts = split_keeping_separator(text, separator);
    if parts.len() <= 1 {
        // Separator absent from this part; try the next finer one.
        return split_segments(text, chunk_size, overlap, finer);
    }

    let mut segments = Vec::new();
    for part in parts {
        if char_len(part) <= chunk_size {
            segments.push(part.to_string());
        } else {
            segments.extend(split_segments(part, chunk_size, overlap, finer));
        }
    }
    segments
}

/// Greedily pack segments into chunks of at most `chunk_size` characters.
///
/// When a chunk fills up, the trailing segments totalling at most
/// `overlap` characters are retained as the start of the next chunk, so
/// the overlap snaps to segment boundaries.
fn merge_segments(segments: Vec<String>, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<(String, usize)> = VecDeque::new();
    let mut window_len = 0usize;

    for segment in segments {
        let segment_len = char_len(&segment);

        if window_len > 0 && window_len + segment_len > chunk_size {
            chunks.push(concat_window(&window));
            while window_len > overlap
                || (window_len > 0 && window_len + segment_len > chunk_size)
            {
                match window.pop_front() {
                    Some((_, popped)) => window_len -= popped,
                    None => break,
                }
            }
        }

        window_len += segment_len;
        window.push_back((segment, segment_len));
    }

    if window_len > 0 {
        chunks.push(concat_window(&window));
    }

    chunks
}

fn concat_window(window: &VecDeque<(String, usize)>) -> String {
    window.iter().map(|(segment, _)| segment.as_str()).collect()
}

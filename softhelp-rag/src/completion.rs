//! Completion provider trait for answer generation.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates the answer text for a fully rendered prompt.
///
/// The composer renders the whole support prompt (persona, grounding
/// rules, retrieved context, and the combined user input) into one string;
/// implementations submit it to their backend and return the plain answer
/// text with no further formatting.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate the answer for the given prompt.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

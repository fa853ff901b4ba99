//! Prompt assembly and grounded-answer composition.
//!
//! Renders the support-assistant prompt around the retrieved context and
//! the combined user input, submits it to the completion provider, and
//! collects the distinct source file names that backed the answer.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::completion::CompletionProvider;
use crate::document::{AnswerResult, SearchResult};
use crate::error::Result;

/// The answer the assistant must give when the context does not cover the
/// question.
pub const FALLBACK_ANSWER: &str = "No encuentro esa información en las preguntas frecuentes.";

/// Composes grounded answers from retrieved context.
pub struct AnswerComposer {
    completion: Arc<dyn CompletionProvider>,
}

impl AnswerComposer {
    /// Create a composer that submits prompts to the given provider.
    pub fn new(completion: Arc<dyn CompletionProvider>) -> Self {
        Self { completion }
    }

    /// Render the prompt, submit it, and pair the answer with its sources.
    ///
    /// `screen_context` carries text extracted from the user's screen and
    /// may be empty. The returned source list names each origin file once,
    /// in retrieval order, and never includes a file whose chunks were not
    /// part of the context.
    pub async fn compose(
        &self,
        question: &str,
        screen_context: &str,
        results: &[SearchResult],
    ) -> Result<AnswerResult> {
        let prompt = build_prompt(question, screen_context, results);
        debug!(
            prompt_len = prompt.len(),
            context_chunks = results.len(),
            "submitting support prompt"
        );

        let answer = self.completion.complete(&prompt).await?;
        let source_documents = source_file_names(results);
        info!(answer_len = answer.len(), sources = source_documents.len(), "composed answer");

        Ok(AnswerResult { answer, source_documents })
    }
}

/// Render the fixed support prompt around the context and user input.
fn build_prompt(question: &str, screen_context: &str, results: &[SearchResult]) -> String {
    let context: String = results
        .iter()
        .map(|result| result.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "## Role\n\
         Eres un asistente de soporte de la plataforma SoftHelp.\n\
         \n\
         ## Tasks\n\
         Analizar el input, compuesto por un mensaje del usuario (Message_User) y el texto de un \
         mensaje que le aparece en pantalla (Message_System), y responder preguntas sobre la \
         plataforma.\n\
         \n\
         ## Rules\n\
         - Responde en español de forma clara y breve usando EXCLUSIVAMENTE la información del contexto.\n\
         - Si la respuesta no está en el contexto, responde: \"{FALLBACK_ANSWER}\"\n\
         \n\
         ## CONTEXTO\n\
         {context}\n\
         \n\
         ## PREGUNTA DEL USUARIO\n\
         Message_User: {question}\n\
         Message_System: {screen_context}\n\
         \n\
         ## OUTPUT FORMAT\n\
         Responde solo con el texto de la respuesta, sin comillas ni formato adicional, en texto plano.\n"
    )
}

/// Distinct origin file names of the context chunks, in retrieval order.
fn source_file_names(results: &[SearchResult]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for result in results {
        let origin = &result.chunk.origin;
        let name = origin
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| origin.to_string_lossy().into_owned());
        if seen.insert(name.clone()) {
            names.push(name);
        }
    }
    names
}

//! End-to-end pipeline tests with deterministic mock backends.
//!
//! The embedder hashes text into a normalized vector and the completion
//! mock applies the grounding rules literally: it answers with the context
//! line that shares a keyword with the question, or with the fixed
//! fallback sentence. Together they make the full pipeline reproducible
//! without network access.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use softhelp_rag::{
    CompletionProvider, EmbeddingProvider, FALLBACK_ANSWER, RagConfig, RagError, SupportPipeline,
};

struct HashEmbedder {
    dimensions: usize,
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> softhelp_rag::Result<Vec<f32>> {
        // Deterministic embedding: hash the text bytes, then generate a
        // normalized vector whose direction depends on the content.
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut embedding = vec![0.0f32; self.dimensions];
        for (i, value) in embedding.iter_mut().enumerate() {
            *value = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Answers with the first context line sharing a keyword with the
/// question, or the fallback sentence — the grounding rules, applied
/// deterministically.
struct KeywordCompletion;

fn section<'a>(prompt: &'a str, start: &str, end: &str) -> &'a str {
    let from = prompt.find(start).map(|i| i + start.len()).unwrap_or(0);
    let to = prompt[from..].find(end).map(|i| from + i).unwrap_or(prompt.len());
    &prompt[from..to]
}

#[async_trait]
impl CompletionProvider for KeywordCompletion {
    async fn complete(&self, prompt: &str) -> softhelp_rag::Result<String> {
        let context = section(prompt, "## CONTEXTO\n", "\n\n## PREGUNTA");
        let question = section(prompt, "Message_User: ", "\n");
        let screen = section(prompt, "Message_System: ", "\n");

        let keywords: Vec<String> = question
            .split_whitespace()
            .chain(screen.split_whitespace())
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| w.chars().count() > 4)
            .collect();

        for line in context.lines() {
            let lower = line.to_lowercase();
            if keywords.iter().any(|k| !k.is_empty() && lower.contains(k.as_str())) {
                return Ok(line.trim().to_string());
            }
        }
        Ok(FALLBACK_ANSWER.to_string())
    }
}

fn pipeline_for(corpus_dir: &Path) -> SupportPipeline {
    SupportPipeline::builder()
        .corpus_dir(corpus_dir)
        .embedder(Arc::new(HashEmbedder { dimensions: 64 }))
        .completion(Arc::new(KeywordCompletion))
        .build()
        .unwrap()
}

const FAQ: &str = "P: ¿Cómo reinicio mi contraseña? R: Ve a Configuración > Seguridad.";

#[tokio::test]
async fn answers_a_password_question_from_the_faq() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("faq.txt"), FAQ).unwrap();

    let pipeline = pipeline_for(temp.path());
    pipeline.rebuild_index().await.unwrap();

    let result = pipeline.answer("¿Cómo cambio mi contraseña?", "").await.unwrap();
    assert!(
        result.answer.contains("Configuración > Seguridad"),
        "answer did not reference the reset procedure: {}",
        result.answer
    );
    assert_eq!(result.source_documents, vec!["faq.txt"]);
}

#[tokio::test]
async fn falls_back_when_the_context_is_unrelated() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("horarios.txt"), "El horario de la cafetería es de 9 a 17.")
        .unwrap();

    let pipeline = pipeline_for(temp.path());
    pipeline.rebuild_index().await.unwrap();

    let result = pipeline.answer("¿Cómo actualizo mi método de facturación?", "").await.unwrap();
    assert_eq!(result.answer, FALLBACK_ANSWER);
}

#[tokio::test]
async fn answering_twice_is_idempotent() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("faq.txt"), FAQ).unwrap();

    let pipeline = pipeline_for(temp.path());
    pipeline.rebuild_index().await.unwrap();

    let first = pipeline.answer("¿Cómo cambio mi contraseña?", "").await.unwrap();
    let second = pipeline.answer("¿Cómo cambio mi contraseña?", "").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn sources_come_only_from_indexed_files() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("faq.txt"), FAQ).unwrap();
    fs::write(
        temp.path().join("manual.md"),
        "Para crear un usuario nuevo, entra en Administración > Usuarios.",
    )
    .unwrap();

    let pipeline = SupportPipeline::builder()
        .config(RagConfig::builder().top_k(10).build().unwrap())
        .corpus_dir(temp.path())
        .embedder(Arc::new(HashEmbedder { dimensions: 64 }))
        .completion(Arc::new(KeywordCompletion))
        .build()
        .unwrap();
    pipeline.rebuild_index().await.unwrap();

    let result = pipeline.answer("¿Cómo creo un usuario nuevo?", "").await.unwrap();
    assert!(!result.source_documents.is_empty());
    for source in &result.source_documents {
        assert!(
            source == "faq.txt" || source == "manual.md",
            "unexpected source: {source}"
        );
    }
}

#[tokio::test]
async fn answering_without_an_index_reports_an_empty_corpus() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("faq.txt"), FAQ).unwrap();

    let pipeline = pipeline_for(temp.path());
    let result = pipeline.answer("¿Cómo cambio mi contraseña?", "").await;
    assert!(matches!(result, Err(RagError::EmptyCorpus(_))));
}

#[tokio::test]
async fn reindex_reports_skipped_files() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("faq.txt"), FAQ).unwrap();
    fs::write(temp.path().join("roto.pdf"), b"esto no es un pdf").unwrap();

    let pipeline = pipeline_for(temp.path());
    let report = pipeline.rebuild_index().await.unwrap();

    assert_eq!(report.documents, 1);
    assert!(report.chunks >= 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].path, temp.path().join("roto.pdf"));
}

#[tokio::test]
async fn reindex_of_a_missing_directory_fails() {
    let temp = tempfile::tempdir().unwrap();
    let pipeline = pipeline_for(&temp.path().join("no-existe"));
    let result = pipeline.rebuild_index().await;
    assert!(matches!(result, Err(RagError::CorpusNotFound(_))));
}

#[tokio::test]
async fn screen_context_reaches_the_prompt() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("errores.txt"),
        "P: ¿Qué significa el error 403? R: No tienes permisos para esa operación.",
    )
    .unwrap();

    let pipeline = pipeline_for(temp.path());
    pipeline.rebuild_index().await.unwrap();

    // The question alone has no keyword that appears in the corpus; only
    // the on-screen error text can ground the answer.
    let result = pipeline.answer("¿Me ayudas?", "Error 403: Forbidden").await.unwrap();
    assert!(result.answer.contains("permisos"));
}

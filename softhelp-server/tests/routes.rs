//! Handler tests against the router with mock backends.
//!
//! The pipeline runs for real over a temporary corpus; only the hosted
//! services (embeddings, completion, speech, vision) are mocked.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use softhelp_media::{ImageTextExtractor, SpeechSynthesizer, SpeechToText};
use softhelp_rag::{CompletionProvider, EmbeddingProvider, SupportPipeline};
use softhelp_server::{AppState, app_router};

const ANSWER: &str = "Ve a Configuración > Seguridad.";

struct HashEmbedder {
    dimensions: usize,
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> softhelp_rag::Result<Vec<f32>> {
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut embedding = vec![0.0f32; self.dimensions];
        for (i, value) in embedding.iter_mut().enumerate() {
            *value = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

struct FixedCompletion;

#[async_trait]
impl CompletionProvider for FixedCompletion {
    async fn complete(&self, _prompt: &str) -> softhelp_rag::Result<String> {
        Ok(ANSWER.to_string())
    }
}

struct MockTranscriber;

#[async_trait]
impl SpeechToText for MockTranscriber {
    async fn transcribe(&self, _audio: Vec<u8>, _file_name: &str) -> softhelp_media::Result<String> {
        Ok("¿Cómo reinicio mi contraseña?".to_string())
    }
}

struct MockScreenReader;

#[async_trait]
impl ImageTextExtractor for MockScreenReader {
    async fn extract_text(
        &self,
        _image: Vec<u8>,
        _mime_type: &str,
    ) -> softhelp_media::Result<String> {
        Ok("Error 403: Forbidden".to_string())
    }
}

struct FixedSynthesizer;

#[async_trait]
impl SpeechSynthesizer for FixedSynthesizer {
    async fn synthesize(&self, _text: &str, _language: &str) -> softhelp_media::Result<PathBuf> {
        Ok(PathBuf::from("media/respuesta.mp3"))
    }
}

async fn test_state() -> (AppState, tempfile::TempDir) {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("faq.txt"),
        "P: ¿Cómo reinicio mi contraseña? R: Ve a Configuración > Seguridad.",
    )
    .unwrap();

    let pipeline = Arc::new(
        SupportPipeline::builder()
            .corpus_dir(temp.path())
            .embedder(Arc::new(HashEmbedder { dimensions: 32 }))
            .completion(Arc::new(FixedCompletion))
            .build()
            .unwrap(),
    );
    pipeline.rebuild_index().await.unwrap();

    let state = AppState {
        pipeline,
        transcriber: Arc::new(MockTranscriber),
        screen_reader: Arc::new(MockScreenReader),
        synthesizer: Arc::new(FixedSynthesizer),
        audio_dir: temp.path().join("media"),
        tts_language: "es".to_string(),
    };
    (state, temp)
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_body(boundary: &str, file_name: &str, content_type: &str, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (state, _corpus) = test_state().await;
    let response = app_router(state)
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn text_questions_return_answer_sources_and_audio() {
    let (state, _corpus) = test_state().await;
    let request = Request::builder()
        .method("POST")
        .uri("/text")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("content=Como+reinicio+mi+contrasena"))
        .unwrap();

    let response = app_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["question"], "Como reinicio mi contrasena");
    assert_eq!(json["answer"], ANSWER);
    assert_eq!(json["source_documents"], serde_json::json!(["faq.txt"]));
    assert_eq!(json["audio_url"], "/media/respuesta.mp3");
}

#[tokio::test]
async fn empty_text_questions_are_rejected() {
    let (state, _corpus) = test_state().await;
    let request = Request::builder()
        .method("POST")
        .uri("/text")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("content="))
        .unwrap();

    let response = app_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "Empty content");
}

#[tokio::test]
async fn audio_uploads_are_transcribed_and_answered() {
    let (state, _corpus) = test_state().await;
    let boundary = "softhelp-test-boundary";
    let body = multipart_body(boundary, "pregunta.mp3", "audio/mpeg", b"not really mp3");
    let request = Request::builder()
        .method("POST")
        .uri("/audio")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();

    let response = app_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["question"], "¿Cómo reinicio mi contraseña?");
    assert_eq!(json["answer"], ANSWER);
}

#[tokio::test]
async fn non_mp3_audio_uploads_are_rejected() {
    let (state, _corpus) = test_state().await;
    let boundary = "softhelp-test-boundary";
    let body = multipart_body(boundary, "nota.txt", "text/plain", b"hola");
    let request = Request::builder()
        .method("POST")
        .uri("/audio")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();

    let response = app_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "File is not MP3 audio");
}

#[tokio::test]
async fn image_uploads_use_the_extracted_screen_text() {
    let (state, _corpus) = test_state().await;
    let boundary = "softhelp-test-boundary";
    let body = multipart_body(boundary, "captura.png", "image/png", &[137, 80, 78, 71]);
    let request = Request::builder()
        .method("POST")
        .uri("/image")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();

    let response = app_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["answer"], ANSWER);
    assert_eq!(json["source_documents"], serde_json::json!(["faq.txt"]));
}

#[tokio::test]
async fn non_image_uploads_are_rejected() {
    let (state, _corpus) = test_state().await;
    let boundary = "softhelp-test-boundary";
    let body = multipart_body(boundary, "nota.txt", "text/plain", b"hola");
    let request = Request::builder()
        .method("POST")
        .uri("/image")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();

    let response = app_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "File is not an image");
}

#[tokio::test]
async fn reindex_reports_the_corpus() {
    let (state, _corpus) = test_state().await;
    let request =
        Request::builder().method("POST").uri("/reindex").body(Body::empty()).unwrap();

    let response = app_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["documents"], 1);
    assert!(json["chunks"].as_u64().unwrap() >= 1);
    assert_eq!(json["warnings"], serde_json::json!([]));
}

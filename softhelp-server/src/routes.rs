//! HTTP routes and request handlers.
//!
//! Every question endpoint — form text, mp3 upload, screenshot upload —
//! funnels into [`respond`], which runs the answering pipeline and
//! synthesizes the spoken answer. Transcription and screen-reading
//! failures degrade to an error-tagged string inside the question context
//! rather than failing the request; only the answering pipeline itself is
//! allowed to fail it.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use softhelp_rag::{AnswerResult, CorpusReport};

use crate::error::ApiError;
use crate::state::AppState;

/// Maximum accepted upload size for audio and screenshots.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Question assumed when a screenshot arrives without one.
const DEFAULT_IMAGE_QUESTION: &str = "¿Qué significa este mensaje y cómo lo soluciono?";

/// Build the application router.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/healthz", get(health))
        .route("/text", post(ask_text))
        .route("/audio", post(ask_audio))
        .route("/image", post(ask_image))
        .route("/reindex", post(reindex))
        .nest_service("/media", ServeDir::new(state.audio_dir.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    Json(json!({ "service": "softhelp", "message": "Asistente de soporte SoftHelp" }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct TextQuestion {
    content: String,
}

/// Response shape shared by every question endpoint.
#[derive(Debug, Serialize)]
struct AskResponse {
    question: String,
    answer: String,
    source_documents: Vec<String>,
    /// Path of the synthesized answer under `/media`, or null when
    /// synthesis failed.
    audio_url: Option<String>,
}

async fn ask_text(
    State(state): State<AppState>,
    Form(form): Form<TextQuestion>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = form.content.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::bad_request("Empty content"));
    }
    respond(&state, question, String::new()).await
}

async fn ask_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AskResponse>, ApiError> {
    let mut upload: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Malformed multipart body"))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("").to_string();
        let content_type = field.content_type().unwrap_or("").to_string();
        let is_mp3 = matches!(content_type.as_str(), "audio/mpeg" | "audio/mp3")
            || file_name.to_lowercase().ends_with(".mp3");
        if !is_mp3 {
            return Err(ApiError::bad_request("File is not MP3 audio"));
        }
        let data = field
            .bytes()
            .await
            .map_err(|_| ApiError::bad_request("Could not read uploaded file"))?;
        upload = Some((data.to_vec(), file_name));
    }

    let (audio, file_name) = upload.ok_or_else(|| ApiError::bad_request("Missing file field"))?;
    let file_name = if file_name.is_empty() { "audio.mp3".to_string() } else { file_name };

    let question = match state.transcriber.transcribe(audio, &file_name).await {
        Ok(text) => text,
        Err(error) => {
            warn!(%error, "transcription failed; tagging the question");
            format!("[error de transcripción: {error}]")
        }
    };

    respond(&state, question, String::new()).await
}

async fn ask_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AskResponse>, ApiError> {
    let mut image: Option<(Vec<u8>, String)> = None;
    let mut question = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Malformed multipart body"))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                let content_type = field.content_type().unwrap_or("").to_string();
                if !content_type.starts_with("image/") {
                    return Err(ApiError::bad_request("File is not an image"));
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::bad_request("Could not read uploaded file"))?;
                image = Some((data.to_vec(), content_type));
            }
            "question" => {
                question = field
                    .text()
                    .await
                    .map_err(|_| ApiError::bad_request("Could not read question field"))?;
            }
            _ => {}
        }
    }

    let (data, mime_type) = image.ok_or_else(|| ApiError::bad_request("Missing file field"))?;

    let screen_context = match state.screen_reader.extract_text(data, &mime_type).await {
        Ok(text) => text,
        Err(error) => {
            warn!(%error, "screen reading failed; tagging the context");
            format!("[error de lectura de pantalla: {error}]")
        }
    };

    let question = if question.trim().is_empty() {
        DEFAULT_IMAGE_QUESTION.to_string()
    } else {
        question.trim().to_string()
    };

    respond(&state, question, screen_context).await
}

async fn reindex(State(state): State<AppState>) -> Result<Json<CorpusReport>, ApiError> {
    let report = state.pipeline.rebuild_index().await?;
    info!(documents = report.documents, chunks = report.chunks, "reindex complete");
    Ok(Json(report))
}

/// Run the pipeline and synthesize the spoken answer.
///
/// Synthesis failure degrades to `audio_url: null`; the text answer is
/// still worth returning.
async fn respond(
    state: &AppState,
    question: String,
    screen_context: String,
) -> Result<Json<AskResponse>, ApiError> {
    let AnswerResult { answer, source_documents } =
        state.pipeline.answer(&question, &screen_context).await?;

    let audio_url = match state.synthesizer.synthesize(&answer, &state.tts_language).await {
        Ok(path) => path.file_name().map(|name| format!("/media/{}", name.to_string_lossy())),
        Err(error) => {
            warn!(%error, "speech synthesis failed; returning a text-only answer");
            None
        }
    };

    Ok(Json(AskResponse { question, answer, source_documents, audio_url }))
}

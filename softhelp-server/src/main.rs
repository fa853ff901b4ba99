//! SoftHelp support-assistant service binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use softhelp_media::{OpenAiScreenReader, OpenAiSpeech, OpenAiTranscriber};
use softhelp_rag::{OpenAiChat, OpenAiEmbeddings, SupportPipeline};
use softhelp_server::{AppState, ServerConfig, app_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let embedder = OpenAiEmbeddings::new(config.openai_api_key.clone())?
        .with_model(config.embedding_model.clone());
    let completion =
        OpenAiChat::new(config.openai_api_key.clone())?.with_model(config.chat_model.clone());

    let pipeline = Arc::new(
        SupportPipeline::builder()
            .config(config.rag.clone())
            .corpus_dir(config.corpus_dir.clone())
            .embedder(Arc::new(embedder))
            .completion(Arc::new(completion))
            .build()?,
    );

    let report = pipeline.rebuild_index().await.context("initial corpus index build failed")?;
    info!(
        documents = report.documents,
        chunks = report.chunks,
        warnings = report.warnings.len(),
        corpus = %config.corpus_dir.display(),
        "corpus indexed"
    );

    let transcriber = OpenAiTranscriber::new(config.openai_api_key.clone())?
        .with_language(config.tts_language.clone());
    let state = AppState {
        pipeline,
        transcriber: Arc::new(transcriber),
        screen_reader: Arc::new(OpenAiScreenReader::new(config.openai_api_key.clone())?),
        synthesizer: Arc::new(OpenAiSpeech::new(
            config.openai_api_key.clone(),
            config.audio_dir.clone(),
        )?),
        audio_dir: config.audio_dir.clone(),
        tts_language: config.tts_language.clone(),
    };

    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid host/port: {}:{}", config.host, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("softhelp listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

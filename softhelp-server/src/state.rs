//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use softhelp_media::{ImageTextExtractor, SpeechSynthesizer, SpeechToText};
use softhelp_rag::SupportPipeline;

/// State shared across request handlers.
///
/// Every hosted-service client is constructed once at startup and injected
/// here as a trait object; handlers never reach for process globals, and
/// tests swap in mocks.
#[derive(Clone)]
pub struct AppState {
    /// The answering pipeline with its shared index.
    pub pipeline: Arc<SupportPipeline>,
    /// Speech-to-text for uploaded audio questions.
    pub transcriber: Arc<dyn SpeechToText>,
    /// Screen-text extraction for uploaded screenshots.
    pub screen_reader: Arc<dyn ImageTextExtractor>,
    /// Speech synthesis for spoken answers.
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    /// Directory of synthesized audio, served under `/media`.
    pub audio_dir: PathBuf,
    /// Language of the synthesized answers.
    pub tts_language: String,
}

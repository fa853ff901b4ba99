//! Speech and screenshot service clients for the SoftHelp support
//! assistant.
//!
//! Three narrow trait seams cover everything the HTTP layer needs beyond
//! text questions:
//!
//! - [`SpeechToText`] — transcribe an uploaded mp3 into the question
//! - [`ImageTextExtractor`] — read the visible text out of a screenshot
//! - [`SpeechSynthesizer`] — speak the answer into an mp3 on disk
//!
//! The bundled implementations call the OpenAI HTTP APIs through
//! `reqwest`; handlers inject them as trait objects so tests can swap in
//! mocks.

pub mod error;
pub mod speech;
pub mod transcribe;
pub mod vision;

pub use error::{MediaError, Result};
pub use speech::{OpenAiSpeech, SpeechSynthesizer};
pub use transcribe::{OpenAiTranscriber, SpeechToText};
pub use vision::{ImageTextExtractor, OpenAiScreenReader};

//! Error types for the `softhelp-media` crate.

use thiserror::Error;

/// Errors from the speech and screenshot service clients.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The transcription service call failed.
    #[error("Transcription error ({provider}): {message}")]
    Transcription {
        /// The backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The screenshot text-extraction call failed.
    #[error("Screen reading error ({provider}): {message}")]
    Vision {
        /// The backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The speech synthesis call failed.
    #[error("Speech synthesis error ({provider}): {message}")]
    Synthesis {
        /// The backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Writing the synthesized audio file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A convenience result type for media operations.
pub type Result<T> = std::result::Result<T, MediaError>;

/// Extract the human-readable message from an OpenAI error body, falling
/// back to the raw body.
pub(crate) fn api_error_detail(body: String) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorResponse {
        error: ErrorDetail,
    }

    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

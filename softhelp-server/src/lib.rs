//! HTTP layer for the SoftHelp support assistant.
//!
//! Questions arrive as form text, an mp3 recording, or a screenshot; every
//! endpoint funnels into the same answering pipeline and responds with the
//! answer text, its source documents, and a link to the synthesized audio.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::app_router;
pub use state::AppState;

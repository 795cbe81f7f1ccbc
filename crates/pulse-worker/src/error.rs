//! Worker error types.

use thiserror::Error;

use pulse_media::RenderError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Source could not be opened: {0}")]
    DecodeFailed(String),

    #[error("Render failed: {0}")]
    RenderFailed(#[from] RenderError),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("AI analysis failed: {0}")]
    AiFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Media error: {0}")]
    Media(#[from] pulse_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn decode_failed(msg: impl Into<String>) -> Self {
        Self::DecodeFailed(msg.into())
    }

    pub fn transcription_failed(msg: impl Into<String>) -> Self {
        Self::TranscriptionFailed(msg.into())
    }

    pub fn ai_failed(msg: impl Into<String>) -> Self {
        Self::AiFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the error ends the whole run rather than a single clip.
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(self, WorkerError::DecodeFailed(_) | WorkerError::ConfigError(_))
    }
}

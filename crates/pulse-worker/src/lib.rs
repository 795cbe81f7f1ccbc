//! Clip selection and rendering worker.
//!
//! This crate provides:
//! - Environment-driven pipeline configuration
//! - Transcription (whisper CLI) and AI clip selection (Gemini)
//! - The segment selector (validation, clamping, clip-relative cues)
//! - The clip pipeline orchestrator and its run report
//! - Structured run logging

pub mod config;
pub mod error;
pub mod gemini;
pub mod logging;
pub mod pipeline;
pub mod selector;
pub mod transcript;

pub use config::{FailurePolicy, PipelineConfig};
pub use error::{WorkerError, WorkerResult};
pub use gemini::{select_or_placeholder, ClipSelector, GeminiClient};
pub use logging::{init_tracing, RunLogger};
pub use pipeline::{ClipOutcome, ClipPipeline};
pub use selector::{build_cues, select_clip, select_window, SelectedClip, SkipReason};
pub use transcript::{load_transcript_file, Transcriber, TranscriptionMode, WhisperCli};

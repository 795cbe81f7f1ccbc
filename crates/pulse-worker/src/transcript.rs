//! Speech transcription.
//!
//! The pipeline only needs timestamped segments; where they come from is
//! behind [`Transcriber`]. [`WhisperCli`] runs the `whisper` command line tool
//! and reads its JSON output.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pulse_models::TranscriptSegment;

use crate::error::{WorkerError, WorkerResult};

/// Whether speech is kept in its language or translated to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionMode {
    Transcribe,
    #[default]
    Translate,
}

impl TranscriptionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptionMode::Transcribe => "transcribe",
            TranscriptionMode::Translate => "translate",
        }
    }
}

impl fmt::Display for TranscriptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TranscriptionMode {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "transcribe" | "original" => Ok(TranscriptionMode::Transcribe),
            "translate" | "english" => Ok(TranscriptionMode::Translate),
            other => Err(WorkerError::config_error(format!(
                "Unknown transcription mode: {}",
                other
            ))),
        }
    }
}

/// Produces timestamped speech segments for a video.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        source: &Path,
        mode: TranscriptionMode,
    ) -> WorkerResult<Vec<TranscriptSegment>>;
}

/// Whisper JSON output; only the segments matter here.
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<TranscriptSegment>,
}

/// [`Transcriber`] backed by the `whisper` CLI.
#[derive(Debug, Clone)]
pub struct WhisperCli {
    model: String,
    binary: PathBuf,
}

impl WhisperCli {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            binary: PathBuf::from("whisper"),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    fn build_args(&self, source: &Path, mode: TranscriptionMode, output_dir: &Path) -> Vec<String> {
        vec![
            source.to_string_lossy().to_string(),
            "--task".to_string(),
            mode.as_str().to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--output_format".to_string(),
            "json".to_string(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().to_string(),
            "--verbose".to_string(),
            "False".to_string(),
        ]
    }
}

#[async_trait]
impl Transcriber for WhisperCli {
    async fn transcribe(
        &self,
        source: &Path,
        mode: TranscriptionMode,
    ) -> WorkerResult<Vec<TranscriptSegment>> {
        let workdir = tempfile::tempdir()?;
        let args = self.build_args(source, mode, workdir.path());

        info!(
            source = %source.display(),
            model = %self.model,
            task = %mode,
            "Transcribing with whisper"
        );

        let output = tokio::process::Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| WorkerError::transcription_failed(format!("Failed to run whisper: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WorkerError::transcription_failed(format!(
                "whisper exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| WorkerError::transcription_failed("Source path has no file name"))?;
        let json_path = workdir.path().join(format!("{}.json", stem));

        let raw = tokio::fs::read(&json_path).await.map_err(|e| {
            WorkerError::transcription_failed(format!(
                "whisper output {} unreadable: {}",
                json_path.display(),
                e
            ))
        })?;

        let segments = parse_whisper_json(&raw)?;
        info!(segments = segments.len(), "Transcription finished");
        Ok(segments)
    }
}

/// Parse whisper's JSON output into ordered segments.
pub fn parse_whisper_json(raw: &[u8]) -> WorkerResult<Vec<TranscriptSegment>> {
    let parsed: WhisperOutput = serde_json::from_slice(raw)?;
    let mut segments = parsed.segments;
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    if segments.is_empty() {
        warn!("Transcript has no segments");
    }
    Ok(segments)
}

/// Load segments from a JSON file: either whisper output or a bare array.
pub async fn load_transcript_file(path: &Path) -> WorkerResult<Vec<TranscriptSegment>> {
    let raw = tokio::fs::read(path).await?;
    match serde_json::from_slice::<Vec<TranscriptSegment>>(&raw) {
        Ok(segments) => Ok(segments),
        Err(_) => parse_whisper_json(&raw),
    }
}

//! Pipeline configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use pulse_models::{CropMode, EncodingConfig};

use crate::error::{WorkerError, WorkerResult};
use crate::transcript::TranscriptionMode;

/// What happens to the remaining clips when one fails to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and continue with the next clip
    #[default]
    Isolate,
    /// Stop at the first failure, keeping clips already rendered
    AbortRemaining,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Isolate => "isolate",
            FailurePolicy::AbortRemaining => "abort_remaining",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "isolate" | "continue" => Ok(FailurePolicy::Isolate),
            "abort" | "abort_remaining" => Ok(FailurePolicy::AbortRemaining),
            other => Err(WorkerError::config_error(format!(
                "Unknown failure policy: {}",
                other
            ))),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Longest allowed clip in seconds
    pub max_clip_duration: u32,
    /// Burn subtitles into the clips
    pub use_subtitles: bool,
    pub crop_mode: CropMode,
    /// Where clips are written; created if missing
    pub output_dir: PathBuf,
    pub failure_policy: FailurePolicy,
    /// Font file for subtitles (compositor default when unset)
    pub subtitle_font: Option<PathBuf>,
    /// YuNet model (default locations when unset)
    pub yunet_model: Option<PathBuf>,
    /// Per-encode timeout; encodes may run indefinitely when unset
    pub encode_timeout_secs: Option<u64>,
    pub encoding: EncodingConfig,
    pub transcription_mode: TranscriptionMode,
    pub whisper_model: String,
    pub gemini_api_key: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_clip_duration: 15,
            use_subtitles: true,
            crop_mode: CropMode::Letterbox,
            output_dir: PathBuf::from("generated_clips"),
            failure_policy: FailurePolicy::Isolate,
            subtitle_font: None,
            yunet_model: None,
            encode_timeout_secs: None,
            encoding: EncodingConfig::default(),
            transcription_mode: TranscriptionMode::Translate,
            whisper_model: "base".to_string(),
            gemini_api_key: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup. Unparseable values keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            max_clip_duration: get("PULSE_MAX_CLIP_DURATION")
                .and_then(|s| parse_or_warn("PULSE_MAX_CLIP_DURATION", &s))
                .unwrap_or(defaults.max_clip_duration),
            use_subtitles: get("PULSE_USE_SUBTITLES")
                .and_then(|s| parse_bool("PULSE_USE_SUBTITLES", &s))
                .unwrap_or(defaults.use_subtitles),
            crop_mode: get("PULSE_CROP_MODE")
                .and_then(|s| parse_or_warn("PULSE_CROP_MODE", &s))
                .unwrap_or(defaults.crop_mode),
            output_dir: get("PULSE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            failure_policy: get("PULSE_FAILURE_POLICY")
                .and_then(|s| parse_or_warn("PULSE_FAILURE_POLICY", &s))
                .unwrap_or(defaults.failure_policy),
            subtitle_font: get("PULSE_SUBTITLE_FONT").map(PathBuf::from),
            yunet_model: get("PULSE_YUNET_MODEL").map(PathBuf::from),
            encode_timeout_secs: get("PULSE_ENCODE_TIMEOUT_SECS")
                .and_then(|s| parse_or_warn("PULSE_ENCODE_TIMEOUT_SECS", &s)),
            encoding: {
                let mut encoding = defaults.encoding;
                if let Some(crf) = get("PULSE_ENCODE_CRF").and_then(|s| parse_or_warn("PULSE_ENCODE_CRF", &s)) {
                    encoding = encoding.with_crf(crf);
                }
                if let Some(preset) = get("PULSE_ENCODE_PRESET") {
                    encoding = encoding.with_preset(preset);
                }
                encoding
            },
            transcription_mode: get("PULSE_TRANSCRIBE_MODE")
                .and_then(|s| parse_or_warn("PULSE_TRANSCRIBE_MODE", &s))
                .unwrap_or(defaults.transcription_mode),
            whisper_model: get("PULSE_WHISPER_MODEL").unwrap_or(defaults.whisper_model),
            gemini_api_key: get("GEMINI_API_KEY"),
        }
    }

    pub fn with_max_clip_duration(mut self, secs: u32) -> Self {
        self.max_clip_duration = secs;
        self
    }

    pub fn with_subtitles(mut self, enabled: bool) -> Self {
        self.use_subtitles = enabled;
        self
    }

    pub fn with_crop_mode(mut self, mode: CropMode) -> Self {
        self.crop_mode = mode;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Maximum clip duration as seconds.
    pub fn max_duration_secs(&self) -> f64 {
        self.max_clip_duration as f64
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.max_clip_duration == 0 {
            return Err(WorkerError::config_error(
                "max_clip_duration must be at least 1 second",
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(WorkerError::config_error("output directory must not be empty"));
        }
        Ok(())
    }
}

fn parse_or_warn<T: FromStr>(key: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value, "Ignoring invalid config value");
            None
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!(key, value, "Ignoring invalid boolean config value");
            None
        }
    }
}

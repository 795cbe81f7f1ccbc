//! Crop mode and output canvas definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Output canvas width (portrait 9:16).
pub const OUTPUT_WIDTH: u32 = 1080;
/// Output canvas height (portrait 9:16).
pub const OUTPUT_HEIGHT: u32 = 1920;

/// How a source frame is reframed into the portrait canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CropMode {
    /// Fit the whole frame, pad the rest
    #[default]
    Letterbox,
    /// Crop a 9:16 window around the dominant face (landscape sources only)
    FaceTracking,
}

impl CropMode {
    pub const ALL: &'static [CropMode] = &[CropMode::Letterbox, CropMode::FaceTracking];

    pub fn as_str(&self) -> &'static str {
        match self {
            CropMode::Letterbox => "letterbox",
            CropMode::FaceTracking => "face_tracking",
        }
    }
}

impl fmt::Display for CropMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CropMode {
    type Err = CropModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect();

        match normalized.as_str() {
            "letterbox" | "fit" => Ok(CropMode::Letterbox),
            "facetracking" | "face" | "zoom" => Ok(CropMode::FaceTracking),
            _ => Err(CropModeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown crop mode: {0}")]
pub struct CropModeParseError(String);

//! Geometry engine: how a source frame maps onto the 1080x1920 canvas.
//!
//! Everything here is pure. Face detection results come in as plain numbers
//! and the fallback policy (per-sample center, whole-clip center crop) is left
//! to the caller.

pub mod bbox;
pub mod crop;
pub mod letterbox;
pub mod tracking;

use serde::{Deserialize, Serialize};

use pulse_models::{CropMode, OUTPUT_HEIGHT, OUTPUT_WIDTH};

use crate::error::MediaResult;

pub use bbox::BoundingBox;
pub use crop::{center_crop, face_tracked_crop, CropWindow, PORTRAIT_ASPECT};
pub use letterbox::{compute_letterbox, LetterboxPlacement, LETTERBOX_FILL};
pub use tracking::{average_center, face_center, sample_timestamps, FALLBACK_CENTER};

/// Per-clip frame transform, computed once and applied to every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameTransform {
    /// Full-height crop window, then scaled to the canvas.
    Crop {
        window: CropWindow,
        source_width: u32,
        source_height: u32,
        /// Normalized center the window was built from
        center: f64,
    },
    /// Whole frame scaled and padded onto the canvas.
    Letterbox(LetterboxPlacement),
}

impl FrameTransform {
    /// Letterbox transform for a `width x height` source.
    pub fn letterbox(width: u32, height: u32) -> MediaResult<Self> {
        Ok(Self::Letterbox(compute_letterbox(width, height)?))
    }

    /// Crop transform centered on `center` (0..1 across the width).
    pub fn face_crop(width: u32, height: u32, center: f64) -> MediaResult<Self> {
        let window = face_tracked_crop(width, height, center)?;
        Ok(Self::Crop {
            window,
            source_width: width,
            source_height: height,
            center,
        })
    }

    /// Whether a face-tracked crop applies to this source at all.
    ///
    /// Only landscape sources are cropped; everything else is letterboxed.
    pub fn wants_face_crop(mode: CropMode, width: u32, height: u32) -> bool {
        mode == CropMode::FaceTracking && width > height
    }

    /// Output dimensions. Always the portrait canvas.
    pub fn output_size(&self) -> (u32, u32) {
        match self {
            Self::Crop { .. } => (OUTPUT_WIDTH, OUTPUT_HEIGHT),
            Self::Letterbox(p) => (p.canvas_width, p.canvas_height),
        }
    }

    pub fn is_crop(&self) -> bool {
        matches!(self, Self::Crop { .. })
    }

    /// FFmpeg filter chain realizing this transform.
    pub fn to_filter(&self) -> String {
        match self {
            Self::Crop {
                window,
                source_width,
                source_height,
                ..
            } => window.to_filter(*source_width, *source_height),
            Self::Letterbox(placement) => placement.to_filter(),
        }
    }
}

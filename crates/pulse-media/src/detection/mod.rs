//! Face detection seam and the per-clip sampler built on it.

pub mod sampler;
pub mod yunet;

use image::RgbImage;

use crate::error::MediaResult;
use crate::geometry::BoundingBox;

pub use sampler::{sample_face_center, FaceSampling};
pub use yunet::{YuNetDetector, YuNetProvider};

/// Detects faces in a single decoded frame.
pub trait FaceDetector: Send {
    /// Face boxes in frame pixel coordinates. An empty list means no face.
    fn detect(&mut self, frame: &RgbImage) -> MediaResult<Vec<BoundingBox>>;
}

/// Creates a detector sized for a given source.
///
/// Creation failing means the detection subsystem is unavailable; callers
/// fall back to a center crop.
pub trait DetectorProvider: Send + Sync {
    fn create(&self, frame_width: u32, frame_height: u32) -> MediaResult<Box<dyn FaceDetector>>;
}

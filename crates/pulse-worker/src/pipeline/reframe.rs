use tracing::{debug, info, warn};

use pulse_media::geometry::FALLBACK_CENTER;
use pulse_media::{sample_face_center, DetectorProvider, FaceDetector, FrameTransform, MediaResult, VideoSource};
use pulse_models::{ClipWindow, CropMode};

enum DetectorState {
    Pending,
    Ready(Box<dyn FaceDetector>),
    Unavailable,
}

/// Picks the frame transform for each clip of one source.
///
/// The face detector is created lazily on the first clip that needs it and
/// reused for the rest of the run. If it cannot be created every clip gets a
/// center crop.
pub struct Reframer<'a> {
    crop_mode: CropMode,
    provider: Option<&'a dyn DetectorProvider>,
    detector: DetectorState,
}

impl<'a> Reframer<'a> {
    pub fn new(crop_mode: CropMode, provider: Option<&'a dyn DetectorProvider>) -> Self {
        Self {
            crop_mode,
            provider,
            detector: DetectorState::Pending,
        }
    }

    fn detector(&mut self, width: u32, height: u32) -> Option<&mut dyn FaceDetector> {
        if matches!(self.detector, DetectorState::Pending) {
            self.detector = match self.provider.map(|p| p.create(width, height)) {
                Some(Ok(detector)) => {
                    info!(width, height, "Face detector ready");
                    DetectorState::Ready(detector)
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Face detector unavailable, using center crops");
                    DetectorState::Unavailable
                }
                None => {
                    warn!("No face detector configured, using center crops");
                    DetectorState::Unavailable
                }
            };
        }

        match &mut self.detector {
            DetectorState::Ready(detector) => Some(detector.as_mut()),
            _ => None,
        }
    }

    /// Transform for `window` of `source`.
    ///
    /// Detection problems never fail the clip; they only move the crop back
    /// to the frame center. Errors come from degenerate source dimensions.
    pub async fn transform_for(
        &mut self,
        source: &mut dyn VideoSource,
        window: &ClipWindow,
    ) -> MediaResult<FrameTransform> {
        let (width, height) = (source.info().width, source.info().height);

        if !FrameTransform::wants_face_crop(self.crop_mode, width, height) {
            debug!(clip_index = window.index, width, height, "Letterboxing clip");
            return FrameTransform::letterbox(width, height);
        }

        let center = match self.detector(width, height) {
            Some(detector) => {
                match sample_face_center(source, detector, window.start, window.duration()).await {
                    Ok(sampling) => {
                        debug!(
                            clip_index = window.index,
                            faces = sampling.faces_found,
                            center = sampling.average,
                            "Sampled face center"
                        );
                        sampling.average
                    }
                    Err(e) => {
                        warn!(clip_index = window.index, error = %e, "Face sampling failed, using center crop");
                        FALLBACK_CENTER
                    }
                }
            }
            None => FALLBACK_CENTER,
        };

        FrameTransform::face_crop(width, height, center)
    }
}

//! OpenCV YuNet face detector.
//!
//! YuNet is a small CNN face detector shipped as an ONNX model and exposed
//! through OpenCV's `FaceDetectorYN`. It is only compiled with the `opencv`
//! feature; without it [`YuNetProvider`] reports the subsystem as unavailable.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::{DetectorProvider, FaceDetector};
use crate::error::{MediaError, MediaResult};

/// Default model locations, newest first.
pub const YUNET_MODEL_PATHS: &[&str] = &[
    "models/face_detection_yunet_2023mar.onnx",
    "/usr/share/pulse/models/face_detection_yunet_2023mar.onnx",
    "models/face_detection_yunet_2022mar.onnx",
    "/usr/share/pulse/models/face_detection_yunet_2022mar.onnx",
];

/// Detection confidence threshold.
#[cfg_attr(not(feature = "opencv"), allow(dead_code))]
const SCORE_THRESHOLD: f32 = 0.6;

/// NMS threshold for face detection.
#[cfg_attr(not(feature = "opencv"), allow(dead_code))]
const NMS_THRESHOLD: f32 = 0.3;

/// Top K faces to keep.
#[cfg_attr(not(feature = "opencv"), allow(dead_code))]
const TOP_K: i32 = 10;

/// Resolve the model file: explicit path first, then the default locations.
pub fn find_model_path(explicit: Option<&Path>) -> MediaResult<PathBuf> {
    if let Some(path) = explicit {
        return if path.exists() {
            Ok(path.to_path_buf())
        } else {
            Err(MediaError::model_not_found(path.display().to_string()))
        };
    }

    YUNET_MODEL_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| MediaError::model_not_found(YUNET_MODEL_PATHS.join(", ")))
}

/// Builds [`YuNetDetector`]s for each source.
#[derive(Debug, Clone, Default)]
pub struct YuNetProvider {
    model_path: Option<PathBuf>,
}

impl YuNetProvider {
    pub fn new(model_path: Option<PathBuf>) -> Self {
        Self { model_path }
    }
}

impl DetectorProvider for YuNetProvider {
    fn create(&self, frame_width: u32, frame_height: u32) -> MediaResult<Box<dyn FaceDetector>> {
        let model_path = find_model_path(self.model_path.as_deref())?;
        let detector = YuNetDetector::new(&model_path, frame_width, frame_height)?;
        Ok(Box::new(detector))
    }
}

/// Input size for the network: scaled to fit 640x640, multiples of 32.
#[cfg_attr(not(feature = "opencv"), allow(dead_code))]
fn input_size(frame_width: u32, frame_height: u32) -> (i32, i32) {
    const TARGET: f64 = 640.0;
    const ALIGNMENT: i32 = 32;

    let scale = (frame_width as f64 / TARGET)
        .max(frame_height as f64 / TARGET)
        .max(1.0);
    let align = |v: f64| -> i32 {
        let v = v.round() as i32;
        (((v + ALIGNMENT / 2) / ALIGNMENT) * ALIGNMENT).max(ALIGNMENT)
    };

    (
        align(frame_width as f64 / scale),
        align(frame_height as f64 / scale),
    )
}

#[cfg(feature = "opencv")]
mod backend {
    use super::*;
    use crate::geometry::BoundingBox;
    use image::RgbImage;
    use opencv::core::{Mat, Ptr, Scalar, Size, CV_8UC3};
    use opencv::imgproc;
    use opencv::objdetect::FaceDetectorYN;
    use opencv::prelude::*;
    use tracing::info;

    /// YuNet face detector bound to one source resolution.
    pub struct YuNetDetector {
        detector: Ptr<FaceDetectorYN>,
        input_size: (i32, i32),
    }

    // FaceDetectorYN is only ever used from the thread that owns the pipeline.
    unsafe impl Send for YuNetDetector {}

    impl YuNetDetector {
        pub fn new(model_path: &Path, frame_width: u32, frame_height: u32) -> MediaResult<Self> {
            let input_size = input_size(frame_width, frame_height);
            let model = model_path.to_string_lossy();

            let detector = FaceDetectorYN::create(
                &model,
                "",
                Size::new(input_size.0, input_size.1),
                SCORE_THRESHOLD,
                NMS_THRESHOLD,
                TOP_K,
                opencv::dnn::DNN_BACKEND_DEFAULT,
                opencv::dnn::DNN_TARGET_CPU,
            )
            .map_err(|e| MediaError::detection_failed(format!("Failed to create YuNet: {}", e)))?;

            info!(
                model = %model,
                input_width = input_size.0,
                input_height = input_size.1,
                "YuNet detector initialized"
            );

            Ok(Self { detector, input_size })
        }

        fn to_bgr_mat(frame: &RgbImage) -> opencv::Result<Mat> {
            let mut rgb = Mat::new_rows_cols_with_default(
                frame.height() as i32,
                frame.width() as i32,
                CV_8UC3,
                Scalar::all(0.0),
            )?;
            rgb.data_bytes_mut()?.copy_from_slice(frame.as_raw());

            let mut bgr = Mat::default();
            imgproc::cvt_color_def(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR)?;
            Ok(bgr)
        }
    }

    impl FaceDetector for YuNetDetector {
        fn detect(&mut self, frame: &RgbImage) -> MediaResult<Vec<BoundingBox>> {
            if frame.width() == 0 || frame.height() == 0 {
                return Ok(Vec::new());
            }

            let detect = |this: &mut Self| -> opencv::Result<Mat> {
                let bgr = Self::to_bgr_mat(frame)?;
                let mut resized = Mat::default();
                imgproc::resize(
                    &bgr,
                    &mut resized,
                    Size::new(this.input_size.0, this.input_size.1),
                    0.0,
                    0.0,
                    imgproc::INTER_LINEAR,
                )?;
                this.detector
                    .set_input_size(Size::new(this.input_size.0, this.input_size.1))?;
                let mut faces = Mat::default();
                this.detector.detect(&resized, &mut faces)?;
                Ok(faces)
            };

            let faces = detect(self)
                .map_err(|e| MediaError::detection_failed(format!("YuNet detection failed: {}", e)))?;

            // Rows: [x, y, w, h, 10 landmark coords, score]
            let scale_x = frame.width() as f64 / self.input_size.0 as f64;
            let scale_y = frame.height() as f64 / self.input_size.1 as f64;
            let (fw, fh) = (frame.width() as f64, frame.height() as f64);

            let mut boxes = Vec::new();
            if faces.cols() < 15 {
                return Ok(boxes);
            }
            for row in 0..faces.rows() {
                let value = |col: i32| faces.at_2d::<f32>(row, col).map(|v| *v as f64);
                let (Ok(x), Ok(y), Ok(w), Ok(h)) = (value(0), value(1), value(2), value(3)) else {
                    continue;
                };
                let bbox = BoundingBox::new(x * scale_x, y * scale_y, w * scale_x, h * scale_y);
                if let Some(clamped) = bbox.clamp_to(fw, fh) {
                    boxes.push(clamped);
                }
            }

            debug!(faces = boxes.len(), "YuNet detection");
            Ok(boxes)
        }
    }
}

#[cfg(not(feature = "opencv"))]
mod backend {
    use super::*;

    /// Stub for builds without OpenCV.
    pub struct YuNetDetector;

    impl YuNetDetector {
        pub fn new(model_path: &Path, _frame_width: u32, _frame_height: u32) -> MediaResult<Self> {
            debug!(model = %model_path.display(), "YuNet requested without the opencv feature");
            Err(MediaError::detection_failed("OpenCV feature not enabled"))
        }
    }

    impl FaceDetector for YuNetDetector {
        fn detect(&mut self, _frame: &image::RgbImage) -> MediaResult<Vec<crate::geometry::BoundingBox>> {
            Err(MediaError::detection_failed("OpenCV feature not enabled"))
        }
    }
}

pub use backend::YuNetDetector;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_size_alignment() {
        let (w, h) = input_size(1920, 1080);
        assert_eq!(w % 32, 0);
        assert_eq!(h % 32, 0);
        assert!(w <= 640 && h <= 384);

        assert_eq!(input_size(320, 240), (320, 256));
    }

    #[test]
    fn test_missing_explicit_model() {
        let err = find_model_path(Some(Path::new("/nonexistent/yunet.onnx"))).unwrap_err();
        assert!(err.is_detection());
    }

    #[test]
    fn test_provider_without_model_fails() {
        let provider = YuNetProvider::new(Some(PathBuf::from("/nonexistent/yunet.onnx")));
        assert!(provider.create(1920, 1080).is_err());
    }
}

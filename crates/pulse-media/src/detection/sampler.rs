//! Three-point face sampling for one clip.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::FaceDetector;
use crate::error::{MediaError, MediaResult};
use crate::geometry::{average_center, face_center, sample_timestamps, FALLBACK_CENTER};
use crate::source::VideoSource;

/// What the sampler saw for one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceSampling {
    /// Clip-relative sample times, in sampling order
    pub timestamps: [f64; 3],
    /// Recorded center per sample (fallback included)
    pub centers: Vec<f64>,
    /// Samples where at least one face was found
    pub faces_found: usize,
    /// Mean of `centers`
    pub average: f64,
}

/// Sample the detector at the start, middle and end of a clip.
///
/// A sample with no face, a failed detection or an unreadable frame records
/// the frame center. If no frame at all could be read the sampling itself is
/// an error and the caller is expected to use a center crop.
pub async fn sample_face_center(
    source: &mut dyn VideoSource,
    detector: &mut dyn FaceDetector,
    clip_start: f64,
    clip_duration: f64,
) -> MediaResult<FaceSampling> {
    let timestamps = sample_timestamps(clip_duration);
    let frame_width = source.info().width;

    let mut centers = Vec::with_capacity(timestamps.len());
    let mut faces_found = 0;
    let mut frames_read = 0;
    let mut last_frame_error = None;

    for &t in &timestamps {
        let frame = match source.frame_at(clip_start + t).await {
            Ok(frame) => {
                frames_read += 1;
                frame
            }
            Err(e) => {
                warn!(sample_time = t, error = %e, "Frame grab failed, using center");
                last_frame_error = Some(e);
                centers.push(FALLBACK_CENTER);
                continue;
            }
        };

        let width = if frame.width() > 0 { frame.width() } else { frame_width };
        let center = match detector.detect(&frame) {
            Ok(boxes) => match face_center(&boxes, width) {
                Some(center) => {
                    faces_found += 1;
                    center
                }
                None => FALLBACK_CENTER,
            },
            Err(e) => {
                warn!(sample_time = t, error = %e, "Face detection failed, using center");
                FALLBACK_CENTER
            }
        };

        debug!(sample_time = t, center, "Face sample");
        centers.push(center);
    }

    if frames_read == 0 {
        let reason = last_frame_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no samples taken".to_string());
        return Err(MediaError::detection_failed(format!(
            "Could not sample source for face tracking: {}",
            reason
        )));
    }

    let average = average_center(&centers);
    Ok(FaceSampling {
        timestamps,
        centers,
        faces_found,
        average,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;
    use crate::probe::VideoInfo;
    use async_trait::async_trait;
    use image::RgbImage;
    use std::path::{Path, PathBuf};

    struct StubSource {
        info: VideoInfo,
        path: PathBuf,
        fail_at: Vec<f64>,
        reads: Vec<f64>,
    }

    impl StubSource {
        fn new(fail_at: Vec<f64>) -> Self {
            Self {
                info: VideoInfo {
                    duration: 60.0,
                    width: 64,
                    height: 36,
                    fps: 30.0,
                    codec: "h264".into(),
                    has_audio: true,
                },
                path: PathBuf::from("stub.mp4"),
                fail_at,
                reads: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl VideoSource for StubSource {
        fn path(&self) -> &Path {
            &self.path
        }

        fn info(&self) -> &VideoInfo {
            &self.info
        }

        async fn frame_at(&mut self, timestamp: f64) -> MediaResult<RgbImage> {
            self.reads.push(timestamp);
            if self.fail_at.iter().any(|f| (f - timestamp).abs() < 1e-9) {
                return Err(MediaError::internal("decode error"));
            }
            Ok(RgbImage::new(64, 36))
        }

        async fn close(&mut self) -> MediaResult<()> {
            Ok(())
        }
    }

    /// Returns scripted results in call order.
    struct ScriptedDetector(Vec<MediaResult<Vec<BoundingBox>>>);

    impl FaceDetector for ScriptedDetector {
        fn detect(&mut self, _frame: &RgbImage) -> MediaResult<Vec<BoundingBox>> {
            if self.0.is_empty() {
                return Ok(Vec::new());
            }
            self.0.remove(0)
        }
    }

    #[tokio::test]
    async fn test_samples_in_order_relative_to_clip() {
        let mut source = StubSource::new(vec![]);
        let mut detector = ScriptedDetector(vec![]);
        let sampling = sample_face_center(&mut source, &mut detector, 20.0, 10.0)
            .await
            .unwrap();
        let expected = [20.0, 25.0, 29.9];
        assert_eq!(source.reads.len(), expected.len());
        for (read, want) in source.reads.iter().zip(expected) {
            assert!((read - want).abs() < 1e-9, "read {} expected {}", read, want);
        }
        assert_eq!(sampling.centers, vec![0.5, 0.5, 0.5]);
        assert_eq!(sampling.faces_found, 0);
    }

    #[tokio::test]
    async fn test_failed_sample_counts_as_center() {
        let mut source = StubSource::new(vec![]);
        // Face at x=16 (center 0.25), then an error, then a face at center 0.75
        let mut detector = ScriptedDetector(vec![
            Ok(vec![BoundingBox::new(12.0, 0.0, 8.0, 8.0)]),
            Err(MediaError::detection_failed("boom")),
            Ok(vec![
                BoundingBox::new(0.0, 0.0, 2.0, 2.0),
                BoundingBox::new(44.0, 0.0, 8.0, 8.0),
            ]),
        ]);
        let sampling = sample_face_center(&mut source, &mut detector, 0.0, 10.0)
            .await
            .unwrap();
        assert_eq!(sampling.centers, vec![0.25, 0.5, 0.75]);
        assert_eq!(sampling.faces_found, 2);
        assert!((sampling.average - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unreadable_source_is_an_error() {
        let mut source = StubSource::new(vec![0.0, 5.0, 9.9]);
        let mut detector = ScriptedDetector(vec![]);
        let result = sample_face_center(&mut source, &mut detector, 0.0, 10.0).await;
        assert!(result.unwrap_err().is_detection());
    }
}

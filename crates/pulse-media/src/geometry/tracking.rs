//! Face-tracking target center from a handful of sampled detections.

use super::bbox::BoundingBox;

/// Center used for a sample with no face or a failed detection.
pub const FALLBACK_CENTER: f64 = 0.5;

/// Offset from the clip end for the last sample, so the grab stays inside
/// the clip.
const TAIL_OFFSET: f64 = 0.1;

/// Clip-relative timestamps to sample: start, middle and just before the end.
pub fn sample_timestamps(duration: f64) -> [f64; 3] {
    let duration = duration.max(0.0);
    [0.0, duration / 2.0, (duration - TAIL_OFFSET).max(0.0)]
}

/// Normalized horizontal center of the largest face, if any.
pub fn face_center(boxes: &[BoundingBox], frame_width: u32) -> Option<f64> {
    boxes
        .iter()
        .filter(|b| b.area() > 0.0)
        .max_by(|a, b| a.area().total_cmp(&b.area()))
        .map(|b| b.normalized_cx(frame_width))
}

/// Mean of the recorded centers; an empty list averages to the frame center.
pub fn average_center(centers: &[f64]) -> f64 {
    if centers.is_empty() {
        return FALLBACK_CENTER;
    }
    centers.iter().sum::<f64>() / centers.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_timestamps() {
        assert_eq!(sample_timestamps(10.0), [0.0, 5.0, 9.9]);
        assert_eq!(sample_timestamps(0.05), [0.0, 0.025, 0.0]);
    }

    #[test]
    fn test_largest_face_wins() {
        let boxes = [
            BoundingBox::new(100.0, 100.0, 50.0, 50.0),
            BoundingBox::new(1500.0, 200.0, 200.0, 200.0),
        ];
        let center = face_center(&boxes, 1920).unwrap();
        assert!((center - 1600.0 / 1920.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_faces() {
        assert!(face_center(&[], 1920).is_none());
    }

    #[test]
    fn test_average() {
        assert!((average_center(&[0.2, 0.5, 0.8]) - 0.5).abs() < 1e-9);
        assert_eq!(average_center(&[]), FALLBACK_CENTER);
    }
}

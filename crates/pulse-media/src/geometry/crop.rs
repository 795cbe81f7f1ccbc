//! 9:16 crop windows over landscape sources.

use serde::{Deserialize, Serialize};

use pulse_models::{OUTPUT_HEIGHT, OUTPUT_WIDTH};

use crate::error::{MediaError, MediaResult};

/// Portrait aspect ratio (width / height) of the output.
pub const PORTRAIT_ASPECT: f64 = 9.0 / 16.0;

/// A full-height crop window in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropWindow {
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
}

impl CropWindow {
    #[inline]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    #[inline]
    pub fn center_x(&self) -> f64 {
        (self.x1 + self.x2) / 2.0
    }

    /// `crop → scale → setsar` filter chain.
    ///
    /// FFmpeg crops on whole pixels, so the window is snapped to even
    /// dimensions and a whole-pixel offset that still lie inside the source.
    pub fn to_filter(&self, source_width: u32, source_height: u32) -> String {
        let crop_width = snap_even(self.width()).min(source_width & !1).max(2);
        let crop_height = snap_even(self.height()).min(source_height & !1).max(2);
        let max_x = source_width.saturating_sub(crop_width);
        let max_y = source_height.saturating_sub(crop_height);
        let x = (self.x1.round().max(0.0) as u32).min(max_x);
        let y = (self.y1.round().max(0.0) as u32).min(max_y);

        format!(
            "crop={}:{}:{}:{},scale={}:{},setsar=1",
            crop_width, crop_height, x, y, OUTPUT_WIDTH, OUTPUT_HEIGHT
        )
    }
}

/// Full-height 9:16 window centered on `center` (0..1 across the width).
///
/// A window that would spill past an edge is slid back inside instead of
/// being shrunk.
pub fn face_tracked_crop(width: u32, height: u32, center: f64) -> MediaResult<CropWindow> {
    if width == 0 || height == 0 {
        return Err(MediaError::InvalidVideo(format!(
            "Cannot crop a {}x{} frame",
            width, height
        )));
    }

    let (w, h) = (width as f64, height as f64);
    let target_width = h * PORTRAIT_ASPECT;
    if target_width > w {
        return Err(MediaError::invalid_range(format!(
            "9:16 window ({:.1}px) is wider than the {}px source",
            target_width, width
        )));
    }

    let center = if center.is_finite() {
        center.clamp(0.0, 1.0)
    } else {
        0.5
    };

    let mut x1 = center * w - target_width / 2.0;
    let mut x2 = x1 + target_width;
    if x1 < 0.0 {
        x1 = 0.0;
        x2 = target_width;
    }
    if x2 > w {
        x1 = w - target_width;
        x2 = w;
    }

    Ok(CropWindow { x1, x2, y1: 0.0, y2: h })
}

/// Center crop used when face detection is unavailable.
pub fn center_crop(width: u32, height: u32) -> MediaResult<CropWindow> {
    face_tracked_crop(width, height, 0.5)
}

fn snap_even(value: f64) -> u32 {
    ((value / 2.0).round() * 2.0).max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_window() {
        let window = face_tracked_crop(1920, 1080, 0.5).unwrap();
        assert!((window.width() - 607.5).abs() < 1e-9);
        assert!((window.x1 - 656.25).abs() < 1e-9);
        assert!((window.center_x() - 960.0).abs() < 1e-9);
        assert_eq!(window.y1, 0.0);
        assert_eq!(window.y2, 1080.0);
    }

    #[test]
    fn test_slides_inside_left_edge() {
        let window = face_tracked_crop(1920, 1080, 0.02).unwrap();
        assert_eq!(window.x1, 0.0);
        assert!((window.x2 - 607.5).abs() < 1e-9);
    }

    #[test]
    fn test_slides_inside_right_edge() {
        let window = face_tracked_crop(1920, 1080, 0.99).unwrap();
        assert_eq!(window.x2, 1920.0);
        assert!((window.x1 - 1312.5).abs() < 1e-9);
    }

    #[test]
    fn test_always_within_source() {
        for i in 0..=20 {
            let center = i as f64 / 20.0;
            let window = face_tracked_crop(1280, 720, center).unwrap();
            assert!(window.x1 >= 0.0);
            assert!(window.x2 <= 1280.0);
            assert!((window.width() - 405.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_non_finite_center_falls_back() {
        let window = face_tracked_crop(1920, 1080, f64::NAN).unwrap();
        assert_eq!(window, center_crop(1920, 1080).unwrap());
    }

    #[test]
    fn test_portrait_source_rejected() {
        assert!(face_tracked_crop(1000, 1920, 0.5).is_err());
    }

    #[test]
    fn test_exact_fit_accepted() {
        // 1920 * 9/16 == 1080: the window spans the whole frame
        let window = face_tracked_crop(1080, 1920, 0.3).unwrap();
        assert_eq!((window.x1, window.x2), (0.0, 1080.0));
    }

    #[test]
    fn test_filter_never_taller_than_odd_source() {
        let window = center_crop(854, 481).unwrap();
        let filter = window.to_filter(854, 481);
        assert!(filter.starts_with("crop=270:480:"), "{}", filter);

        let window = center_crop(1281, 721).unwrap();
        assert!(window.to_filter(1281, 721).starts_with("crop=406:720:"));
    }

    #[test]
    fn test_filter_snaps_to_pixels() {
        let window = center_crop(1920, 1080).unwrap();
        assert_eq!(window.to_filter(1920, 1080), "crop=608:1080:656:0,scale=1080:1920,setsar=1");

        let right = face_tracked_crop(1920, 1080, 1.0).unwrap();
        assert_eq!(right.to_filter(1920, 1080), "crop=608:1080:1312:0,scale=1080:1920,setsar=1");
    }
}

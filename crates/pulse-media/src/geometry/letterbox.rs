//! Letterbox placement of a frame on the portrait canvas.
//!
//! The source is scaled to fit the canvas without cropping and centered on a
//! solid black background. Width is tried first; if the width-fitted frame is
//! too tall the frame is fitted by height instead.

use serde::{Deserialize, Serialize};

use pulse_models::{OUTPUT_HEIGHT, OUTPUT_WIDTH};

use crate::error::{MediaError, MediaResult};

/// Fill color of the letterbox bars.
pub const LETTERBOX_FILL: &str = "black";

/// Where the scaled source lands on the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterboxPlacement {
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl LetterboxPlacement {
    /// `scale → pad → setsar` filter chain for this placement.
    pub fn to_filter(&self) -> String {
        format!(
            "scale={}:{},pad={}:{}:{}:{}:color={},setsar=1",
            self.scaled_width,
            self.scaled_height,
            self.canvas_width,
            self.canvas_height,
            self.offset_x,
            self.offset_y,
            LETTERBOX_FILL
        )
    }
}

/// Compute the letterbox placement of a `width x height` frame on the
/// 1080x1920 canvas.
pub fn compute_letterbox(width: u32, height: u32) -> MediaResult<LetterboxPlacement> {
    compute_letterbox_on(width, height, OUTPUT_WIDTH, OUTPUT_HEIGHT)
}

/// Same as [`compute_letterbox`] for an arbitrary canvas.
pub fn compute_letterbox_on(
    width: u32,
    height: u32,
    canvas_width: u32,
    canvas_height: u32,
) -> MediaResult<LetterboxPlacement> {
    if width == 0 || height == 0 {
        return Err(MediaError::InvalidVideo(format!(
            "Cannot letterbox a {}x{} frame",
            width, height
        )));
    }

    let (w, h) = (width as f64, height as f64);

    let mut scale = canvas_width as f64 / w;
    if h * scale > canvas_height as f64 {
        scale = canvas_height as f64 / h;
    }

    // Even sizes keep 4:2:0 chroma aligned
    let scaled_width = round_even(w * scale).min(canvas_width);
    let scaled_height = round_even(h * scale).min(canvas_height);

    Ok(LetterboxPlacement {
        scaled_width,
        scaled_height,
        offset_x: (canvas_width - scaled_width) / 2,
        offset_y: (canvas_height - scaled_height) / 2,
        canvas_width,
        canvas_height,
    })
}

fn round_even(value: f64) -> u32 {
    let even = ((value / 2.0).round() * 2.0) as u32;
    even.max(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_fills_canvas(p: &LetterboxPlacement) {
        assert_eq!(p.canvas_width, OUTPUT_WIDTH);
        assert_eq!(p.canvas_height, OUTPUT_HEIGHT);
        assert!(p.scaled_width <= OUTPUT_WIDTH);
        assert!(p.scaled_height <= OUTPUT_HEIGHT);
        assert_eq!(p.offset_x * 2 + p.scaled_width, OUTPUT_WIDTH);
        assert_eq!(p.offset_y * 2 + p.scaled_height, OUTPUT_HEIGHT);
    }

    #[test]
    fn test_landscape_fits_by_width() {
        let p = compute_letterbox(1920, 1080).unwrap();
        assert_eq!(p.scaled_width, 1080);
        assert_eq!(p.scaled_height, 608);
        assert_eq!(p.offset_y, 656);
        assert_fills_canvas(&p);
    }

    #[test]
    fn test_tall_source_fits_by_height() {
        let p = compute_letterbox(720, 1600).unwrap();
        assert_eq!(p.scaled_height, 1920);
        assert_eq!(p.scaled_width, 864);
        assert_eq!(p.offset_y, 0);
        assert_fills_canvas(&p);
    }

    #[test]
    fn test_always_full_canvas() {
        for (w, h) in [(1920, 1080), (1080, 1920), (640, 480), (1000, 1000), (3840, 1600), (333, 777)] {
            let p = compute_letterbox(w, h).unwrap();
            assert_fills_canvas(&p);
        }
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(compute_letterbox(0, 1080).is_err());
    }

    #[test]
    fn test_filter() {
        let p = compute_letterbox(1920, 1080).unwrap();
        assert_eq!(
            p.to_filter(),
            "scale=1080:608,pad=1080:1920:0:656:color=black,setsar=1"
        );
    }
}

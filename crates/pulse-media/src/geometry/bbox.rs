//! Face bounding boxes in source pixel coordinates.

use serde::{Deserialize, Serialize};

/// Bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge x-coordinate
    pub x: f64,
    /// Top edge y-coordinate
    pub y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Center x-coordinate.
    #[inline]
    pub fn cx(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Box area in pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Horizontal center as a fraction of the frame width, clamped to `0..=1`.
    pub fn normalized_cx(&self, frame_width: u32) -> f64 {
        if frame_width == 0 {
            return 0.5;
        }
        (self.cx() / frame_width as f64).clamp(0.0, 1.0)
    }

    /// Clip the box to the frame. Returns `None` when nothing is left.
    pub fn clamp_to(&self, frame_width: f64, frame_height: f64) -> Option<BoundingBox> {
        let x1 = self.x.max(0.0);
        let y1 = self.y.max(0.0);
        let x2 = (self.x + self.width).min(frame_width);
        let y2 = (self.y + self.height).min(frame_height);
        (x2 > x1 && y2 > y1).then(|| BoundingBox::new(x1, y1, x2 - x1, y2 - y1))
    }
}

//! Clip window and rendered clip models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ClipProposal;

/// The validated, duration-clamped source range of one clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipWindow {
    /// 1-based position of the originating proposal in the input list
    pub index: usize,
    /// Start in seconds (source timeline)
    pub start: f64,
    /// Clamped end in seconds (source timeline)
    pub end: f64,
}

impl ClipWindow {
    pub fn new(index: usize, start: f64, end: f64) -> Self {
        Self { index, start, end }
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Output file name, `clip_{index}_{start_seconds}.mp4`.
    pub fn output_filename(&self) -> String {
        format!("clip_{}_{}.mp4", self.index, self.start.trunc() as i64)
    }
}

/// A clip that made it all the way through encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderedClip {
    pub index: usize,
    /// Encoded MP4 file
    pub path: PathBuf,
    pub window: ClipWindow,
    /// Number of subtitle cues burned into the clip
    pub cue_count: usize,
    pub proposal: ClipProposal,
}

impl RenderedClip {
    pub fn duration(&self) -> f64 {
        self.window.duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_filename_truncates_start() {
        let window = ClipWindow::new(2, 93.7, 105.0);
        assert_eq!(window.output_filename(), "clip_2_93.mp4");
    }

    #[test]
    fn test_duration() {
        let window = ClipWindow::new(1, 3.0, 10.0);
        assert!((window.duration() - 7.0).abs() < f64::EPSILON);
    }
}

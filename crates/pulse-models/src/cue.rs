//! Clip-relative subtitle cues.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A subtitle line scoped to one output clip.
///
/// `start`/`end` are seconds from the clip's first frame, never from the
/// source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubtitleCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl SubtitleCue {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Whether the cue is on screen at clip time `t` (both ends inclusive).
    #[inline]
    pub fn is_active_at(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_inclusive() {
        let cue = SubtitleCue::new(2.0, 7.0, "world");
        assert!(cue.is_active_at(2.0));
        assert!(cue.is_active_at(7.0));
        assert!(!cue.is_active_at(7.01));
        assert!((cue.duration() - 5.0).abs() < f64::EPSILON);
    }
}

//! Transcript models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A time-stamped piece of speech from the transcription service.
///
/// Segments arrive ordered by start time. They are usually disjoint but
/// nothing downstream relies on that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    /// Start time in seconds (source timeline)
    pub start: f64,
    /// End time in seconds (source timeline)
    pub end: f64,
    /// Spoken text
    pub text: String,
}

impl TranscriptSegment {
    /// Create a new segment.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Whether this segment overlaps the open interval `(start, end)`.
    #[inline]
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start < end && self.end > start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_strict_at_boundaries() {
        let seg = TranscriptSegment::new(5.0, 12.0, "world");
        assert!(seg.overlaps(3.0, 10.0));
        assert!(!seg.overlaps(0.0, 5.0));
        assert!(!seg.overlaps(12.0, 20.0));
    }

    #[test]
    fn test_deserialize_whisper_segment() {
        let json = r#"{"id": 0, "start": 0.0, "end": 2.5, "text": " Hello there", "tokens": [1, 2]}"#;
        let seg: TranscriptSegment = serde_json::from_str(json).unwrap();
        assert_eq!(seg.text, " Hello there");
        assert!((seg.end - 2.5).abs() < f64::EPSILON);
    }
}

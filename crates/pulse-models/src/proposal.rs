//! AI clip proposal models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Summary used for the placeholder proposal when AI selection is unavailable.
pub const PLACEHOLDER_SUMMARY: &str = "Error in AI generation - Fallback";

/// A candidate highlight proposed by the AI selector.
///
/// Timestamps are optional on the wire: the model sometimes omits them and
/// such proposals are skipped by the pipeline instead of failing the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipProposal {
    /// Proposed start (seconds, source timeline)
    #[serde(default)]
    pub start_time: Option<f64>,

    /// Proposed end (seconds, source timeline); may exceed the duration limit
    #[serde(default)]
    pub end_time: Option<f64>,

    /// Virality score (0-10); models sometimes answer with fractions
    #[serde(default)]
    pub viral_score: f64,

    /// Brief summary of the moment
    #[serde(default)]
    pub summary: String,

    /// Space separated hashtags
    #[serde(default)]
    pub hashtags: String,

    /// Short quotable line, preferred over the summary as a caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
}

impl ClipProposal {
    /// Create a proposal with both timestamps set.
    pub fn new(start_time: f64, end_time: f64, summary: impl Into<String>) -> Self {
        Self {
            start_time: Some(start_time),
            end_time: Some(end_time),
            viral_score: 0.0,
            summary: summary.into(),
            hashtags: String::new(),
            quote: None,
        }
    }

    /// Low-score stand-in used when the AI selector cannot be reached.
    pub fn placeholder() -> Self {
        Self {
            start_time: Some(0.0),
            end_time: Some(10.0),
            viral_score: 5.0,
            summary: PLACEHOLDER_SUMMARY.to_string(),
            hashtags: "#error".to_string(),
            quote: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.viral_score = score;
        self
    }

    pub fn with_hashtags(mut self, hashtags: impl Into<String>) -> Self {
        self.hashtags = hashtags.into();
        self
    }

    pub fn with_quote(mut self, quote: impl Into<String>) -> Self {
        self.quote = Some(quote.into());
        self
    }

    /// Both timestamps, if present.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        Some((self.start_time?, self.end_time?))
    }

    /// Caption used when no transcript speech falls inside the clip.
    ///
    /// Prefers the quote, then the summary. Returns `None` when both are blank.
    pub fn caption_text(&self) -> Option<&str> {
        self.quote
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .or_else(|| Some(self.summary.trim()).filter(|s| !s.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_timestamps_deserialize() {
        let json = r#"{"start_time": 12.5, "viral_score": 8, "summary": "Big reveal"}"#;
        let proposal: ClipProposal = serde_json::from_str(json).unwrap();
        assert_eq!(proposal.start_time, Some(12.5));
        assert!(proposal.end_time.is_none());
        assert!(proposal.time_range().is_none());
        assert!(proposal.hashtags.is_empty());
    }

    #[test]
    fn test_fractional_score_deserializes() {
        let json = r#"[
            {"start_time": 1, "end_time": 9, "viral_score": 8.5, "summary": "a"},
            {"start_time": 20, "end_time": 30, "viral_score": 7, "summary": "b"}
        ]"#;
        let proposals: Vec<ClipProposal> = serde_json::from_str(json).unwrap();
        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].viral_score, 8.5);
        assert_eq!(proposals[1].viral_score, 7.0);
    }

    #[test]
    fn test_caption_prefers_quote() {
        let proposal = ClipProposal::new(0.0, 10.0, "Great moment").with_quote("  ");
        assert_eq!(proposal.caption_text(), Some("Great moment"));

        let proposal = proposal.with_quote("You won't believe this");
        assert_eq!(proposal.caption_text(), Some("You won't believe this"));
    }

    #[test]
    fn test_caption_empty() {
        let proposal = ClipProposal::new(0.0, 10.0, "   ");
        assert!(proposal.caption_text().is_none());
    }

    #[test]
    fn test_placeholder() {
        let p = ClipProposal::placeholder();
        assert_eq!(p.time_range(), Some((0.0, 10.0)));
        assert_eq!(p.viral_score, 5.0);
        assert_eq!(p.hashtags, "#error");
    }
}

//! Segment selector: turns AI proposals into clip windows and clip-relative
//! subtitle cues.

use thiserror::Error;
use tracing::debug;

use pulse_models::{ClipProposal, ClipWindow, SubtitleCue, TranscriptSegment};

/// Why a proposal produced no clip.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("missing start or end timestamp")]
    MissingTimestamps,
    #[error("start {0} is negative or not a number")]
    InvalidStart(f64),
    #[error("empty range [{start}, {end}]")]
    EmptyRange { start: f64, end: f64 },
    #[error("start {start} is past the end of the {duration}s source")]
    BeyondSource { start: f64, duration: f64 },
}

/// A validated clip with its cues.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedClip {
    pub window: ClipWindow,
    pub cues: Vec<SubtitleCue>,
}

/// Validate a proposal and clamp it to `max_duration` seconds and, when
/// known, to the end of the source.
///
/// `index` is the 1-based position of the proposal in the input list.
pub fn select_window(
    index: usize,
    proposal: &ClipProposal,
    max_duration: f64,
    source_duration: Option<f64>,
) -> Result<ClipWindow, SkipReason> {
    let (start, end) = proposal.time_range().ok_or(SkipReason::MissingTimestamps)?;

    if !start.is_finite() || start < 0.0 {
        return Err(SkipReason::InvalidStart(start));
    }
    if end.is_nan() || end <= start {
        return Err(SkipReason::EmptyRange { start, end });
    }

    let mut end = if end - start > max_duration {
        start + max_duration
    } else {
        end
    };

    if let Some(duration) = source_duration.filter(|d| d.is_finite() && *d > 0.0) {
        if start >= duration {
            return Err(SkipReason::BeyondSource { start, duration });
        }
        end = end.min(duration);
    }

    Ok(ClipWindow::new(index, start, end))
}

/// Cues for every transcript segment overlapping the window, shifted to clip
/// time and trimmed to `[0, duration]`.
///
/// When no speech falls inside the window the proposal's caption (quote, then
/// summary) covers the whole clip. With no caption either the clip has no
/// cues.
pub fn build_cues(
    window: &ClipWindow,
    segments: &[TranscriptSegment],
    proposal: &ClipProposal,
) -> Vec<SubtitleCue> {
    let duration = window.duration();

    let cues: Vec<SubtitleCue> = segments
        .iter()
        .filter(|seg| seg.overlaps(window.start, window.end))
        .filter_map(|seg| {
            let text = seg.text.trim();
            if text.is_empty() {
                return None;
            }
            let start = (seg.start - window.start).max(0.0);
            let end = (seg.end - window.start).min(duration);
            Some(SubtitleCue::new(start, end, text))
        })
        .collect();

    if !cues.is_empty() {
        return cues;
    }

    match proposal.caption_text() {
        Some(caption) => {
            debug!(clip_index = window.index, "No speech in clip, using caption");
            vec![SubtitleCue::new(0.0, duration, caption)]
        }
        None => Vec::new(),
    }
}

/// [`select_window`] followed by [`build_cues`].
pub fn select_clip(
    index: usize,
    proposal: &ClipProposal,
    segments: &[TranscriptSegment],
    max_duration: f64,
    source_duration: Option<f64>,
) -> Result<SelectedClip, SkipReason> {
    let window = select_window(index, proposal, max_duration, source_duration)?;
    let cues = build_cues(&window, segments, proposal);
    Ok(SelectedClip { window, cues })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(start: f64, end: f64) -> ClipProposal {
        ClipProposal::new(start, end, "summary")
    }

    #[test]
    fn test_clamps_to_max_duration() {
        let window = select_window(1, &proposal(0.0, 30.0), 15.0, None).unwrap();
        assert_eq!(window.duration(), 15.0);
        assert_eq!(window.end, 15.0);
    }

    #[test]
    fn test_short_proposal_untouched() {
        let window = select_window(2, &proposal(3.0, 10.0), 15.0, None).unwrap();
        assert_eq!((window.start, window.end), (3.0, 10.0));
        assert_eq!(window.index, 2);
    }

    #[test]
    fn test_missing_timestamps_skipped() {
        let mut p = proposal(0.0, 10.0);
        p.end_time = None;
        assert_eq!(select_window(1, &p, 15.0, None), Err(SkipReason::MissingTimestamps));

        let mut p = proposal(0.0, 10.0);
        p.start_time = None;
        assert_eq!(select_window(1, &p, 15.0, None), Err(SkipReason::MissingTimestamps));
    }

    #[test]
    fn test_invalid_ranges_skipped() {
        assert!(matches!(
            select_window(1, &proposal(-1.0, 5.0), 15.0, None),
            Err(SkipReason::InvalidStart(_))
        ));
        assert!(matches!(
            select_window(1, &proposal(f64::NAN, 5.0), 15.0, None),
            Err(SkipReason::InvalidStart(_))
        ));
        assert!(matches!(
            select_window(1, &proposal(8.0, 8.0), 15.0, None),
            Err(SkipReason::EmptyRange { .. })
        ));
        assert!(matches!(
            select_window(1, &proposal(8.0, 2.0), 15.0, None),
            Err(SkipReason::EmptyRange { .. })
        ));
    }

    #[test]
    fn test_cues_relative_to_clip() {
        let segments = vec![
            TranscriptSegment::new(0.0, 5.0, "hello"),
            TranscriptSegment::new(5.0, 12.0, "world"),
        ];
        let selected = select_clip(1, &proposal(3.0, 10.0), &segments, 15.0, None).unwrap();
        assert_eq!(
            selected.cues,
            vec![
                SubtitleCue::new(0.0, 2.0, "hello"),
                SubtitleCue::new(2.0, 7.0, "world"),
            ]
        );
    }

    #[test]
    fn test_cues_within_clip_bounds() {
        let segments = vec![
            TranscriptSegment::new(0.0, 40.0, " long monologue "),
            TranscriptSegment::new(18.0, 19.0, "inside"),
            TranscriptSegment::new(25.0, 26.0, "after"),
            TranscriptSegment::new(9.0, 10.0, "touching start"),
        ];
        let selected = select_clip(1, &proposal(10.0, 40.0), &segments, 15.0, None).unwrap();
        let duration = selected.window.duration();
        assert_eq!(duration, 15.0);
        assert_eq!(selected.cues.len(), 2);
        for cue in &selected.cues {
            assert!(cue.start >= 0.0 && cue.end <= duration);
        }
        assert_eq!(selected.cues[0].text, "long monologue");
    }

    #[test]
    fn test_empty_transcript_falls_back_to_summary() {
        let p = ClipProposal::new(0.0, 10.0, "Great moment");
        let selected = select_clip(1, &p, &[], 15.0, None).unwrap();
        assert_eq!(selected.cues, vec![SubtitleCue::new(0.0, 10.0, "Great moment")]);
    }

    #[test]
    fn test_quote_preferred_for_fallback() {
        let p = ClipProposal::new(0.0, 10.0, "Great moment").with_quote("Never give up");
        let selected = select_clip(1, &p, &[], 15.0, None).unwrap();
        assert_eq!(selected.cues[0].text, "Never give up");
    }

    #[test]
    fn test_no_caption_no_cues() {
        let p = ClipProposal::new(0.0, 10.0, "  ");
        let selected = select_clip(1, &p, &[], 15.0, None).unwrap();
        assert!(selected.cues.is_empty());
    }

    #[test]
    fn test_end_clamped_to_source() {
        let window = select_window(1, &proposal(50.0, 70.0), 15.0, Some(58.5)).unwrap();
        assert_eq!((window.start, window.end), (50.0, 58.5));
    }

    #[test]
    fn test_start_past_source_skipped() {
        assert_eq!(
            select_window(1, &proposal(100.0, 110.0), 15.0, Some(60.0)),
            Err(SkipReason::BeyondSource { start: 100.0, duration: 60.0 })
        );
        assert!(select_window(1, &proposal(60.0, 65.0), 15.0, Some(60.0)).is_err());
    }

    #[test]
    fn test_unknown_source_duration_ignored() {
        let window = select_window(1, &proposal(100.0, 110.0), 15.0, Some(0.0)).unwrap();
        assert_eq!(window.end, 110.0);
    }

    #[test]
    fn test_fallback_cue_fits_truncated_clip() {
        let p = ClipProposal::new(55.0, 70.0, "Great moment");
        let selected = select_clip(1, &p, &[], 15.0, Some(60.0)).unwrap();
        assert_eq!(selected.cues, vec![SubtitleCue::new(0.0, 5.0, "Great moment")]);
    }
}

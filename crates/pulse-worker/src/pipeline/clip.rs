use std::path::Path;

use tracing::{info, warn};

use pulse_media::{ClipRenderPlan, ClipRenderer, SubtitleStyle, SubtitleTrack, VideoSource};
use pulse_models::{ClipFailure, ClipProposal, ClipStage, RenderedClip, TranscriptSegment};

use super::reframe::Reframer;
use crate::selector::{select_clip, SkipReason};

/// Result of one proposal.
#[derive(Debug)]
pub enum ClipOutcome {
    Rendered(RenderedClip),
    Skipped(SkipReason),
    Failed(ClipFailure),
}

/// Run-wide inputs shared by every clip.
pub struct ClipContext<'a> {
    pub renderer: &'a dyn ClipRenderer,
    pub segments: &'a [TranscriptSegment],
    pub subtitle_style: &'a SubtitleStyle,
    pub use_subtitles: bool,
    pub max_duration: f64,
    pub output_dir: &'a Path,
}

/// Select, reframe, subtitle and render proposal number `index` (1-based).
pub async fn process_single_clip(
    ctx: &ClipContext<'_>,
    reframer: &mut Reframer<'_>,
    source: &mut dyn VideoSource,
    index: usize,
    proposal: &ClipProposal,
) -> ClipOutcome {
    let source_duration = Some(source.info().duration);
    let selected = match select_clip(index, proposal, ctx.segments, ctx.max_duration, source_duration) {
        Ok(selected) => selected,
        Err(reason) => {
            warn!(clip_index = index, reason = %reason, "Skipping proposal");
            return ClipOutcome::Skipped(reason);
        }
    };
    let window = selected.window;

    info!(
        clip_index = index,
        start = window.start,
        end = window.end,
        cues = selected.cues.len(),
        "Starting clip processing"
    );

    let transform = match reframer.transform_for(source, &window).await {
        Ok(transform) => transform,
        Err(e) => {
            return ClipOutcome::Failed(ClipFailure {
                index,
                stage: ClipStage::Reframe,
                message: e.to_string(),
            })
        }
    };

    let subtitles = (ctx.use_subtitles && !selected.cues.is_empty())
        .then(|| SubtitleTrack::new(selected.cues, ctx.subtitle_style.clone()));
    let cue_count = subtitles.as_ref().map_or(0, |track| track.cues().len());

    let plan = ClipRenderPlan {
        source: source.path().to_path_buf(),
        output: ctx.output_dir.join(window.output_filename()),
        window,
        transform,
        subtitles,
    };

    match ctx.renderer.render(&plan).await {
        Ok(()) => {
            info!(
                clip_index = index,
                path = %plan.output.display(),
                cropped = plan.transform.is_crop(),
                "Clip rendered"
            );
            ClipOutcome::Rendered(RenderedClip {
                index,
                path: plan.output,
                window,
                cue_count,
                proposal: proposal.clone(),
            })
        }
        Err(e) => ClipOutcome::Failed(ClipFailure {
            index,
            stage: e.stage,
            message: e.source.to_string(),
        }),
    }
}

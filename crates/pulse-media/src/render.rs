//! Single-pass clip rendering: cut, reframe, subtitle and encode.
//!
//! The whole clip goes through one FFmpeg invocation (input seek + duration,
//! one filter chain, H.264/AAC encode). Each step that can fail on its own is
//! still reported with the [`ClipStage`] it belongs to.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use pulse_models::{ClipStage, ClipWindow, EncodingConfig};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaError;
use crate::geometry::FrameTransform;
use crate::subtitles::SubtitleTrack;

/// A clip render failure, tagged with the stage it happened in.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct RenderError {
    pub stage: ClipStage,
    #[source]
    pub source: MediaError,
}

impl RenderError {
    pub fn new(stage: ClipStage, source: MediaError) -> Self {
        Self { stage, source }
    }
}

/// Everything needed to produce one output file.
#[derive(Debug, Clone)]
pub struct ClipRenderPlan {
    pub source: PathBuf,
    pub window: ClipWindow,
    pub transform: FrameTransform,
    /// Subtitles to burn in; `None` when subtitles are off or empty
    pub subtitles: Option<SubtitleTrack>,
    pub output: PathBuf,
}

impl ClipRenderPlan {
    /// Reframe filter followed by any subtitle draws.
    fn build_filter(&self, scratch: &std::path::Path) -> Result<String, RenderError> {
        let mut filter = self.transform.to_filter();

        if let Some(track) = self.subtitles.as_ref().filter(|t| !t.is_empty()) {
            let (width, height) = self.transform.output_size();
            let overlay = track
                .write_filter(scratch, width, height)
                .map_err(|e| RenderError::new(ClipStage::Subtitle, e))?;
            if let Some(overlay) = overlay {
                filter.push(',');
                filter.push_str(&overlay);
            }
        }

        Ok(filter)
    }
}

/// Turns a render plan into an encoded file.
#[async_trait]
pub trait ClipRenderer: Send + Sync {
    async fn render(&self, plan: &ClipRenderPlan) -> Result<(), RenderError>;
}

/// [`ClipRenderer`] that shells out to FFmpeg.
#[derive(Debug, Clone, Default)]
pub struct FfmpegClipRenderer {
    runner: FfmpegRunner,
    encoding: EncodingConfig,
}

impl FfmpegClipRenderer {
    pub fn new(runner: FfmpegRunner, encoding: EncodingConfig) -> Self {
        Self { runner, encoding }
    }
}

#[async_trait]
impl ClipRenderer for FfmpegClipRenderer {
    async fn render(&self, plan: &ClipRenderPlan) -> Result<(), RenderError> {
        let window = plan.window;
        let duration = window.duration();

        // Cut
        if !window.start.is_finite() || window.start < 0.0 || !duration.is_finite() || duration <= 0.0 {
            return Err(RenderError::new(
                ClipStage::Cut,
                MediaError::invalid_range(format!(
                    "[{:.3}, {:.3}] is not a usable clip range",
                    window.start, window.end
                )),
            ));
        }

        // Reframe + subtitle. The scratch dir holds the drawtext line files and
        // must outlive the encode.
        let scratch = tempfile::tempdir()
            .map_err(|e| RenderError::new(ClipStage::Subtitle, MediaError::Io(e)))?;
        let filter = plan.build_filter(scratch.path())?;

        // Encode
        if let Some(parent) = plan.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RenderError::new(ClipStage::Encode, MediaError::Io(e)))?;
        }

        let cmd = FfmpegCommand::new(&plan.source, &plan.output)
            .seek(window.start)
            .duration(duration)
            .output_args(["-map", "0:v:0", "-map", "0:a:0?"])
            .video_filter(filter)
            .encoding(&self.encoding)
            .faststart();

        info!(
            clip_index = window.index,
            start = window.start,
            duration,
            output = %plan.output.display(),
            crop = plan.transform.is_crop(),
            subtitles = plan.subtitles.as_ref().map_or(0, |t| t.cues().len()),
            "Rendering clip"
        );

        let index = window.index;
        self.runner
            .run_with_progress(&cmd, move |progress| {
                debug!(
                    clip_index = index,
                    percent = progress.percentage(duration),
                    speed = progress.speed,
                    "Encode progress"
                );
            })
            .await
            .map_err(|e| RenderError::new(ClipStage::Encode, e))?;

        if !plan.output.exists() {
            return Err(RenderError::new(
                ClipStage::Encode,
                MediaError::FileNotFound(plan.output.clone()),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitles::SubtitleStyle;
    use pulse_models::SubtitleCue;

    fn plan(subtitles: Option<SubtitleTrack>) -> ClipRenderPlan {
        ClipRenderPlan {
            source: PathBuf::from("in.mp4"),
            window: ClipWindow::new(1, 3.0, 10.0),
            transform: FrameTransform::letterbox(1920, 1080).unwrap(),
            subtitles,
            output: PathBuf::from("out/clip_1_3.mp4"),
        }
    }

    #[test]
    fn test_filter_without_subtitles() {
        let dir = tempfile::tempdir().unwrap();
        let filter = plan(None).build_filter(dir.path()).unwrap();
        assert_eq!(filter, "scale=1080:608,pad=1080:1920:0:656:color=black,setsar=1");
    }

    #[test]
    fn test_filter_appends_subtitles_after_reframe() {
        let dir = tempfile::tempdir().unwrap();
        let track = SubtitleTrack::new(
            vec![SubtitleCue::new(0.0, 7.0, "hello")],
            SubtitleStyle::default(),
        );
        let filter = plan(Some(track)).build_filter(dir.path()).unwrap();
        assert!(filter.starts_with("scale=1080:608,pad="));
        assert!(filter.contains(",drawtext=textfile="));
        // 1920 canvas: font 76
        assert!(filter.contains("fontsize=76"));
    }

    #[tokio::test]
    async fn test_invalid_window_fails_in_cut() {
        let mut bad = plan(None);
        bad.window = ClipWindow::new(1, 5.0, 5.0);
        let err = FfmpegClipRenderer::default().render(&bad).await.unwrap_err();
        assert_eq!(err.stage, ClipStage::Cut);
    }
}

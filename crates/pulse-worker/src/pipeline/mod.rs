//! Clip pipeline: one source video and a list of proposals in, one portrait
//! clip per valid proposal out.
//!
//! Clips are processed sequentially in input order against a single opened
//! source. A render failure is recorded against its clip; whether the run
//! carries on depends on the [`FailurePolicy`].

pub mod clip;
pub mod reframe;

use std::path::Path;

use tracing::Instrument;

use pulse_media::{
    find_font_file, ClipRenderer, DetectorProvider, SourceOpener, SubtitleStyle, VideoSource, DEFAULT_FONT_PATHS,
};
use pulse_models::{ClipProposal, RunId, RunReport, TranscriptSegment};

use crate::config::{FailurePolicy, PipelineConfig};
use crate::error::WorkerError;
use crate::logging::RunLogger;

pub use clip::{process_single_clip, ClipContext, ClipOutcome};
pub use reframe::Reframer;

/// Orchestrates a run.
pub struct ClipPipeline {
    config: PipelineConfig,
    opener: Box<dyn SourceOpener>,
    renderer: Box<dyn ClipRenderer>,
    detectors: Option<Box<dyn DetectorProvider>>,
    subtitle_style: SubtitleStyle,
}

impl ClipPipeline {
    pub fn new(
        config: PipelineConfig,
        opener: Box<dyn SourceOpener>,
        renderer: Box<dyn ClipRenderer>,
    ) -> Self {
        let font = config
            .subtitle_font
            .clone()
            .or_else(|| find_font_file(DEFAULT_FONT_PATHS));
        let subtitle_style = match font {
            Some(font) => SubtitleStyle::default().with_font_file(font),
            None => SubtitleStyle::default(),
        };

        Self {
            config,
            opener,
            renderer,
            detectors: None,
            subtitle_style,
        }
    }

    /// Face detector used for face-tracked crops. Without one, face tracking
    /// degrades to center crops.
    pub fn with_detector_provider(mut self, provider: Box<dyn DetectorProvider>) -> Self {
        self.detectors = Some(provider);
        self
    }

    pub fn with_subtitle_style(mut self, style: SubtitleStyle) -> Self {
        self.subtitle_style = style;
        self
    }

    pub fn subtitle_style(&self) -> &SubtitleStyle {
        &self.subtitle_style
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process every proposal against `source_path`.
    ///
    /// Never returns an error: run-level problems end up in the report as a
    /// failed run, clip-level problems as skips and failures.
    pub async fn run(
        &self,
        source_path: &Path,
        segments: &[TranscriptSegment],
        proposals: &[ClipProposal],
    ) -> RunReport {
        let mut report = RunReport::new(RunId::new());
        let logger = RunLogger::new(&report.run_id, "clip_pipeline");
        let span = logger.create_span();

        self.run_inner(&mut report, &logger, source_path, segments, proposals)
            .instrument(span)
            .await;
        report
    }

    async fn run_inner(
        &self,
        report: &mut RunReport,
        logger: &RunLogger,
        source_path: &Path,
        segments: &[TranscriptSegment],
        proposals: &[ClipProposal],
    ) {
        if let Err(e) = self.config.validate() {
            logger.log_error(&e.to_string());
            report.fail(e.to_string());
            return;
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.config.output_dir).await {
            let e = WorkerError::from(e);
            logger.log_error(&format!(
                "Cannot create output directory {}: {}",
                self.config.output_dir.display(),
                e
            ));
            report.fail(e.to_string());
            return;
        }

        let mut source = match self.opener.open(source_path).await {
            Ok(source) => source,
            Err(e) => {
                let e = WorkerError::decode_failed(e.to_string());
                logger.log_error(&e.to_string());
                report.fail(e.to_string());
                return;
            }
        };

        report.start();
        logger.log_start(&format!(
            "{} proposals for {} ({}x{}, {:.1}s)",
            proposals.len(),
            source_path.display(),
            source.info().width,
            source.info().height,
            source.info().duration
        ));

        let aborted = self
            .process_clips(report, logger, source.as_mut(), segments, proposals)
            .await;

        if let Err(e) = source.close().await {
            logger.log_warning(&format!("Failed to close source: {}", e));
        }

        match aborted {
            Some(message) => {
                logger.log_error(&message);
                report.fail(message);
            }
            None => {
                report.complete();
                logger.log_completion(&format!(
                    "{} rendered, {} skipped, {} failed",
                    report.clips.len(),
                    report.skipped.len(),
                    report.failures.len()
                ));
            }
        }
    }

    /// Returns the abort message when the failure policy stopped the run.
    async fn process_clips(
        &self,
        report: &mut RunReport,
        logger: &RunLogger,
        source: &mut dyn VideoSource,
        segments: &[TranscriptSegment],
        proposals: &[ClipProposal],
    ) -> Option<String> {
        let ctx = ClipContext {
            renderer: self.renderer.as_ref(),
            segments,
            subtitle_style: &self.subtitle_style,
            use_subtitles: self.config.use_subtitles,
            max_duration: self.config.max_duration_secs(),
            output_dir: &self.config.output_dir,
        };
        let mut reframer = Reframer::new(self.config.crop_mode, self.detectors.as_deref());
        let total = proposals.len();

        for (i, proposal) in proposals.iter().enumerate() {
            let index = i + 1;
            match process_single_clip(&ctx, &mut reframer, source, index, proposal).await {
                ClipOutcome::Rendered(clip) => {
                    logger.log_progress(&format!("clip {}/{} -> {}", index, total, clip.path.display()));
                    report.record_clip(clip);
                }
                ClipOutcome::Skipped(_) => report.record_skip(index),
                ClipOutcome::Failed(failure) => {
                    logger.log_warning(&format!(
                        "clip {} failed in {} stage: {}",
                        index, failure.stage, failure.message
                    ));
                    let message = format!(
                        "Aborted after clip {} failed in {} stage: {}",
                        index, failure.stage, failure.message
                    );
                    report.record_failure(failure);

                    if self.config.failure_policy == FailurePolicy::AbortRemaining {
                        return Some(message);
                    }
                }
            }
        }

        None
    }
}

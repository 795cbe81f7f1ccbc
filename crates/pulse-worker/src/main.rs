//! `pulse-clipper`: cut a long video into captioned portrait clips.
//!
//! Usage: `pulse-clipper <video>`. Settings come from the environment (see
//! [`PipelineConfig::from_env`]); the run report is printed to stdout as JSON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use tracing::{error, info, warn};

use pulse_media::{
    check_ffmpeg, check_ffprobe, ffmpeg_has_fontconfig, FfmpegClipRenderer, FfmpegRunner,
    FfmpegSourceOpener, YuNetProvider,
};
use pulse_models::{ClipProposal, CropMode, RunState, TranscriptSegment};
use pulse_worker::{
    init_tracing, load_transcript_file, select_or_placeholder, ClipPipeline, GeminiClient,
    PipelineConfig, Transcriber, WhisperCli,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_tracing();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let source = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => bail!("usage: pulse-clipper <video>"),
    };

    let config = PipelineConfig::from_env();
    config.validate()?;
    info!(
        source = %source.display(),
        max_clip_duration = config.max_clip_duration,
        crop_mode = %config.crop_mode,
        subtitles = config.use_subtitles,
        failure_policy = %config.failure_policy,
        "Starting pulse-clipper"
    );

    check_ffmpeg().context("ffmpeg is required")?;
    check_ffprobe().context("ffprobe is required")?;

    let segments = transcript_for(&source, &config).await?;
    let proposals = proposals_for(&segments, &config).await?;

    let mut runner = FfmpegRunner::new();
    if let Some(secs) = config.encode_timeout_secs {
        runner = runner.with_timeout(secs);
    }

    let renderer = FfmpegClipRenderer::new(runner.clone(), config.encoding.clone());
    let opener = FfmpegSourceOpener::new(runner);
    let mut pipeline = ClipPipeline::new(config.clone(), Box::new(opener), Box::new(renderer));
    if config.crop_mode == CropMode::FaceTracking {
        pipeline = pipeline.with_detector_provider(Box::new(YuNetProvider::new(config.yunet_model.clone())));
    }

    if config.use_subtitles
        && pipeline.subtitle_style().font_file.is_none()
        && !ffmpeg_has_fontconfig().await?
    {
        bail!("ffmpeg was built without fontconfig and no font file was found; set PULSE_SUBTITLE_FONT to a .ttf file");
    }

    let report = pipeline.run(&source, &segments, &proposals).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(match report.state {
        RunState::Completed => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

/// `PULSE_TRANSCRIPT_FILE` when set, otherwise whisper.
async fn transcript_for(source: &Path, config: &PipelineConfig) -> anyhow::Result<Vec<TranscriptSegment>> {
    if let Some(path) = env_path("PULSE_TRANSCRIPT_FILE") {
        info!(path = %path.display(), "Loading transcript file");
        return load_transcript_file(&path)
            .await
            .with_context(|| format!("reading transcript {}", path.display()));
    }

    let whisper = WhisperCli::new(config.whisper_model.clone());
    Ok(whisper.transcribe(source, config.transcription_mode).await?)
}

/// `PULSE_PROPOSALS_FILE` when set, otherwise Gemini. Without an API key the
/// placeholder proposal is used.
async fn proposals_for(
    segments: &[TranscriptSegment],
    config: &PipelineConfig,
) -> anyhow::Result<Vec<ClipProposal>> {
    if let Some(path) = env_path("PULSE_PROPOSALS_FILE") {
        info!(path = %path.display(), "Loading proposals file");
        let raw = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading proposals {}", path.display()))?;
        return serde_json::from_slice(&raw)
            .with_context(|| format!("parsing proposals {}", path.display()));
    }

    match config.gemini_api_key.as_deref().map(GeminiClient::new) {
        Some(Ok(client)) => Ok(select_or_placeholder(&client, segments, config.max_clip_duration).await),
        Some(Err(e)) => {
            warn!(error = %e, "Gemini client unavailable, using placeholder proposal");
            Ok(vec![ClipProposal::placeholder()])
        }
        None => {
            warn!("GEMINI_API_KEY not set, using placeholder proposal");
            Ok(vec![ClipProposal::placeholder()])
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

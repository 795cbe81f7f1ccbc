//! Decoded access to the source video.

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_video, VideoInfo};

/// An opened source video.
///
/// One handle per run, owned exclusively by the pipeline and closed
/// explicitly once every clip is done or the run aborts.
#[async_trait]
pub trait VideoSource: Send {
    /// Path of the underlying file.
    fn path(&self) -> &Path;

    /// Stream metadata captured when the source was opened.
    fn info(&self) -> &VideoInfo;

    /// Decode the frame at `timestamp` seconds (source timeline).
    async fn frame_at(&mut self, timestamp: f64) -> MediaResult<RgbImage>;

    /// Release the source. Further frame reads fail.
    async fn close(&mut self) -> MediaResult<()>;
}

/// Opens sources for a run. Failing here fails the whole run.
#[async_trait]
pub trait SourceOpener: Send + Sync {
    async fn open(&self, path: &Path) -> MediaResult<Box<dyn VideoSource>>;
}

/// Opens [`FfmpegSource`]s.
#[derive(Debug, Clone, Default)]
pub struct FfmpegSourceOpener {
    runner: FfmpegRunner,
}

impl FfmpegSourceOpener {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl SourceOpener for FfmpegSourceOpener {
    async fn open(&self, path: &Path) -> MediaResult<Box<dyn VideoSource>> {
        let source = FfmpegSource::open(path, self.runner.clone()).await?;
        Ok(Box::new(source))
    }
}

/// [`VideoSource`] backed by ffprobe and single-frame FFmpeg grabs.
#[derive(Debug)]
pub struct FfmpegSource {
    path: PathBuf,
    info: VideoInfo,
    runner: FfmpegRunner,
    closed: bool,
}

impl FfmpegSource {
    /// Probe `path` and open it. Fails when the file cannot be decoded.
    pub async fn open(path: impl AsRef<Path>, runner: FfmpegRunner) -> MediaResult<Self> {
        let path = path.as_ref().to_path_buf();
        let info = probe_video(&path).await?;

        info!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            duration = info.duration,
            fps = info.fps,
            "Opened source video"
        );

        Ok(Self {
            path,
            info,
            runner,
            closed: false,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl VideoSource for FfmpegSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn info(&self) -> &VideoInfo {
        &self.info
    }

    async fn frame_at(&mut self, timestamp: f64) -> MediaResult<RgbImage> {
        if self.closed {
            return Err(MediaError::internal("Source video already closed"));
        }
        if !timestamp.is_finite() || timestamp < 0.0 {
            return Err(MediaError::invalid_range(format!(
                "Cannot read a frame at {}s",
                timestamp
            )));
        }

        let cmd = FfmpegCommand::new(&self.path, "frame.png")
            .seek(timestamp)
            .png_frame_to_stdout();

        let bytes = self.runner.capture(&cmd).await?;
        let frame = image::load_from_memory_with_format(&bytes, ImageFormat::Png)?.to_rgb8();

        debug!(
            timestamp,
            width = frame.width(),
            height = frame.height(),
            "Decoded source frame"
        );
        Ok(frame)
    }

    async fn close(&mut self) -> MediaResult<()> {
        if !self.closed {
            debug!(path = %self.path.display(), "Closing source video");
            self.closed = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_fails() {
        let result = tokio_test::block_on(FfmpegSource::open(
            "/nonexistent/pulse/source.mp4",
            FfmpegRunner::new(),
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_opener_propagates_failure() {
        let opener = FfmpegSourceOpener::default();
        let result = tokio_test::block_on(opener.open(Path::new("/nonexistent/pulse/source.mp4")));
        assert!(result.is_err());
    }
}

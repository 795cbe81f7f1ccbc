#![deny(unreachable_patterns)]
//! Media layer of the Pulse clip pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner with `-progress pipe:2` parsing
//! - FFprobe metadata and single-frame decoding of the source video
//! - The geometry engine (letterbox placement, 9:16 crop windows, face-center averaging)
//! - Face detection behind a trait, with an optional OpenCV YuNet backend
//! - The subtitle renderer (wrapping, layout, first-cue-wins drawtext chains)
//! - Single-pass clip rendering

pub mod command;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod probe;
pub mod progress;
pub mod render;
pub mod source;
pub mod subtitles;

pub use command::{check_ffmpeg, check_ffprobe, ffmpeg_has_fontconfig, FfmpegCommand, FfmpegRunner};
pub use detection::{
    sample_face_center, DetectorProvider, FaceDetector, FaceSampling, YuNetDetector, YuNetProvider,
};
pub use error::{MediaError, MediaResult};
pub use geometry::{
    center_crop, compute_letterbox, face_tracked_crop, BoundingBox, CropWindow, FrameTransform,
    LetterboxPlacement,
};
pub use probe::{probe_video, VideoInfo};
pub use progress::FfmpegProgress;
pub use render::{ClipRenderPlan, ClipRenderer, FfmpegClipRenderer, RenderError};
pub use source::{FfmpegSource, FfmpegSourceOpener, SourceOpener, VideoSource};
pub use subtitles::{find_font_file, SubtitleStyle, SubtitleTrack, DEFAULT_FONT_PATHS};

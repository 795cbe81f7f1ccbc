//! Shared data models for the Pulse clip pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Transcript segments and AI clip proposals
//! - Clip-relative subtitle cues
//! - Crop modes and the portrait output canvas
//! - Encoding configuration
//! - Rendered clips and run reports

pub mod clip;
pub mod crop_mode;
pub mod cue;
pub mod encoding;
pub mod proposal;
pub mod run;
pub mod transcript;

// Re-export common types
pub use clip::{ClipWindow, RenderedClip};
pub use crop_mode::{CropMode, CropModeParseError, OUTPUT_HEIGHT, OUTPUT_WIDTH};
pub use cue::SubtitleCue;
pub use encoding::EncodingConfig;
pub use proposal::ClipProposal;
pub use run::{ClipFailure, ClipStage, RunId, RunReport, RunState};
pub use transcript::TranscriptSegment;

//! Subtitle renderer.
//!
//! Per frame the rule is simple: the first cue in list order whose
//! `[start, end]` contains the frame time is drawn, wrapped to 25 characters
//! per line, white with a black outline, centered on 80% of the frame height.
//! [`SubtitleTrack::layout_at`] answers that question for a single frame;
//! [`SubtitleTrack::write_filter`] expresses the same answer for the whole
//! clip as a drawtext chain, so the encoder applies it in one pass.

pub mod layout;
pub mod track;
pub mod wrap;

pub use layout::{find_font_file, layout_text, SubtitleStyle, TextBlock, TextLine, DEFAULT_FONT_PATHS};
pub use track::{SubtitleTrack, TimeWindow};
pub use wrap::{wrap_text, WRAP_WIDTH};

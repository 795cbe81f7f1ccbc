//! Placement of wrapped subtitle lines on a frame.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::wrap::{wrap_text, WRAP_WIDTH};

/// Subtitle appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleStyle {
    /// Font size as a fraction of the frame height
    pub font_scale: f64,
    /// Vertical gap between lines in pixels
    pub line_spacing: u32,
    /// Vertical center of the text block as a fraction of the frame height
    pub anchor_y: f64,
    /// Characters per line
    pub wrap_width: usize,
    pub fill_color: String,
    pub stroke_color: String,
    /// Font file; the compositor's default sans font when unset
    pub font_file: Option<PathBuf>,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_scale: 0.04,
            line_spacing: 10,
            anchor_y: 0.80,
            wrap_width: WRAP_WIDTH,
            fill_color: "white".to_string(),
            stroke_color: "black".to_string(),
            font_file: None,
        }
    }
}

impl SubtitleStyle {
    pub fn with_font_file(mut self, font_file: impl Into<PathBuf>) -> Self {
        self.font_file = Some(font_file.into());
        self
    }

    /// Font size in pixels for a frame of `frame_height`.
    pub fn font_size(&self, frame_height: u32) -> u32 {
        ((self.font_scale * frame_height as f64).floor() as u32).max(1)
    }

    /// Outline width in pixels for a given font size.
    pub fn stroke_width(&self, font_size: u32) -> u32 {
        ((0.1 * font_size as f64).floor() as u32).max(2)
    }
}

/// Sans fonts tried when no font file is configured.
pub const DEFAULT_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
];

/// First existing font among `candidates`.
///
/// Without a font file drawtext resolves `font='Sans'` through fontconfig,
/// which not every FFmpeg build has.
pub fn find_font_file(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().map(Path::new).find(|p| p.is_file()).map(Path::to_path_buf)
}

/// Average glyph advance as a fraction of the font size.
const AVERAGE_ADVANCE: f64 = 0.5;

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// Top edge in pixels
    pub y: u32,
    pub height: u32,
    /// Estimated rendered width; the compositor centers on the measured width
    pub estimated_width: u32,
    /// Estimated left edge for a centered line
    pub estimated_x: i64,
}

/// All lines for one cue on one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    pub font_size: u32,
    pub stroke_width: u32,
}

impl TextBlock {
    /// Total height from the top of the first line to the bottom of the last.
    pub fn height(&self, line_spacing: u32) -> u32 {
        let n = self.lines.len() as u32;
        if n == 0 {
            return 0;
        }
        n * self.font_size + (n - 1) * line_spacing
    }
}

/// Wrap and position `text` on a `frame_width x frame_height` frame.
///
/// Returns `None` when the text wraps to nothing.
pub fn layout_text(
    text: &str,
    frame_width: u32,
    frame_height: u32,
    style: &SubtitleStyle,
) -> Option<TextBlock> {
    let wrapped = wrap_text(text, style.wrap_width);
    if wrapped.is_empty() {
        return None;
    }

    let font_size = style.font_size(frame_height);
    let line_height = font_size;
    let n = wrapped.len() as u32;
    let block_height = n * line_height + (n - 1) * style.line_spacing;

    let anchor = style.anchor_y * frame_height as f64;
    let top = (anchor - block_height as f64 / 2.0).floor().max(0.0) as u32;

    let lines = wrapped
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let estimated_width =
                (text.chars().count() as f64 * font_size as f64 * AVERAGE_ADVANCE).round() as u32;
            TextLine {
                y: top + i as u32 * (line_height + style.line_spacing),
                height: line_height,
                estimated_width,
                estimated_x: (frame_width as i64 - estimated_width as i64) / 2,
                text,
            }
        })
        .collect();

    Some(TextBlock {
        lines,
        font_size,
        stroke_width: style.stroke_width(font_size),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_for_portrait_canvas() {
        let style = SubtitleStyle::default();
        assert_eq!(style.font_size(1920), 76);
        assert_eq!(style.stroke_width(76), 7);
        assert_eq!(style.stroke_width(12), 2);
    }

    #[test]
    fn test_single_line_centered_on_anchor() {
        let block = layout_text("hello", 1080, 1920, &SubtitleStyle::default()).unwrap();
        assert_eq!(block.lines.len(), 1);
        // 0.8 * 1920 = 1536, minus half of 76
        assert_eq!(block.lines[0].y, 1498);
        let line = &block.lines[0];
        assert_eq!(line.estimated_x * 2 + line.estimated_width as i64, 1080);
    }

    #[test]
    fn test_lines_stacked_with_spacing() {
        let style = SubtitleStyle::default();
        let block = layout_text(
            "the quick brown fox jumps over the lazy dog",
            1080,
            1920,
            &style,
        )
        .unwrap();
        assert_eq!(block.lines.len(), 2);
        assert_eq!(block.height(style.line_spacing), 76 * 2 + 10);
        assert_eq!(block.lines[1].y - block.lines[0].y, 86);
        // Block centered on 1536
        assert_eq!(block.lines[0].y, 1536 - 81);
    }

    #[test]
    fn test_blank_text() {
        assert!(layout_text("  ", 1080, 1920, &SubtitleStyle::default()).is_none());
    }

    #[test]
    fn test_find_font_file() {
        let dir = tempfile::tempdir().unwrap();
        let font = dir.path().join("Sans.ttf");
        std::fs::write(&font, b"").unwrap();
        let font_str = font.to_string_lossy().to_string();

        assert_eq!(find_font_file(&["/nonexistent/a.ttf", &font_str]), Some(font.clone()));
        assert_eq!(find_font_file(&["/nonexistent/a.ttf"]), None);
    }
}

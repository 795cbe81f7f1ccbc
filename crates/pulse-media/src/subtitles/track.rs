//! Cue lookup and the drawtext filter that burns cues into a clip.

use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

use pulse_models::SubtitleCue;

use super::layout::{layout_text, SubtitleStyle, TextBlock};
use crate::error::MediaResult;

/// A stretch of clip time, with explicit endpoint inclusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
    pub start_closed: bool,
    pub end_closed: bool,
}

impl TimeWindow {
    pub fn closed(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            start_closed: true,
            end_closed: true,
        }
    }

    pub fn contains(&self, t: f64) -> bool {
        let after_start = if self.start_closed { t >= self.start } else { t > self.start };
        let before_end = if self.end_closed { t <= self.end } else { t < self.end };
        after_start && before_end
    }

    fn is_empty(&self) -> bool {
        self.start > self.end
            || (self.start == self.end && !(self.start_closed && self.end_closed))
    }

    /// This window minus the closed interval `[start, end]`.
    fn subtract(&self, start: f64, end: f64) -> Vec<TimeWindow> {
        let disjoint = end < self.start
            || (end == self.start && !self.start_closed)
            || start > self.end
            || (start == self.end && !self.end_closed);
        if disjoint {
            return vec![*self];
        }

        let mut parts = Vec::with_capacity(2);
        let left = TimeWindow {
            start: self.start,
            end: start,
            start_closed: self.start_closed,
            end_closed: false,
        };
        if !left.is_empty() {
            parts.push(left);
        }
        let right = TimeWindow {
            start: end,
            end: self.end,
            start_closed: false,
            end_closed: self.end_closed,
        };
        if !right.is_empty() {
            parts.push(right);
        }
        parts
    }

    /// FFmpeg expression that is non-zero inside the window.
    fn to_expr(&self) -> String {
        format!(
            "{}(t,{:.3})*{}(t,{:.3})",
            if self.start_closed { "gte" } else { "gt" },
            self.start,
            if self.end_closed { "lte" } else { "lt" },
            self.end
        )
    }
}

/// A clip's cue list with its styling.
#[derive(Debug, Clone, Default)]
pub struct SubtitleTrack {
    cues: Vec<SubtitleCue>,
    style: SubtitleStyle,
}

impl SubtitleTrack {
    pub fn new(cues: Vec<SubtitleCue>, style: SubtitleStyle) -> Self {
        Self { cues, style }
    }

    pub fn cues(&self) -> &[SubtitleCue] {
        &self.cues
    }

    pub fn style(&self) -> &SubtitleStyle {
        &self.style
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// First cue in list order covering clip time `t`.
    pub fn active_cue(&self, t: f64) -> Option<&SubtitleCue> {
        self.cues.iter().find(|cue| cue.is_active_at(t))
    }

    /// Text overlay for the frame at clip time `t`; `None` leaves the frame
    /// untouched.
    pub fn layout_at(&self, t: f64, frame_width: u32, frame_height: u32) -> Option<TextBlock> {
        let cue = self.active_cue(t)?;
        layout_text(&cue.text, frame_width, frame_height, &self.style)
    }

    /// For each cue, the times at which it is the active cue: its own interval
    /// minus every earlier cue's interval.
    pub fn exclusive_windows(&self) -> Vec<Vec<TimeWindow>> {
        self.cues
            .iter()
            .enumerate()
            .map(|(i, cue)| {
                let mut windows = vec![TimeWindow::closed(cue.start, cue.end)];
                for earlier in &self.cues[..i] {
                    windows = windows
                        .iter()
                        .flat_map(|w| w.subtract(earlier.start, earlier.end))
                        .collect();
                }
                windows.retain(|w| !w.is_empty());
                windows
            })
            .collect()
    }

    /// Build the drawtext filter chain for a `frame_width x frame_height`
    /// frame, writing each line's text to a file under `dir`.
    ///
    /// Line text goes through `textfile` with expansion off, so it is never
    /// parsed by FFmpeg. Returns `None` when no cue produces visible text.
    pub fn write_filter(
        &self,
        dir: &Path,
        frame_width: u32,
        frame_height: u32,
    ) -> MediaResult<Option<String>> {
        let mut filters = Vec::new();

        for (i, (cue, windows)) in self.cues.iter().zip(self.exclusive_windows()).enumerate() {
            if windows.is_empty() {
                debug!(cue = i, "Cue fully shadowed by earlier cues");
                continue;
            }
            let Some(block) = layout_text(&cue.text, frame_width, frame_height, &self.style) else {
                continue;
            };

            let enable = windows
                .iter()
                .map(TimeWindow::to_expr)
                .collect::<Vec<_>>()
                .join("+");

            for (j, line) in block.lines.iter().enumerate() {
                let text_path = dir.join(format!("cue_{}_{}.txt", i, j));
                std::fs::write(&text_path, &line.text)?;

                let mut filter = format!(
                    "drawtext=textfile='{}':expansion=none",
                    escape_filter_path(&text_path)
                );
                match &self.style.font_file {
                    Some(font) => {
                        let _ = write!(filter, ":fontfile='{}'", escape_filter_path(font));
                    }
                    None => filter.push_str(":font='Sans'"),
                }
                let _ = write!(
                    filter,
                    ":fontsize={}:fontcolor={}:borderw={}:bordercolor={}:x=(w-text_w)/2:y={}:enable='{}'",
                    block.font_size,
                    self.style.fill_color,
                    block.stroke_width,
                    self.style.stroke_color,
                    line.y,
                    enable
                );
                filters.push(filter);
            }
        }

        if filters.is_empty() {
            return Ok(None);
        }
        debug!(cues = self.cues.len(), draws = filters.len(), "Built subtitle filter");
        Ok(Some(filters.join(",")))
    }
}

/// Escape a path for use inside a quoted filter option.
fn escape_filter_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let mut escaped = String::with_capacity(normalized.len() + 8);
    for ch in normalized.chars() {
        match ch {
            ':' => escaped.push_str("\\:"),
            '\'' => escaped.push_str("\\'"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

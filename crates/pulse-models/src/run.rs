//! Pipeline run state and reporting.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::RenderedClip;

/// Unique identifier for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of one processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    /// Idle → Running → Completed | Failed. A run that never started may
    /// also fail directly.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Idle, RunState::Running)
                | (RunState::Idle, RunState::Failed)
                | (RunState::Running, RunState::Completed)
                | (RunState::Running, RunState::Failed)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-clip processing stage, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClipStage {
    Select,
    Cut,
    Reframe,
    Subtitle,
    Encode,
}

impl ClipStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipStage::Select => "select",
            ClipStage::Cut => "cut",
            ClipStage::Reframe => "reframe",
            ClipStage::Subtitle => "subtitle",
            ClipStage::Encode => "encode",
        }
    }
}

impl fmt::Display for ClipStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A clip that failed while rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipFailure {
    pub index: usize,
    pub stage: ClipStage,
    pub message: String,
}

/// Outcome of a whole run: what was rendered, skipped and what failed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    pub run_id: RunId,
    pub state: RunState,
    /// Rendered clips in input order
    pub clips: Vec<RenderedClip>,
    /// 1-based indices of proposals skipped for invalid timestamps
    pub skipped: Vec<usize>,
    pub failures: Vec<ClipFailure>,
    /// Run-level error (source could not be opened, run aborted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new(RunId::new())
    }
}

impl RunReport {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            state: RunState::Idle,
            clips: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
            error: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Move to `next` if the transition is legal. Returns whether it happened.
    fn transition(&mut self, next: RunState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        if next == RunState::Running {
            self.started_at = Some(Utc::now());
        } else if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        true
    }

    pub fn start(&mut self) -> bool {
        self.transition(RunState::Running)
    }

    pub fn complete(&mut self) -> bool {
        self.transition(RunState::Completed)
    }

    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        self.error = Some(error.into());
        self.transition(RunState::Failed)
    }

    pub fn record_clip(&mut self, clip: RenderedClip) {
        self.clips.push(clip);
    }

    pub fn record_skip(&mut self, index: usize) {
        self.skipped.push(index);
    }

    pub fn record_failure(&mut self, failure: ClipFailure) {
        self.failures.push(failure);
    }

    /// Output files in input order.
    pub fn output_paths(&self) -> Vec<PathBuf> {
        self.clips.iter().map(|c| c.path.clone()).collect()
    }

    /// Completed, with no render failures.
    pub fn is_full_success(&self) -> bool {
        self.state == RunState::Completed && self.failures.is_empty()
    }

    /// Some clips rendered but at least one failed or the run aborted.
    pub fn is_partial(&self) -> bool {
        !self.clips.is_empty() && !self.is_full_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine() {
        let mut report = RunReport::default();
        assert_eq!(report.state, RunState::Idle);
        assert!(!report.complete());

        assert!(report.start());
        assert!(report.started_at.is_some());
        assert!(!report.start());

        assert!(report.complete());
        assert!(report.state.is_terminal());
        assert!(!report.fail("late"));
        assert_eq!(report.state, RunState::Completed);
    }

    #[test]
    fn test_fail_before_start() {
        let mut report = RunReport::default();
        assert!(report.fail("cannot open source"));
        assert_eq!(report.state, RunState::Failed);
        assert_eq!(report.error.as_deref(), Some("cannot open source"));
        assert!(!report.is_partial());
    }

    #[test]
    fn test_full_success_requires_no_failures() {
        let mut report = RunReport::default();
        report.start();
        report.record_failure(ClipFailure {
            index: 1,
            stage: ClipStage::Encode,
            message: "boom".into(),
        });
        report.complete();
        assert!(!report.is_full_success());
    }
}

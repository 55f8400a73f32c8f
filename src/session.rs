use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque task identifier issued by the backend when a repair starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSession {
    pub task_id: TaskId,
    pub repo_key: String,
    pub instance_id: String,
    pub repo_display_name: String,
}

impl TaskSession {
    /// Matches an event's task id against this session.
    pub fn owns(&self, task_id: &str) -> bool {
        self.task_id.as_str() == task_id
    }

    pub fn patch_file_name(&self) -> String {
        format!("{}_patch.diff", self.instance_id)
    }
}

/// Log lines already rendered for the active session, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct LogBuffer {
    lines: Vec<String>,
    seen: HashSet<String>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `line` and returns true when it has not been seen before.
    pub fn push(&mut self, line: &str) -> bool {
        if self.seen.contains(line) {
            return false;
        }
        self.seen.insert(line.to_string());
        self.lines.push(line.to_string());
        true
    }

    /// Merges a batch and returns only the newly recorded lines, in order.
    pub fn merge<'a, I>(&mut self, batch: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        batch
            .into_iter()
            .filter(|line| self.push(line))
            .cloned()
            .collect()
    }

    pub fn contains(&self, line: &str) -> bool {
        self.seen.contains(line)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.seen.clear();
    }
}

pub const INITIAL_STEP_LABEL: &str = "Initializing...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    pub percent: u8,
    pub step_label: String,
}

impl ProgressState {
    pub fn initial() -> Self {
        Self {
            percent: 0,
            step_label: INITIAL_STEP_LABEL.to_string(),
        }
    }

    pub fn new(raw_percent: f64, step_label: impl Into<String>) -> Self {
        Self {
            percent: clamp_percent(raw_percent),
            step_label: step_label.into(),
        }
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::initial()
    }
}

pub fn clamp_percent(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

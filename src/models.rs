use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConsoleError;
use crate::session::TaskId;

pub const START_REPAIR_PATH: &str = "/api/start_repair";

pub fn task_status_path(task_id: &TaskId) -> String {
    format!("/api/task_status/{task_id}")
}

pub fn download_patch_path(task_id: &TaskId) -> String {
    format!("/api/download_patch/{task_id}")
}

pub fn patch_view_path(task_id: &TaskId) -> String {
    format!("/patch_view/{task_id}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartRepairRequest {
    pub repo_key: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartRepairResponse {
    #[serde(default)]
    pub success: bool,
    pub task_id: Option<TaskId>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl StartRepairResponse {
    /// Resolves the envelope into the started task id and its announcement.
    pub fn into_result(self) -> Result<(TaskId, Option<String>), ConsoleError> {
        match (self.success, self.task_id) {
            (true, Some(task_id)) => Ok((task_id, self.message)),
            (true, None) => Err(ConsoleError::transport("start response carried no task_id")),
            (false, _) => Err(ConsoleError::backend(
                self.error
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| "Repair task could not be started".to_string()),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    Error,
    /// Any non-terminal phase the backend reports (`running`, `kg_mining`, ...).
    Active(String),
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "completed" => Self::Completed,
            "error" => Self::Error,
            other => Self::Active(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Active(String::new())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskSnapshot {
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub current_step: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusResponse {
    #[serde(default)]
    pub success: bool,
    pub task: Option<TaskSnapshot>,
    #[serde(default)]
    pub logs: Vec<String>,
    pub error: Option<String>,
}

impl TaskStatusResponse {
    pub fn into_result(self) -> Result<(TaskSnapshot, Vec<String>), ConsoleError> {
        match (self.success, self.task) {
            (true, Some(task)) => Ok((task, self.logs)),
            (true, None) => Err(ConsoleError::poll("status response carried no task")),
            (false, _) => Err(ConsoleError::poll(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}

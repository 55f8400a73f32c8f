use serde::Deserialize;

/// Frames received on the push socket, tagged by their `type` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    TaskUpdate {
        task_id: String,
        #[serde(default)]
        progress: f64,
        #[serde(default)]
        message: String,
        #[serde(default)]
        status: String,
    },
    TaskLog {
        task_id: String,
        message: String,
    },
    TaskProgress {
        task_id: String,
        #[serde(default)]
        progress: f64,
        #[serde(default)]
        step_detail: String,
    },
    Connected {
        #[serde(default)]
        message: String,
    },
    #[serde(other)]
    Unknown,
}

impl PushEvent {
    pub fn parse(text: &str) -> Option<Self> {
        match serde_json::from_str::<Self>(text) {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::debug!("dropping malformed push frame: {err}");
                None
            }
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::TaskUpdate { task_id, .. }
            | Self::TaskLog { task_id, .. }
            | Self::TaskProgress { task_id, .. } => Some(task_id),
            Self::Connected { .. } | Self::Unknown => None,
        }
    }
}

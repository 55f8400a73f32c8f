use thiserror::Error;

pub type ConsoleResult<T> = Result<T, ConsoleError>;

pub const GENERIC_START_FAILURE: &str = "Failed to start repair task";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Backend(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("status poll failed: {0}")]
    Poll(String),
    #[error("invalid console configuration: {0}")]
    Config(String),
}

impl ConsoleError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn poll(message: impl Into<String>) -> Self {
        Self::Poll(message.into())
    }

    /// Text for the notification toast, or `None` for failures that are only
    /// logged. Transport details stay in the log.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Validation(message) | Self::Backend(message) => Some(message.clone()),
            Self::Transport(_) => Some(GENERIC_START_FAILURE.to_string()),
            Self::Poll(_) | Self::Config(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(value: serde_json::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

//! Browser console for starting automated repair tasks and following their
//! progress over polling and a push socket.

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod models;
pub mod notification;
pub mod session;

#[cfg(target_arch = "wasm32")]
mod web;

pub use config::{ConsoleBootstrap, ConsoleConfig, ExampleIssue, RepoCatalog, RepoInfo};
pub use controller::{Effect, Input, ProgressTone, TaskController, ViewPhase};
pub use error::{ConsoleError, ConsoleResult};
pub use events::PushEvent;
pub use notification::{Notification, NotificationLevel};
pub use session::{LogBuffer, ProgressState, TaskId, TaskSession};

#[cfg(target_arch = "wasm32")]
pub use web::boot;

//! Task view controller.
//!
//! The controller owns the active repair session and reconciles it against the
//! poll loop and the push socket. It never touches the DOM: every [`Input`]
//! yields a list of [`Effect`]s that the browser layer executes in order.

use tracing::{debug, info, warn};

use crate::config::{ConsoleBootstrap, ConsoleConfig, ExampleIssue, RepoCatalog};
use crate::error::ConsoleError;
use crate::events::PushEvent;
use crate::models::{
    START_REPAIR_PATH, StartRepairRequest, StartRepairResponse, TaskStatus, TaskStatusResponse,
    download_patch_path, patch_view_path, task_status_path,
};
use crate::notification::Notification;
use crate::session::{LogBuffer, ProgressState, TaskId, TaskSession};

pub const MISSING_INPUT_MESSAGE: &str = "Please select a repository and enter an instance id";
pub const DEFAULT_STARTED_MESSAGE: &str = "Repair task started";
pub const COMPLETED_MESSAGE: &str = "🎉 Repair task completed!";
pub const DEFAULT_FAILED_MESSAGE: &str = "Repair task failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressTone {
    Normal,
    Success,
    Danger,
}

impl ProgressTone {
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Normal => "progress-bar progress-bar-striped progress-bar-animated",
            Self::Success => "progress-bar bg-success",
            Self::Danger => "progress-bar bg-danger",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Input {
    Boot,
    Submit {
        repo_key: String,
        instance_id: String,
    },
    StartResolved {
        request: u64,
        result: Result<StartRepairResponse, ConsoleError>,
    },
    PollTick {
        task_id: TaskId,
    },
    StatusResolved {
        task_id: TaskId,
        result: Result<TaskStatusResponse, ConsoleError>,
    },
    Push(PushEvent),
    PushConnected,
    PushDisconnected,
    DownloadPatch,
    OpenReport,
    Reset,
    RepoSelected(Option<String>),
    ExampleChosen {
        repo_key: String,
        instance_id: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SetSubmitBusy(bool),
    ShowPhase(ViewPhase),
    ShowSession {
        repo_name: String,
        instance_id: String,
    },
    RenderProgress(ProgressState),
    SetProgressTone(ProgressTone),
    ClearLog,
    AppendLog(String),
    Notify(Notification),
    ResetForm,
    FillForm {
        repo_key: String,
        instance_id: String,
    },
    SetRepoDescription(String),
    ShowExamples(Vec<ExampleIssue>),
    RequestStart {
        request: u64,
        url: String,
        body: StartRepairRequest,
    },
    RequestStatus {
        task_id: TaskId,
        url: String,
    },
    ArmPoll {
        task_id: TaskId,
        interval_ms: u32,
    },
    CancelPoll,
    Download {
        url: String,
        file_name: String,
    },
    OpenWindow {
        url: String,
    },
}

#[derive(Debug, Clone)]
struct PendingStart {
    request: u64,
    repo_key: String,
    instance_id: String,
}

#[derive(Debug)]
pub struct TaskController {
    config: ConsoleConfig,
    catalog: RepoCatalog,
    phase: ViewPhase,
    session: Option<TaskSession>,
    logs: LogBuffer,
    progress: ProgressState,
    pending_start: Option<PendingStart>,
    next_request: u64,
    armed_poll: Option<TaskId>,
    submit_enabled: bool,
    push_connected: Option<bool>,
}

impl TaskController {
    pub fn new(config: ConsoleConfig, catalog: RepoCatalog) -> Self {
        Self {
            config,
            catalog,
            phase: ViewPhase::Idle,
            session: None,
            logs: LogBuffer::new(),
            progress: ProgressState::initial(),
            pending_start: None,
            next_request: 0,
            armed_poll: None,
            submit_enabled: true,
            push_connected: None,
        }
    }

    pub fn from_bootstrap(bootstrap: ConsoleBootstrap) -> Self {
        Self::new(bootstrap.config, bootstrap.catalog)
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&TaskSession> {
        self.session.as_ref()
    }

    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn is_polling(&self) -> bool {
        self.armed_poll.is_some()
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub fn start_pending(&self) -> bool {
        self.pending_start.is_some()
    }

    pub fn handle(&mut self, input: Input) -> Vec<Effect> {
        let mut effects = Vec::new();
        match input {
            Input::Boot => {
                effects.push(Effect::ShowPhase(self.phase));
                effects.push(Effect::ShowExamples(self.catalog.default_examples()));
            }
            Input::Submit {
                repo_key,
                instance_id,
            } => self.submit(&repo_key, &instance_id, &mut effects),
            Input::StartResolved { request, result } => {
                self.start_resolved(request, result, &mut effects)
            }
            Input::PollTick { task_id } => self.poll_tick(task_id, &mut effects),
            Input::StatusResolved { task_id, result } => {
                self.status_resolved(&task_id, result, &mut effects)
            }
            Input::Push(event) => self.push_event(event, &mut effects),
            Input::PushConnected => {
                if self.push_connected != Some(true) {
                    info!("push channel connected");
                    effects.push(Effect::Notify(Notification::success("Connected to server")));
                }
                self.push_connected = Some(true);
            }
            Input::PushDisconnected => {
                if self.push_connected == Some(true) {
                    warn!("push channel disconnected");
                    effects.push(Effect::Notify(Notification::warning(
                        "Disconnected from server",
                    )));
                }
                self.push_connected = Some(false);
            }
            Input::DownloadPatch => {
                if let Some(session) = &self.session {
                    effects.push(Effect::Download {
                        url: self.config.endpoint(&download_patch_path(&session.task_id)),
                        file_name: session.patch_file_name(),
                    });
                    effects.push(Effect::Notify(Notification::info(
                        "Patch download started",
                    )));
                }
            }
            Input::OpenReport => {
                if let Some(session) = &self.session {
                    effects.push(Effect::OpenWindow {
                        url: self.config.endpoint(&patch_view_path(&session.task_id)),
                    });
                }
            }
            Input::Reset => self.reset(&mut effects),
            Input::RepoSelected(repo_key) => self.repo_selected(repo_key.as_deref(), &mut effects),
            Input::ExampleChosen {
                repo_key,
                instance_id,
            } => {
                effects.push(Effect::FillForm {
                    repo_key: repo_key.clone(),
                    instance_id: instance_id.clone(),
                });
                self.repo_selected(Some(&repo_key), &mut effects);
                effects.push(Effect::Notify(Notification::info(format!(
                    "Filled example: {instance_id}"
                ))));
            }
        }
        effects
    }

    fn submit(&mut self, repo_key: &str, instance_id: &str, effects: &mut Vec<Effect>) {
        if self.pending_start.is_some() || !self.submit_enabled {
            debug!("ignoring submit while submission is disabled");
            return;
        }

        let repo_key = repo_key.trim();
        let instance_id = instance_id.trim();
        if repo_key.is_empty() || instance_id.is_empty() {
            report_error(&ConsoleError::validation(MISSING_INPUT_MESSAGE), effects);
            return;
        }

        self.next_request += 1;
        let request = self.next_request;
        self.pending_start = Some(PendingStart {
            request,
            repo_key: repo_key.to_string(),
            instance_id: instance_id.to_string(),
        });
        self.submit_enabled = false;

        info!("starting repair for {repo_key} / {instance_id}");
        effects.push(Effect::SetSubmitBusy(true));
        effects.push(Effect::RequestStart {
            request,
            url: self.config.endpoint(START_REPAIR_PATH),
            body: StartRepairRequest {
                repo_key: repo_key.to_string(),
                instance_id: instance_id.to_string(),
            },
        });
    }

    fn start_resolved(
        &mut self,
        request: u64,
        result: Result<StartRepairResponse, ConsoleError>,
        effects: &mut Vec<Effect>,
    ) {
        let Some(pending) = self
            .pending_start
            .take_if(|pending| pending.request == request)
        else {
            debug!("dropping stale start response #{request}");
            return;
        };

        match result.and_then(StartRepairResponse::into_result) {
            Ok((task_id, message)) => {
                self.stop_polling(effects);

                let session = TaskSession {
                    repo_display_name: self.catalog.display_name(&pending.repo_key),
                    task_id: task_id.clone(),
                    repo_key: pending.repo_key,
                    instance_id: pending.instance_id,
                };
                info!("repair task {task_id} started");

                self.phase = ViewPhase::Running;
                self.logs.clear();
                self.progress = ProgressState::initial();

                effects.push(Effect::ShowPhase(ViewPhase::Running));
                effects.push(Effect::ShowSession {
                    repo_name: session.repo_display_name.clone(),
                    instance_id: session.instance_id.clone(),
                });
                effects.push(Effect::SetProgressTone(ProgressTone::Normal));
                effects.push(Effect::RenderProgress(self.progress.clone()));
                effects.push(Effect::ClearLog);
                effects.push(Effect::Notify(Notification::success(
                    message
                        .filter(|message| !message.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_STARTED_MESSAGE.to_string()),
                )));
                self.session = Some(session);

                self.start_polling(task_id, effects);
            }
            Err(err) => {
                warn!("failed to start repair task: {err}");
                self.submit_enabled = true;
                report_error(&err, effects);
                effects.push(Effect::SetSubmitBusy(false));
            }
        }
    }

    fn start_polling(&mut self, task_id: TaskId, effects: &mut Vec<Effect>) {
        effects.push(Effect::RequestStatus {
            url: self.config.endpoint(&task_status_path(&task_id)),
            task_id: task_id.clone(),
        });
        effects.push(Effect::ArmPoll {
            task_id: task_id.clone(),
            interval_ms: self.config.poll_interval_ms,
        });
        self.armed_poll = Some(task_id);
    }

    fn stop_polling(&mut self, effects: &mut Vec<Effect>) {
        if self.armed_poll.take().is_some() {
            effects.push(Effect::CancelPoll);
        }
    }

    fn poll_tick(&mut self, task_id: TaskId, effects: &mut Vec<Effect>) {
        if self.armed_poll.as_ref() != Some(&task_id) || self.phase != ViewPhase::Running {
            debug!("ignoring stale poll tick for {task_id}");
            return;
        }
        effects.push(Effect::RequestStatus {
            url: self.config.endpoint(&task_status_path(&task_id)),
            task_id,
        });
    }

    fn status_resolved(
        &mut self,
        task_id: &TaskId,
        result: Result<TaskStatusResponse, ConsoleError>,
        effects: &mut Vec<Effect>,
    ) {
        if !self.owns(task_id.as_str()) {
            debug!("dropping status for inactive task {task_id}");
            return;
        }

        let polled = result
            .map_err(|err| ConsoleError::poll(err.to_string()))
            .and_then(TaskStatusResponse::into_result);
        let (task, logs) = match polled {
            Ok(value) => value,
            Err(err) => {
                debug!("status poll for {task_id} retries next tick");
                report_error(&err, effects);
                return;
            }
        };

        if self.phase == ViewPhase::Running {
            self.set_progress(ProgressState::new(task.progress, task.current_step), effects);
        }
        for line in self.logs.merge(&logs) {
            effects.push(Effect::AppendLog(line));
        }
        self.settle(&task.status, task.error, effects);
    }

    fn push_event(&mut self, event: PushEvent, effects: &mut Vec<Effect>) {
        if let Some(task_id) = event.task_id() {
            if !self.owns(task_id) {
                debug!("dropping push event for inactive task {task_id}");
                return;
            }
        }

        match event {
            PushEvent::TaskUpdate {
                progress,
                message,
                status,
                ..
            } => {
                if self.phase != ViewPhase::Running {
                    return;
                }
                self.set_progress(ProgressState::new(progress, message.clone()), effects);
                self.settle(&TaskStatus::parse(&status), Some(message), effects);
            }
            PushEvent::TaskLog { message, .. } => {
                if self.logs.push(&message) {
                    effects.push(Effect::AppendLog(message));
                }
            }
            PushEvent::TaskProgress {
                progress,
                step_detail,
                ..
            } => {
                if self.phase == ViewPhase::Running {
                    self.set_progress(ProgressState::new(progress, step_detail), effects);
                }
            }
            PushEvent::Connected { message } => {
                info!("server says: {message}");
            }
            PushEvent::Unknown => {}
        }
    }

    fn set_progress(&mut self, progress: ProgressState, effects: &mut Vec<Effect>) {
        self.progress = progress;
        effects.push(Effect::RenderProgress(self.progress.clone()));
    }

    fn settle(&mut self, status: &TaskStatus, error: Option<String>, effects: &mut Vec<Effect>) {
        if !status.is_terminal() {
            return;
        }
        if *status == TaskStatus::Completed {
            self.finish(ViewPhase::Completed, None, effects);
        } else {
            self.finish(ViewPhase::Failed, error, effects);
        }
    }

    fn finish(&mut self, outcome: ViewPhase, error: Option<String>, effects: &mut Vec<Effect>) {
        if self.phase != ViewPhase::Running {
            return;
        }
        self.stop_polling(effects);
        self.phase = outcome;
        self.submit_enabled = true;

        let (tone, notification) = if outcome == ViewPhase::Completed {
            (ProgressTone::Success, Notification::success(COMPLETED_MESSAGE))
        } else {
            let message = error
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FAILED_MESSAGE.to_string());
            (ProgressTone::Danger, Notification::error(format!("❌ {message}")))
        };
        if let Some(session) = &self.session {
            info!("repair task {} finished as {outcome:?}", session.task_id);
        }

        effects.push(Effect::SetProgressTone(tone));
        effects.push(Effect::ShowPhase(outcome));
        effects.push(Effect::SetSubmitBusy(false));
        effects.push(Effect::Notify(notification));
    }

    fn reset(&mut self, effects: &mut Vec<Effect>) {
        self.armed_poll = None;
        self.session = None;
        self.pending_start = None;
        self.logs.clear();
        self.progress = ProgressState::initial();
        self.phase = ViewPhase::Idle;
        self.submit_enabled = true;

        effects.push(Effect::CancelPoll);
        effects.push(Effect::ShowPhase(ViewPhase::Idle));
        effects.push(Effect::ClearLog);
        effects.push(Effect::SetProgressTone(ProgressTone::Normal));
        effects.push(Effect::ResetForm);
        effects.push(Effect::SetRepoDescription(String::new()));
        effects.push(Effect::ShowExamples(self.catalog.default_examples()));
        effects.push(Effect::SetSubmitBusy(false));
    }

    fn repo_selected(&self, repo_key: Option<&str>, effects: &mut Vec<Effect>) {
        let described = repo_key.and_then(|key| {
            self.catalog
                .description(key)
                .map(|description| (description, self.catalog.examples_for(key)))
        });
        match described {
            Some((description, examples)) => {
                effects.push(Effect::SetRepoDescription(description));
                effects.push(Effect::ShowExamples(examples));
            }
            None => {
                effects.push(Effect::SetRepoDescription(String::new()));
                effects.push(Effect::ShowExamples(self.catalog.default_examples()));
            }
        }
    }

    fn owns(&self, task_id: &str) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.owns(task_id))
    }
}

/// Shows user-facing failures as a toast. Everything else only reaches the log.
fn report_error(err: &ConsoleError, effects: &mut Vec<Effect>) {
    match err.user_message() {
        Some(message) => effects.push(Effect::Notify(Notification::error(message))),
        None => warn!("{err}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::config::RepoInfo;
    use crate::notification::NotificationLevel;

    fn catalog() -> RepoCatalog {
        let mut repos = BTreeMap::new();
        repos.insert(
            "django__django".to_string(),
            RepoInfo {
                name: "django/django".to_string(),
                description: "Web framework".to_string(),
                language: "Python".to_string(),
                stars: "79k".to_string(),
            },
        );
        let mut examples = BTreeMap::new();
        examples.insert(
            "django__django".to_string(),
            vec![
                "django__django-11001".to_string(),
                "django__django-11179".to_string(),
            ],
        );
        RepoCatalog { repos, examples }
    }

    fn controller() -> TaskController {
        TaskController::new(ConsoleConfig::default(), catalog())
    }

    fn start_ok(task_id: &str) -> Result<StartRepairResponse, ConsoleError> {
        Ok(StartRepairResponse {
            success: true,
            task_id: Some(TaskId::from(task_id)),
            message: Some("Repair task started".to_string()),
            error: None,
        })
    }

    fn started(task_id: &str) -> TaskController {
        let mut controller = controller();
        controller.handle(Input::Submit {
            repo_key: "django__django".to_string(),
            instance_id: "django__django-11001".to_string(),
        });
        controller.handle(Input::StartResolved {
            request: 1,
            result: start_ok(task_id),
        });
        controller
    }

    fn notifications(effects: &[Effect]) -> Vec<&Notification> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Notify(notification) => Some(notification),
                _ => None,
            })
            .collect()
    }

    fn status(task_id: &str, body: &str) -> Input {
        Input::StatusResolved {
            task_id: TaskId::from(task_id),
            result: Ok(serde_json::from_str(body).expect("valid status json")),
        }
    }

    #[test]
    fn blank_instance_id_is_rejected_without_a_request() {
        let mut controller = controller();
        let effects = controller.handle(Input::Submit {
            repo_key: "django__django".to_string(),
            instance_id: "   ".to_string(),
        });

        assert!(
            !effects
                .iter()
                .any(|effect| matches!(effect, Effect::RequestStart { .. }))
        );
        let notes = notifications(&effects);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].message, MISSING_INPUT_MESSAGE);
        assert!(controller.submit_enabled());
    }

    #[test]
    fn submit_trims_and_disables_the_form() {
        let mut controller = controller();
        let effects = controller.handle(Input::Submit {
            repo_key: " django__django ".to_string(),
            instance_id: " django__django-11001\n".to_string(),
        });

        assert_eq!(
            effects,
            vec![
                Effect::SetSubmitBusy(true),
                Effect::RequestStart {
                    request: 1,
                    url: "/api/start_repair".to_string(),
                    body: StartRepairRequest {
                        repo_key: "django__django".to_string(),
                        instance_id: "django__django-11001".to_string(),
                    },
                },
            ]
        );
        assert!(!controller.submit_enabled());

        let again = controller.handle(Input::Submit {
            repo_key: "django__django".to_string(),
            instance_id: "x".to_string(),
        });
        assert!(again.is_empty());
    }

    #[test]
    fn backend_rejection_reenables_submission() {
        let mut controller = controller();
        controller.handle(Input::Submit {
            repo_key: "django__django".to_string(),
            instance_id: "django__django-11001".to_string(),
        });
        let effects = controller.handle(Input::StartResolved {
            request: 1,
            result: Ok(StartRepairResponse {
                success: false,
                task_id: None,
                message: None,
                error: Some("Unsupported repository".to_string()),
            }),
        });

        assert_eq!(notifications(&effects)[0].message, "Unsupported repository");
        assert!(effects.contains(&Effect::SetSubmitBusy(false)));
        assert_eq!(controller.phase(), ViewPhase::Idle);
        assert!(controller.submit_enabled());
        assert!(!controller.start_pending());
    }

    #[test]
    fn transport_failure_shows_generic_message() {
        let mut controller = controller();
        controller.handle(Input::Submit {
            repo_key: "django__django".to_string(),
            instance_id: "django__django-11001".to_string(),
        });
        let effects = controller.handle(Input::StartResolved {
            request: 1,
            result: Err(ConsoleError::transport("NetworkError")),
        });

        assert_eq!(
            notifications(&effects)[0].message,
            crate::error::GENERIC_START_FAILURE
        );
        assert!(controller.submit_enabled());
    }

    #[test]
    fn successful_start_enters_running_and_polls_once() {
        let mut controller = controller();
        controller.handle(Input::Submit {
            repo_key: "django__django".to_string(),
            instance_id: "django__django-11001".to_string(),
        });
        let effects = controller.handle(Input::StartResolved {
            request: 1,
            result: start_ok("t1"),
        });

        assert_eq!(controller.phase(), ViewPhase::Running);
        assert!(controller.is_polling());
        assert!(effects.contains(&Effect::ShowSession {
            repo_name: "django/django".to_string(),
            instance_id: "django__django-11001".to_string(),
        }));
        assert!(effects.contains(&Effect::RenderProgress(ProgressState::initial())));
        assert_eq!(
            effects
                .iter()
                .filter(|effect| matches!(effect, Effect::ArmPoll { .. }))
                .count(),
            1
        );
        assert_eq!(
            effects
                .iter()
                .filter(|effect| matches!(effect, Effect::RequestStatus { .. }))
                .count(),
            1
        );
        assert!(!effects.contains(&Effect::CancelPoll));
    }

    #[test]
    fn stale_start_response_after_reset_is_dropped() {
        let mut controller = controller();
        controller.handle(Input::Submit {
            repo_key: "django__django".to_string(),
            instance_id: "django__django-11001".to_string(),
        });
        controller.handle(Input::Reset);

        let effects = controller.handle(Input::StartResolved {
            request: 1,
            result: start_ok("t1"),
        });
        assert!(effects.is_empty());
        assert!(controller.session().is_none());
        assert_eq!(controller.phase(), ViewPhase::Idle);
    }

    #[test]
    fn poll_tick_requests_status_for_active_task_only() {
        let mut controller = started("t1");

        let effects = controller.handle(Input::PollTick {
            task_id: TaskId::from("t1"),
        });
        assert_eq!(
            effects,
            vec![Effect::RequestStatus {
                task_id: TaskId::from("t1"),
                url: "/api/task_status/t1".to_string(),
            }]
        );

        let stale = controller.handle(Input::PollTick {
            task_id: TaskId::from("t0"),
        });
        assert!(stale.is_empty());
    }

    #[test]
    fn poll_failure_is_silent() {
        let mut controller = started("t1");
        let effects = controller.handle(Input::StatusResolved {
            task_id: TaskId::from("t1"),
            result: Err(ConsoleError::transport("offline")),
        });
        assert!(effects.is_empty());

        let effects = controller.handle(status("t1", r#"{"success": false, "error": "gone"}"#));
        assert!(effects.is_empty());
        assert!(controller.is_polling());
    }

    #[test]
    fn failed_status_surfaces_task_error() {
        let mut controller = started("t1");
        let effects = controller.handle(status(
            "t1",
            r#"{"success": true, "task": {"status": "error", "progress": 0, "current_step": "x", "error": "docker missing"}, "logs": []}"#,
        ));

        assert_eq!(controller.phase(), ViewPhase::Failed);
        assert!(!controller.is_polling());
        assert!(effects.contains(&Effect::CancelPoll));
        assert!(effects.contains(&Effect::SetProgressTone(ProgressTone::Danger)));
        assert_eq!(notifications(&effects)[0].message, "❌ docker missing");
        assert!(controller.submit_enabled());
    }

    #[test]
    fn push_update_completion_stops_polling() {
        let mut controller = started("t1");
        let effects = controller.handle(Input::Push(PushEvent::TaskUpdate {
            task_id: "t1".to_string(),
            progress: 100.0,
            message: "Repair finished".to_string(),
            status: "completed".to_string(),
        }));

        assert_eq!(controller.phase(), ViewPhase::Completed);
        assert!(effects.contains(&Effect::CancelPoll));
        assert!(effects.contains(&Effect::ShowPhase(ViewPhase::Completed)));
        assert_eq!(controller.progress().percent, 100);

        let late_tick = controller.handle(Input::PollTick {
            task_id: TaskId::from("t1"),
        });
        assert!(late_tick.is_empty());
    }

    #[test]
    fn push_update_error_fails_with_its_message() {
        let mut controller = started("t1");
        let effects = controller.handle(Input::Push(PushEvent::TaskUpdate {
            task_id: "t1".to_string(),
            progress: 35.0,
            message: "Patch did not apply".to_string(),
            status: "error".to_string(),
        }));

        assert_eq!(controller.phase(), ViewPhase::Failed);
        assert!(!controller.is_polling());
        assert!(effects.contains(&Effect::CancelPoll));
        assert!(effects.contains(&Effect::SetProgressTone(ProgressTone::Danger)));
        assert!(effects.contains(&Effect::ShowPhase(ViewPhase::Failed)));
        let notes = notifications(&effects);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].message, "❌ Patch did not apply");
        assert!(controller.submit_enabled());
    }

    #[test]
    fn push_progress_after_completion_is_dropped() {
        let mut controller = started("t1");
        controller.handle(Input::Push(PushEvent::TaskUpdate {
            task_id: "t1".to_string(),
            progress: 100.0,
            message: "done".to_string(),
            status: "completed".to_string(),
        }));

        let effects = controller.handle(Input::Push(PushEvent::TaskProgress {
            task_id: "t1".to_string(),
            progress: 42.0,
            step_detail: "late step".to_string(),
        }));
        assert!(effects.is_empty());
        assert_eq!(controller.phase(), ViewPhase::Completed);
        assert_eq!(controller.progress().percent, 100);
        assert_eq!(controller.progress().step_label, "done");
    }

    #[test]
    fn status_transport_failure_is_logged_not_shown() {
        let mut controller = started("t1");
        let effects = controller.handle(Input::StatusResolved {
            task_id: TaskId::from("t1"),
            result: Err(ConsoleError::transport("NetworkError")),
        });
        assert!(notifications(&effects).is_empty());
        assert_eq!(controller.phase(), ViewPhase::Running);
    }

    #[test]
    fn terminal_session_ignores_late_progress_but_keeps_logs() {
        let mut controller = started("t1");
        controller.handle(Input::Push(PushEvent::TaskUpdate {
            task_id: "t1".to_string(),
            progress: 100.0,
            message: "done".to_string(),
            status: "completed".to_string(),
        }));

        let effects = controller.handle(status(
            "t1",
            r#"{"success": true, "task": {"status": "running", "progress": 60, "current_step": "late"}, "logs": ["tail"]}"#,
        ));
        assert_eq!(effects, vec![Effect::AppendLog("tail".to_string())]);
        assert_eq!(controller.phase(), ViewPhase::Completed);
        assert_eq!(controller.progress().percent, 100);
    }

    #[test]
    fn push_disconnect_is_announced_once() {
        let mut controller = controller();
        assert!(controller.handle(Input::PushDisconnected).is_empty());
        assert_eq!(controller.handle(Input::PushConnected).len(), 1);
        assert!(controller.handle(Input::PushConnected).is_empty());
        assert_eq!(controller.handle(Input::PushDisconnected).len(), 1);
        assert!(controller.handle(Input::PushDisconnected).is_empty());
    }

    #[test]
    fn download_and_report_need_a_session() {
        let mut idle = controller();
        assert!(idle.handle(Input::DownloadPatch).is_empty());
        assert!(idle.handle(Input::OpenReport).is_empty());

        let mut controller = started("t1");
        let effects = controller.handle(Input::DownloadPatch);
        assert_eq!(
            effects[0],
            Effect::Download {
                url: "/api/download_patch/t1".to_string(),
                file_name: "django__django-11001_patch.diff".to_string(),
            }
        );
        assert_eq!(
            controller.handle(Input::OpenReport),
            vec![Effect::OpenWindow {
                url: "/patch_view/t1".to_string(),
            }]
        );
    }

    #[test]
    fn repo_selection_updates_description_and_examples() {
        let mut controller = controller();
        let effects = controller.handle(Input::RepoSelected(Some("django__django".to_string())));
        assert_eq!(
            effects[0],
            Effect::SetRepoDescription("Web framework (79k ⭐)".to_string())
        );
        match &effects[1] {
            Effect::ShowExamples(examples) => assert_eq!(examples.len(), 2),
            other => panic!("unexpected effect {other:?}"),
        }

        let cleared = controller.handle(Input::RepoSelected(None));
        assert_eq!(cleared[0], Effect::SetRepoDescription(String::new()));
        match &cleared[1] {
            Effect::ShowExamples(examples) => assert_eq!(examples.len(), 1),
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn choosing_an_example_fills_the_form() {
        let mut controller = controller();
        let effects = controller.handle(Input::ExampleChosen {
            repo_key: "django__django".to_string(),
            instance_id: "django__django-11179".to_string(),
        });

        assert_eq!(
            effects[0],
            Effect::FillForm {
                repo_key: "django__django".to_string(),
                instance_id: "django__django-11179".to_string(),
            }
        );
        assert_eq!(
            notifications(&effects)[0].message,
            "Filled example: django__django-11179"
        );
    }
}

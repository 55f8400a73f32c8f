//! Browser glue: turns DOM events, timers and socket frames into controller
//! inputs, and executes the effects the controller returns.

mod dom;
mod network;

use futures::StreamExt;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use gloo_timers::callback::Interval;
use leptos::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlElement;

use crate::config::{ConsoleBootstrap, ConsoleConfig};
use crate::controller::{Effect, Input, TaskController};
use crate::models::{StartRepairResponse, TaskStatusResponse};

#[component]
fn App() -> impl IntoView {
    view! {
        <div
            id="leptos-runtime-marker"
            data-runtime="repair-console"
            style="display:none;"
        ></div>
    }
}

/// Cloneable handle every callback uses to feed the driver loop.
#[derive(Clone)]
pub(crate) struct InputSender(UnboundedSender<Input>);

impl InputSender {
    pub(crate) fn send(&self, input: Input) {
        if self.0.unbounded_send(input).is_err() {
            tracing::debug!("console driver stopped; dropping input");
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

struct EffectRuntime {
    config: ConsoleConfig,
    inputs: InputSender,
    poll: Option<Interval>,
}

impl EffectRuntime {
    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::SetSubmitBusy(busy) => dom::set_submit_busy(busy),
            Effect::ShowPhase(phase) => dom::show_phase(phase),
            Effect::ShowSession {
                repo_name,
                instance_id,
            } => {
                dom::set_text("taskRepo", repo_name);
                dom::set_text("taskInstance", instance_id);
            }
            Effect::RenderProgress(progress) => dom::render_progress(&progress),
            Effect::SetProgressTone(tone) => dom::set_class("progressBar", tone.class_name()),
            Effect::ClearLog => dom::clear_log(),
            Effect::AppendLog(line) => dom::append_log(&line),
            Effect::Notify(notification) => {
                dom::show_notification(&notification, self.config.notification_ttl_ms)
            }
            Effect::ResetForm => dom::reset_form(),
            Effect::FillForm {
                repo_key,
                instance_id,
            } => dom::fill_form(&repo_key, &instance_id),
            Effect::SetRepoDescription(description) => {
                dom::set_text("repoDescription", description)
            }
            Effect::ShowExamples(examples) => dom::render_example_buttons(&examples),
            Effect::RequestStart { request, url, body } => {
                let inputs = self.inputs.clone();
                spawn_local(async move {
                    let result = network::post_json::<_, StartRepairResponse>(&url, &body).await;
                    inputs.send(Input::StartResolved { request, result });
                });
            }
            Effect::RequestStatus { task_id, url } => {
                let inputs = self.inputs.clone();
                spawn_local(async move {
                    let result = network::fetch_json::<TaskStatusResponse>(&url).await;
                    inputs.send(Input::StatusResolved { task_id, result });
                });
            }
            Effect::ArmPoll {
                task_id,
                interval_ms,
            } => {
                self.cancel_poll();
                let inputs = self.inputs.clone();
                self.poll = Some(Interval::new(interval_ms, move || {
                    inputs.send(Input::PollTick {
                        task_id: task_id.clone(),
                    });
                }));
            }
            Effect::CancelPoll => self.cancel_poll(),
            Effect::Download { url, file_name } => dom::trigger_download(&url, &file_name),
            Effect::OpenWindow { url } => dom::open_window(&url),
        }
    }

    fn cancel_poll(&mut self) {
        if let Some(interval) = self.poll.take() {
            interval.cancel();
        }
    }
}

async fn drive(
    mut controller: TaskController,
    mut rx: UnboundedReceiver<Input>,
    inputs: InputSender,
) {
    let mut runtime = EffectRuntime {
        config: controller.config().clone(),
        inputs,
        poll: None,
    };
    while let Some(input) = rx.next().await {
        for effect in controller.handle(input) {
            runtime.apply(effect);
        }
    }
}

pub fn boot() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();

    if let Some(root) = dom::web_document()
        .and_then(|doc| doc.get_element_by_id("leptos-runtime-root"))
        .and_then(|node| node.dyn_into::<HtmlElement>().ok())
    {
        mount_to(root, || view! { <App /> });
    } else {
        mount_to_body(|| view! { <App /> });
    }

    let raw = dom::bootstrap_json();
    let bootstrap = ConsoleBootstrap::load_or_default(raw.as_deref());
    let controller = TaskController::from_bootstrap(bootstrap);
    let push_config = controller.config().clone();

    let (tx, rx) = unbounded::<Input>();
    let inputs = InputSender(tx);

    dom::install_handlers(&inputs);
    if push_config.push_enabled {
        spawn_local(network::run_push_channel(push_config, inputs.clone()));
    }
    inputs.send(Input::Boot);
    spawn_local(drive(controller, rx, inputs));
}

use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{
    Document, Element, HtmlAnchorElement, HtmlButtonElement, HtmlElement, HtmlFormElement,
    HtmlInputElement, HtmlSelectElement,
};

use crate::config::{BOOTSTRAP_ELEMENT_ID, ExampleIssue};
use crate::controller::{Input, ViewPhase};
use crate::notification::Notification;
use crate::session::ProgressState;

use super::InputSender;

const REPAIR_FORM: &str = "repairForm";
const REPO_SELECT: &str = "repoSelect";
const INSTANCE_ID: &str = "instanceId";
const START_BUTTON: &str = "startRepairBtn";
const EXAMPLE_BUTTONS: &str = "exampleButtons";
const DOWNLOAD_BUTTON: &str = "downloadPatchBtn";
const REPORT_BUTTON: &str = "viewReportBtn";
const NEW_TASK_BUTTON: &str = "newTaskBtn";

const HIDDEN_CLASS: &str = "d-none";
const TOAST_CLOSE_CLASS: &str = "btn-close";
const BUSY_LABEL: &str = "<span class=\"loading-spinner me-2\"></span>Starting...";
const IDLE_LABEL: &str = "<i class=\"fas fa-magic me-2\"></i>Start repair";

pub(crate) fn web_document() -> Option<Document> {
    web_sys::window().and_then(|window| window.document())
}

fn element_by_id<T: JsCast>(id: &str) -> Option<T> {
    web_document()?
        .get_element_by_id(id)
        .and_then(|node| node.dyn_into::<T>().ok())
}

pub(crate) fn set_text(id: &str, value: impl AsRef<str>) {
    let Some(doc) = web_document() else {
        return;
    };
    let Some(node) = doc.get_element_by_id(id) else {
        return;
    };
    let next = value.as_ref();
    if node.text_content().as_deref() == Some(next) {
        return;
    }
    node.set_text_content(Some(next));
}

pub(crate) fn set_class(id: &str, class_name: &str) {
    let Some(doc) = web_document() else {
        return;
    };
    let Some(node) = doc.get_element_by_id(id) else {
        return;
    };
    node.set_class_name(class_name);
}

fn set_hidden(id: &str, hidden: bool) {
    let Some(doc) = web_document() else {
        return;
    };
    let Some(node) = doc.get_element_by_id(id) else {
        return;
    };
    let classes = node.class_list();
    if hidden {
        let _ = classes.add_1(HIDDEN_CLASS);
    } else {
        let _ = classes.remove_1(HIDDEN_CLASS);
    }
}

pub(crate) fn bootstrap_json() -> Option<String> {
    web_document()?
        .get_element_by_id(BOOTSTRAP_ELEMENT_ID)?
        .text_content()
}

pub(crate) fn page_location() -> (String, String) {
    let Some(location) = web_sys::window().map(|window| window.location()) else {
        return ("http:".to_string(), "localhost".to_string());
    };
    (
        location.protocol().unwrap_or_else(|_| "http:".to_string()),
        location.host().unwrap_or_else(|_| "localhost".to_string()),
    )
}

pub(crate) fn set_submit_busy(busy: bool) {
    let Some(button) = element_by_id::<HtmlButtonElement>(START_BUTTON) else {
        return;
    };
    button.set_disabled(busy);
    button.set_inner_html(if busy { BUSY_LABEL } else { IDLE_LABEL });
}

pub(crate) fn show_phase(phase: ViewPhase) {
    let idle = phase == ViewPhase::Idle;
    set_hidden("defaultStatus", !idle);
    set_hidden("taskStatus", idle);
    set_hidden("completedActions", phase != ViewPhase::Completed);
}

pub(crate) fn render_progress(progress: &ProgressState) {
    if let Some(bar) = element_by_id::<HtmlElement>("progressBar") {
        let _ = bar
            .style()
            .set_property("width", &format!("{}%", progress.percent));
        let _ = bar.set_attribute("aria-valuenow", &progress.percent.to_string());
    }
    set_text("progressPercent", format!("{}%", progress.percent));
    set_text("currentStep", &progress.step_label);
}

pub(crate) fn clear_log() {
    if let Some(content) = web_document().and_then(|doc| doc.get_element_by_id("logContent")) {
        content.set_inner_html("");
    }
}

pub(crate) fn append_log(line: &str) {
    let Some(doc) = web_document() else {
        return;
    };
    let Some(content) = doc.get_element_by_id("logContent") else {
        return;
    };
    let Ok(row) = doc.create_element("div") else {
        return;
    };
    row.set_class_name("fade-in");
    row.set_text_content(Some(line));
    let _ = content.append_child(&row);

    if let Some(container) = doc.get_element_by_id("logContainer") {
        container.set_scroll_top(container.scroll_height());
    }
}

pub(crate) fn show_notification(notification: &Notification, ttl_ms: u32) {
    let Some(doc) = web_document() else {
        return;
    };
    let Some(body) = doc.body() else {
        return;
    };
    let Ok(toast) = doc.create_element("div") else {
        return;
    };
    toast.set_class_name(&notification.class_name());
    let _ = toast.set_attribute("role", "alert");
    let _ = toast.set_attribute(
        "style",
        "top: 20px; right: 20px; z-index: 9999; min-width: 300px;",
    );

    if let Ok(icon) = doc.create_element("i") {
        icon.set_class_name(&format!("{} me-2", notification.level.icon_class()));
        let _ = toast.append_child(&icon);
    }
    if let Ok(text) = doc.create_element("span") {
        text.set_text_content(Some(&notification.message));
        let _ = toast.append_child(&text);
    }
    if let Ok(close) = doc.create_element("button") {
        let _ = close.set_attribute("type", "button");
        close.set_class_name(TOAST_CLOSE_CLASS);
        let _ = toast.append_child(&close);
    }

    let _ = body.append_child(&toast);
    Timeout::new(ttl_ms, move || toast.remove()).forget();
}

pub(crate) fn reset_form() {
    if let Some(form) = element_by_id::<HtmlFormElement>(REPAIR_FORM) {
        form.reset();
    }
}

pub(crate) fn fill_form(repo_key: &str, instance_id: &str) {
    if let Some(select) = element_by_id::<HtmlSelectElement>(REPO_SELECT) {
        select.set_value(repo_key);
    }
    if let Some(input) = element_by_id::<HtmlInputElement>(INSTANCE_ID) {
        input.set_value(instance_id);
    }
}

pub(crate) fn form_values() -> (String, String) {
    let repo_key = element_by_id::<HtmlSelectElement>(REPO_SELECT)
        .map(|select| select.value())
        .unwrap_or_default();
    let instance_id = element_by_id::<HtmlInputElement>(INSTANCE_ID)
        .map(|input| input.value())
        .unwrap_or_default();
    (repo_key, instance_id)
}

pub(crate) fn render_example_buttons(examples: &[ExampleIssue]) {
    let Some(doc) = web_document() else {
        return;
    };
    let Some(container) = doc.get_element_by_id(EXAMPLE_BUTTONS) else {
        return;
    };

    container.set_inner_html("");
    for example in examples {
        let Ok(button) = doc.create_element("button") else {
            continue;
        };
        let _ = button.set_attribute("type", "button");
        let _ = button.set_attribute("data-repo-key", &example.repo_key);
        let _ = button.set_attribute("data-instance-id", &example.instance_id);
        button.set_class_name("btn btn-outline-secondary btn-sm example-btn");
        button.set_text_content(Some(&example.instance_id));
        let _ = container.append_child(&button);
    }
}

pub(crate) fn trigger_download(url: &str, file_name: &str) {
    let Some(anchor) = web_document()
        .and_then(|doc| doc.create_element("a").ok())
        .and_then(|node| node.dyn_into::<HtmlAnchorElement>().ok())
    else {
        return;
    };
    anchor.set_href(url);
    anchor.set_download(file_name);
    anchor.click();
}

pub(crate) fn open_window(url: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(err) = window.open_with_url_and_target(url, "_blank") {
        tracing::warn!("failed to open {url}: {err:?}");
    }
}

fn on_click(id: &str, inputs: &InputSender, make_input: fn() -> Input) {
    let Some(element) = element_by_id::<HtmlElement>(id) else {
        return;
    };
    let inputs = inputs.clone();
    let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
        event.prevent_default();
        inputs.send(make_input());
    });
    let _ = element.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref());
    callback.forget();
}

pub(crate) fn install_handlers(inputs: &InputSender) {
    if let Some(form) = element_by_id::<HtmlFormElement>(REPAIR_FORM) {
        let inputs = inputs.clone();
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            event.prevent_default();
            let (repo_key, instance_id) = form_values();
            inputs.send(Input::Submit {
                repo_key,
                instance_id,
            });
        });
        let _ = form.add_event_listener_with_callback("submit", callback.as_ref().unchecked_ref());
        callback.forget();
    }

    if let Some(select) = element_by_id::<HtmlSelectElement>(REPO_SELECT) {
        let inputs = inputs.clone();
        let source = select.clone();
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
            let value = source.value();
            let selected = (!value.trim().is_empty()).then_some(value);
            inputs.send(Input::RepoSelected(selected));
        });
        let _ =
            select.add_event_listener_with_callback("change", callback.as_ref().unchecked_ref());
        callback.forget();
    }

    if let Some(container) = element_by_id::<HtmlElement>(EXAMPLE_BUTTONS) {
        let inputs = inputs.clone();
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            let Some(target) = event
                .target()
                .and_then(|node| node.dyn_into::<HtmlElement>().ok())
            else {
                return;
            };
            if !target.class_list().contains("example-btn") {
                return;
            }
            let (Some(repo_key), Some(instance_id)) = (
                target.get_attribute("data-repo-key"),
                target.get_attribute("data-instance-id"),
            ) else {
                return;
            };
            event.prevent_default();
            inputs.send(Input::ExampleChosen {
                repo_key,
                instance_id,
            });
        });
        let _ =
            container.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref());
        callback.forget();
    }

    // One delegated listener dismisses every toast; the Timeout removes the rest.
    if let Some(body) = web_document().and_then(|doc| doc.body()) {
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            let Some(target) = event
                .target()
                .and_then(|node| node.dyn_into::<Element>().ok())
            else {
                return;
            };
            if !target.class_list().contains(TOAST_CLOSE_CLASS) {
                return;
            }
            if let Ok(Some(toast)) = target.closest("[role=alert]") {
                toast.remove();
            }
        });
        let _ = body.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref());
        callback.forget();
    }

    on_click(DOWNLOAD_BUTTON, inputs, || Input::DownloadPatch);
    on_click(REPORT_BUTTON, inputs, || Input::OpenReport);
    on_click(NEW_TASK_BUTTON, inputs, || Input::Reset);
}

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use gloo_net::http::{Request, Response};
use gloo_net::websocket::Message;
use gloo_net::websocket::futures::WebSocket;
use gloo_timers::future::sleep;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::ConsoleConfig;
use crate::controller::Input;
use crate::error::{ConsoleError, ConsoleResult};
use crate::events::PushEvent;

use super::InputSender;
use super::dom::page_location;

pub(crate) async fn fetch_json<T>(url: &str) -> ConsoleResult<T>
where
    T: DeserializeOwned,
{
    let response = Request::get(url)
        .send()
        .await
        .map_err(|err| ConsoleError::transport(err.to_string()))?;
    decode_json(response).await
}

pub(crate) async fn post_json<B, T>(url: &str, body: &B) -> ConsoleResult<T>
where
    B: Serialize,
    T: DeserializeOwned,
{
    let request = Request::post(url)
        .json(body)
        .map_err(|err| ConsoleError::transport(err.to_string()))?;
    let response = request
        .send()
        .await
        .map_err(|err| ConsoleError::transport(err.to_string()))?;
    decode_json(response).await
}

// Error statuses still carry a JSON envelope with `success: false`.
async fn decode_json<T>(response: Response) -> ConsoleResult<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    response
        .json::<T>()
        .await
        .map_err(|err| ConsoleError::transport(format!("HTTP {status}: {err}")))
}

pub(crate) async fn run_push_channel(config: ConsoleConfig, inputs: InputSender) {
    let (protocol, host) = page_location();
    let url = config.push_socket_url(&protocol, &host);
    let mut attempt = 0_u32;

    while !inputs.is_closed() {
        match WebSocket::open(&url) {
            Ok(socket) => {
                if run_push_session(socket, &inputs).await {
                    attempt = 0;
                }
                inputs.send(Input::PushDisconnected);
            }
            Err(err) => warn!("failed to open push socket {url}: {err}"),
        }

        let delay = config.reconnect_delay_ms(attempt);
        attempt = attempt.saturating_add(1);
        debug!("reconnecting push socket in {delay}ms");
        sleep(Duration::from_millis(u64::from(delay))).await;
    }
}

/// Pumps frames into the controller until the socket closes. Returns whether
/// the socket ever opened.
async fn run_push_session(mut socket: WebSocket, inputs: &InputSender) -> bool {
    // Sending waits for the socket to open; the server answers pings with pongs.
    let ping = serde_json::json!({"type": "ping"}).to_string();
    if let Err(err) = socket.send(Message::Text(ping)).await {
        warn!("push socket did not open: {err}");
        return false;
    }
    info!("push socket open");
    inputs.send(Input::PushConnected);

    while let Some(frame) = socket.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if let Some(event) = PushEvent::parse(&text) {
                    inputs.send(Input::Push(event));
                }
            }
            Ok(Message::Bytes(bytes)) => {
                debug!("ignoring {} byte binary push frame", bytes.len());
            }
            Err(err) => {
                warn!("push socket error: {err}");
                break;
            }
        }
    }
    true
}

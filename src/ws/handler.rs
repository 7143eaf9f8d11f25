//! WebSocket upgrade handler

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::game::{ConnectionRegistry, Frame, PlayerHandle, PlayerId};
use crate::ws::protocol::ClientMsg;

/// WebSocket upgrade handler, mounted on every path but `/health`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    debug!(addr = %addr, "WebSocket upgrade");
    ws.on_upgrade(move |socket| handle_socket(socket, addr, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, addr: SocketAddr, state: AppState) {
    let (ws_sink, ws_stream) = socket.split();

    let handle = state.registry.join(addr.ip().to_string());
    info!(player_id = %handle.id, addr = %addr.ip(), "Player connected");

    run_session(
        state.registry.clone(),
        handle,
        ws_sink,
        ws_stream,
        state.config.send_timeout,
    )
    .await;
}

/// Drive one registered player until either direction of its connection ends,
/// then remove it from the registry.
pub async fn run_session<Si, St, E>(
    registry: Arc<ConnectionRegistry>,
    handle: PlayerHandle,
    ws_sink: Si,
    ws_stream: St,
    send_timeout: Duration,
) where
    Si: Sink<Message> + Unpin + Send + 'static,
    Si::Error: fmt::Display,
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    let PlayerHandle { id, outbox } = handle;

    // Writer task: outbox -> WebSocket
    let mut writer = tokio::spawn(write_frames(id.clone(), ws_sink, outbox, send_timeout));

    tokio::select! {
        _ = read_inputs(&registry, &id, ws_stream) => {}
        _ = &mut writer => {
            debug!(player_id = %id, "Writer finished first");
        }
    }

    writer.abort();
    registry.remove(&id);

    info!(player_id = %id, "Player disconnected");
}

/// Reader loop: WebSocket -> registry
async fn read_inputs<St, E>(registry: &ConnectionRegistry, id: &PlayerId, mut ws_stream: St)
where
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    while let Some(result) = ws_stream.next().await {
        let applied = match result {
            Ok(Message::Text(text)) => apply_input(registry, id, &text),
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => apply_input(registry, id, text),
                Err(_) => {
                    debug!(player_id = %id, "Ignoring non-UTF-8 binary frame");
                    continue;
                }
            },
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => {
                info!(player_id = %id, "Client initiated close");
                break;
            }
            Err(e) => {
                debug!(player_id = %id, error = %e, "WebSocket error");
                break;
            }
        };

        if applied == Some(false) {
            debug!(player_id = %id, "Player no longer registered");
            break;
        }
    }
}

/// Parse one input frame and store the paddle position.
///
/// `None` means the frame was malformed and dropped; otherwise whether the
/// player was still registered.
fn apply_input(registry: &ConnectionRegistry, id: &PlayerId, text: &str) -> Option<bool> {
    match serde_json::from_str::<ClientMsg>(text) {
        Ok(msg) => Some(registry.update_position(id, msg.y)),
        Err(e) => {
            debug!(player_id = %id, error = %e, "Dropping malformed input frame");
            None
        }
    }
}

/// Writer loop: drains the outbox, giving each frame a bounded time to go out
async fn write_frames<Si>(
    id: PlayerId,
    mut ws_sink: Si,
    mut outbox: mpsc::Receiver<Frame>,
    send_timeout: Duration,
) where
    Si: Sink<Message> + Unpin,
    Si::Error: fmt::Display,
{
    while let Some(frame) = outbox.recv().await {
        match timeout(send_timeout, ws_sink.send(Message::Text(frame.to_string()))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(player_id = %id, error = %e, "WebSocket send failed");
                break;
            }
            Err(_) => {
                warn!(
                    player_id = %id,
                    timeout_ms = send_timeout.as_millis() as u64,
                    "WebSocket send timed out"
                );
                break;
            }
        }
    }
}

use crate::app::AppState;
use crate::error::LobbyError;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use roulette_core::{ClientSignal, ErrorCode, ParticipantId, ServerSignal};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// How long queued frames may take to flush before the socket is dropped.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerSignal>();

    let participant = match state.lobby.connect(tx.clone()).await {
        Ok(id) => id,
        Err(e) => {
            error!("Could not register WebSocket connection: {}", e);
            return;
        }
    };
    info!("New WebSocket connection: {}", participant);

    let mut send_task = tokio::spawn(async move {
        while let Some(signal) = rx.recv().await {
            let json = match serde_json::to_string(&signal) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                return;
            }
        }
        // Every outbox handle is gone: the lobby has let go of us.
        let _ = sender.send(Message::Close(None)).await;
    });

    let mut recv_task = tokio::spawn({
        let state = state.clone();
        let participant = participant.clone();

        async move {
            while let Some(msg) = receiver.next().await {
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!("WebSocket error from {}: {}", participant, e);
                        break;
                    }
                };
                let text = match msg {
                    Message::Text(text) => text,
                    Message::Close(_) => break,
                    _ => continue,
                };

                let signal = match serde_json::from_str::<ClientSignal>(&text) {
                    Ok(signal) => signal,
                    Err(e) => {
                        warn!("Invalid ClientSignal from {}: {}", participant, e);
                        let _ = tx.send(ServerSignal::Error {
                            code: ErrorCode::MalformedFrame,
                            message: e.to_string(),
                        });
                        continue;
                    }
                };

                match dispatch(&state, &participant, signal).await {
                    Ok(ControlFlow::Continue(())) => {}
                    Ok(ControlFlow::Break(())) => break,
                    Err(e) => {
                        error!("Dropping connection {}: {}", participant, e);
                        break;
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => {}
    };

    if let Err(e) = state.lobby.disconnect(participant.clone()).await {
        error!("Lobby died before {} could be removed: {}", participant, e);
    }

    // Once the lobby detaches the outbox the send task drains and closes.
    if !send_task.is_finished()
        && tokio::time::timeout(CLOSE_TIMEOUT, &mut send_task)
            .await
            .is_err()
    {
        warn!("Timed out closing WebSocket for {}", participant);
        send_task.abort();
    }
    info!("WebSocket disconnected: {}", participant);
}

/// Hands one client frame to the lobby. `Break` ends the connection.
async fn dispatch(
    state: &AppState,
    participant: &ParticipantId,
    signal: ClientSignal,
) -> Result<ControlFlow<()>, LobbyError> {
    let participant = participant.clone();

    match signal {
        ClientSignal::Next => state.lobby.next(participant).await?,
        ClientSignal::Signal {
            kind,
            payload,
            to_id,
        } => state.lobby.signal(participant, kind, payload, to_id).await?,
        ClientSignal::Chat { text } => state.lobby.chat(participant, text).await?,
        ClientSignal::Leave => {
            info!("Participant {} is leaving", participant);
            state.lobby.disconnect(participant).await?;
            return Ok(ControlFlow::Break(()));
        }
    }

    Ok(ControlFlow::Continue(()))
}

// WebSocket handler: live heap measurements

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::models::MemoryMeasurement;
use crate::profiler::Profiler;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) async fn ws_memory(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let profiler = state.profiler.clone();
    ws.on_upgrade(move |socket| async move {
        let mut rx = profiler.subscribe();
        if let Err(e) = stream_memory(socket, &mut rx, &profiler).await {
            tracing::info!("Memory stream error: {}", e);
        }
    })
}

async fn send_text(socket: &mut WebSocket, json: String) -> bool {
    let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
    matches!(r, Ok(Ok(())))
}

async fn stream_memory(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<MemoryMeasurement>,
    profiler: &Profiler,
) -> anyhow::Result<()> {
    tracing::info!("Client connected to memory stream");

    let welcome = serde_json::json!({
        "type": "info",
        "running": profiler.is_running(),
        "capability": profiler.capability(),
        "sampleIntervalMs": profiler.config().sample_interval_ms,
    });
    if !send_text(&mut socket, serde_json::to_string(&welcome)?).await {
        return Ok(());
    }

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(measurement) => {
                        let json = serde_json::to_string(&serde_json::json!({
                            "type": "measurement",
                            "measurement": measurement,
                        }))?;
                        if !send_text(&mut socket, json).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/memory client lagged, skipped {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            // Client messages are ignored; reading them notices a close promptly.
            msg = socket.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if !matches!(r, Ok(Ok(()))) {
                    break;
                }
            }
        }
    }
    tracing::info!("Client disconnected from memory stream");
    Ok(())
}

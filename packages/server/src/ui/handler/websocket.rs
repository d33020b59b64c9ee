//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionHandle, ConnectionId, ConnectionIdFactory, OUTBOUND_QUEUE_CAPACITY, Outbound,
        Timestamp,
    },
    ui::state::AppState,
    usecase::ConnectionSession,
};

/// How long the writer may keep flushing after the reader side has finished
const WRITER_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Upgrade without credentials; authentication happens in-band.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sink, mut stream) = socket.split();

    // All writes to this socket go through the queue drained by the writer task
    let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    let handle = ConnectionHandle::new(ConnectionIdFactory::generate(), tx, Timestamp::now());
    let connection_id = handle.id().clone();
    tracing::info!(connection_id = %connection_id, "Connection opened");

    let mut session =
        ConnectionSession::new(handle, state.verifier.clone(), state.registry.clone());
    let mut writer = tokio::spawn(write_outbound(sink, rx, connection_id.clone()));
    let mut writer_done = false;

    let deadline = tokio::time::sleep(state.handshake_timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline, if !session.is_authenticated() => {
                session.expire();
                break;
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => session.handle_text(text.as_str()).await,
                Some(Ok(Message::Close(_))) | None => {
                    tracing::debug!(connection_id = %connection_id, "Peer closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(connection_id = %connection_id, "WebSocket read error: {}", e);
                    break;
                }
            },
            _ = &mut writer, if !writer_done => {
                writer_done = true;
                break;
            }
        }
    }

    session.close().await;

    // Dropping the last sender lets the writer flush queued frames and stop
    drop(session);
    if !writer_done && tokio::time::timeout(WRITER_FLUSH_TIMEOUT, &mut writer).await.is_err() {
        tracing::debug!(connection_id = %connection_id, "Writer did not finish in time, aborting");
        writer.abort();
    }
}

/// Drain the connection's outbound queue into the socket.
async fn write_outbound(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Outbound>,
    connection_id: ConnectionId,
) {
    while let Some(outbound) = rx.recv().await {
        match outbound {
            Outbound::Text(text) => {
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    tracing::debug!(connection_id = %connection_id, "WebSocket write error: {}", e);
                    return;
                }
            }
            Outbound::Close { code, reason } => {
                let frame = CloseFrame {
                    code,
                    reason: reason.into(),
                };
                if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                    tracing::debug!(connection_id = %connection_id, "Failed to send close frame: {}", e);
                }
                return;
            }
        }
    }

    let _ = sink.close().await;
}

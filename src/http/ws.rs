use super::state::AppState;
use crate::pipeline::{PersistRequest, TranscribeRequest};
use crate::session::{ServerMessage, Session};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const WARN_BACKLOG: &str = "Audio chunk dropped - processing backlog.";
const WARN_PROCESSING: &str = "Error processing audio chunk.";

/// GET /ws/transcribe
/// WebSocket endpoint for real-time audio transcription
pub async fn transcribe_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Per-connection session lifecycle:
/// Connecting -> Active -> Disconnecting -> Closed.
///
/// The inbound loop runs here; the outbound loop runs as a sibling
/// task draining the session's result channel. Whichever side fails
/// first funnels into the single teardown path at the bottom, and the
/// registry's idempotent unregister makes concurrent triggers converge
/// to exactly one cleanup.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sink, stream) = socket.split();

    // Connecting: register and announce the session id
    let (session, outbound_rx) = state.registry.register();
    let session_id = session.id;

    let outbound_task = tokio::spawn(outbound_loop(sink, outbound_rx, session_id));

    // The session only becomes Active once its init message is queued;
    // a connection that cannot hear its own id is torn down instead.
    if announce(&session) {
        info!("Session {} connected", session_id);

        // Active: pump inbound chunks until the transport ends
        inbound_loop(stream, &state, &session).await;
    } else {
        error!("Session {} failed to queue init message, closing", session_id);
    }

    // Disconnecting -> Closed: release everything exactly once
    state.registry.unregister(session_id);
    drop(session);
    if outbound_task.await.is_err() {
        error!("Session {} outbound task panicked", session_id);
    }
    info!("Session {} closed", session_id);
}

/// Queue the `session_init` message for the client.
fn announce(session: &Session) -> bool {
    session
        .try_send(ServerMessage::SessionInit {
            session_id: session.id.to_string(),
        })
        .is_ok()
}

/// Reads binary audio chunks and walks each one through
/// persist -> transcribe submission.
///
/// One chunk at a time: the persist reply is awaited (a cooperative
/// oneshot, never a thread-blocking wait) before the next chunk is
/// read, which keeps per-session ordering and bounds in-flight work.
async fn inbound_loop(mut stream: SplitStream<WebSocket>, state: &AppState, session: &Session) {
    while let Some(received) = stream.next().await {
        let message = match received {
            Ok(message) => message,
            Err(e) => {
                warn!("Session {} transport error: {}", session.id, e);
                break;
            }
        };

        let payload = match message {
            Message::Binary(payload) => payload,
            Message::Close(_) => {
                debug!("Session {} closed by client", session.id);
                break;
            }
            // Pings are answered by axum; text frames are not part of
            // the protocol and are ignored.
            Message::Ping(_) | Message::Pong(_) | Message::Text(_) => continue,
        };

        let timestamp = Utc::now().timestamp_micros() as f64 / 1_000_000.0;

        match process_chunk(state, session.id, payload, timestamp).await {
            Ok(()) => {}
            Err(warning) => {
                warn!("Session {} dropped chunk: {}", session.id, warning);
                // Best effort: if even the warning does not fit the
                // outbound channel, the client simply never hears
                // about this chunk.
                let _ = session.try_send(ServerMessage::Warning {
                    message: warning.to_string(),
                });
            }
        }
    }
}

/// Submit one chunk to the persistence stage, await its locator, then
/// hand it to the transcription stage. Returns the client-facing
/// warning text when the chunk had to be dropped.
async fn process_chunk(
    state: &AppState,
    session_id: Uuid,
    payload: Vec<u8>,
    timestamp: f64,
) -> Result<(), &'static str> {
    let (reply_tx, reply_rx) = oneshot::channel();

    let request = PersistRequest {
        session_id,
        payload: payload.clone(),
        timestamp,
        reply: reply_tx,
    };

    if let Err(e) = state.pipeline.submit_persist(request) {
        debug!("Persist submission rejected for {}: {}", session_id, e);
        return Err(WARN_BACKLOG);
    }

    let locator = match reply_rx.await {
        Ok(Ok(locator)) => locator,
        Ok(Err(e)) => {
            debug!("Persist failed for {}: {}", session_id, e);
            return Err(WARN_PROCESSING);
        }
        // Worker dropped the reply slot without answering (shutdown)
        Err(_) => return Err(WARN_PROCESSING),
    };

    let request = TranscribeRequest {
        session_id,
        payload,
        timestamp,
        locator,
    };

    state
        .pipeline
        .submit_transcribe(request)
        .map_err(|_| WARN_BACKLOG)
}

/// Drains the session's outbound channel onto the socket. Ends when
/// the channel closes (session unregistered and handle dropped) or the
/// transport write fails.
async fn outbound_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<ServerMessage>,
    session_id: Uuid,
) {
    while let Some(message) = outbound_rx.recv().await {
        let json = match serde_json::to_string(&message) {
            Ok(json) => json,
            Err(e) => {
                error!("Session {} failed to serialize message: {}", session_id, e);
                continue;
            }
        };

        if let Err(e) = sink.send(Message::Text(json)).await {
            warn!("Session {} outbound write failed: {}", session_id, e);
            break;
        }
    }

    let _ = sink.send(Message::Close(None)).await;
}

use crate::scan::{ControlCommand, ScanContext, ScanEvent, ScanSession, DEFAULT_STOP_GRACE};
use crate::store::SharedLookupStore;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Application state for web handlers
#[derive(Clone)]
pub struct AppState {
    pub scan: Arc<ScanContext>,
    /// Outbound event queue depth per connection
    pub event_buffer: usize,
    /// Bound on waiting for a scan loop to stop
    pub stop_grace: Duration,
    /// Number of open scan connections
    pub connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(scan: Arc<ScanContext>, event_buffer: usize) -> Self {
        Self {
            scan,
            event_buffer: event_buffer.max(1),
            stop_grace: DEFAULT_STOP_GRACE,
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_stop_grace(mut self, stop_grace: Duration) -> Self {
        self.stop_grace = stop_grace;
        self
    }

    pub fn store(&self) -> &Arc<SharedLookupStore> {
        &self.scan.store
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle WebSocket connection: one scan session per socket
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ScanEvent>(state.event_buffer);
    let mut session = ScanSession::new(state.scan.clone(), tx).with_stop_grace(state.stop_grace);
    let session_id = session.id();

    state.connections.fetch_add(1, Ordering::Relaxed);
    info!("WebSocket connected: session={}", session_id);

    // Forward scan events to the client, one text frame per event
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut send_done = false;
    loop {
        tokio::select! {
            message = receiver.next() => match message {
                Some(Ok(Message::Text(text))) => match ControlCommand::parse(text.as_str()) {
                    Ok(command) => {
                        debug!("Session {}: received {:?}", session_id, command);
                        session.handle(command).await;
                    }
                    Err(e) => {
                        warn!("Session {}: dropping malformed command: {}", session_id, e);
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    info!("Client closed connection");
                    break;
                }
                Some(Err(e)) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },
            _ = &mut send_task => {
                debug!("Send task completed");
                send_done = true;
                break;
            }
        }
    }

    // Drop the event receiver first so a loop blocked on a full queue wakes up
    if !send_done {
        send_task.abort();
        let _ = send_task.await;
    }
    session.disconnect().await;

    state.connections.fetch_sub(1, Ordering::Relaxed);
    info!("WebSocket disconnected: session={}", session_id);
}

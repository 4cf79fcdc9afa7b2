//! Connection manager
//!
//! Keeps exactly one connection to the assistant alive. A lost connection is
//! retried after a fixed delay, forever. Each attempt runs in its own pump
//! task that reports back through the dispatch channel; all decisions are made
//! here, on the dispatch loop.

use crate::event::{ConnectionEvent, ConnectionId, EventSender, OverlayEvent};
use crate::protocol::{parse_signal, StatusSignal};
use crate::state::SharedOverlayState;
use crate::timer::PendingTimer;
use crate::transport::{Frame, Transport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Owned handle to the live connection's pump
struct ConnectionHandle {
    id: ConnectionId,
    close_tx: Option<oneshot::Sender<()>>,
    _task: JoinHandle<()>,
}

impl ConnectionHandle {
    /// Ask the pump to close; it reports `Closed` when done
    fn request_close(&mut self) {
        if let Some(tx) = self.close_tx.take() {
            // Pump already finished if this fails; its `Closed` is queued
            let _ = tx.send(());
        }
    }
}

/// Owns the socket handle and the reconnect timer
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    endpoint: String,
    reconnect_delay: Duration,
    events: EventSender,
    state: SharedOverlayState,
    socket: Option<ConnectionHandle>,
    reconnect: Option<PendingTimer>,
    next_ticket: u64,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint: impl Into<String>,
        reconnect_delay: Duration,
        events: EventSender,
        state: SharedOverlayState,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            reconnect_delay,
            events,
            state,
            socket: None,
            reconnect: None,
            next_ticket: 0,
        }
    }

    /// Start a connection attempt
    ///
    /// Never fails here: open errors arrive later as `Error` + `Closed`.
    pub fn connect(&mut self) {
        if let Some(socket) = &self.socket {
            warn!("connect() with live connection {}, ignoring", socket.id);
            return;
        }

        // Connecting and counting down are mutually exclusive
        self.reconnect = None;

        let id = ConnectionId::new();
        let (close_tx, close_rx) = oneshot::channel();
        let task = tokio::spawn(pump(
            id,
            Arc::clone(&self.transport),
            self.endpoint.clone(),
            self.events.clone(),
            close_rx,
        ));

        self.state.write().mark_connecting();
        debug!("[{}] Connecting to {}", id, self.endpoint);

        self.socket = Some(ConnectionHandle {
            id,
            close_tx: Some(close_tx),
            _task: task,
        });
    }

    /// Route a pump event; returns a signal for the projector, if any
    pub fn handle_event(&mut self, id: ConnectionId, event: ConnectionEvent) -> Option<StatusSignal> {
        match event {
            ConnectionEvent::Opened => {
                self.on_open(id);
                None
            }
            ConnectionEvent::Message(raw) => self.on_message(id, &raw),
            ConnectionEvent::Error(error) => {
                self.on_error(id, &error);
                None
            }
            ConnectionEvent::Closed => {
                self.on_close(id);
                None
            }
        }
    }

    pub fn on_open(&mut self, id: ConnectionId) {
        if !self.is_current(id) {
            debug!("[{}] Open from stale connection, ignoring", id);
            return;
        }
        info!("[{}] Connected to voice assistant", id);
        self.state.write().mark_connected();
    }

    /// Parse a text frame
    ///
    /// Malformed and unrecognized payloads are logged and dropped.
    pub fn on_message(&mut self, id: ConnectionId, raw: &str) -> Option<StatusSignal> {
        if !self.is_current(id) {
            debug!("[{}] Message from stale connection, ignoring", id);
            return None;
        }

        match parse_signal(raw) {
            Ok(Some(signal)) => {
                debug!("[{}] Status: {}", id, signal.as_str());
                Some(signal)
            }
            Ok(None) => {
                debug!("[{}] Unrecognized status, ignoring: {}", id, raw);
                None
            }
            Err(e) => {
                warn!("[{}] Error parsing message: {}", id, e);
                None
            }
        }
    }

    /// Close the socket; the resulting `Closed` schedules the reconnect
    pub fn on_error(&mut self, id: ConnectionId, error: &str) {
        warn!("[{}] WebSocket error: {}", id, error);
        match self.socket.as_mut() {
            Some(socket) if socket.id == id => socket.request_close(),
            _ => debug!("[{}] Error from stale connection, ignoring", id),
        }
    }

    pub fn on_close(&mut self, id: ConnectionId) {
        if !self.is_current(id) {
            debug!("[{}] Close from stale connection, ignoring", id);
            return;
        }

        self.socket = None;
        info!("[{}] Disconnected from voice assistant", id);
        self.schedule_reconnect();
    }

    pub fn on_reconnect_elapsed(&mut self, ticket: u64) {
        let pending = self.reconnect.as_ref().map(PendingTimer::ticket);
        if pending != Some(ticket) {
            debug!("Stale reconnect timer {}, ignoring", ticket);
            return;
        }

        self.reconnect = None;
        debug!("Reconnect delay elapsed, reconnecting");
        self.connect();
    }

    /// Close the socket and cancel the reconnect timer
    ///
    /// Safe to call repeatedly and with nothing outstanding.
    pub fn teardown(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            debug!("[{}] Closing connection for teardown", socket.id);
            socket.request_close();
        }
        if self.reconnect.take().is_some() {
            debug!("Cancelled pending reconnect");
        }
        self.state.write().mark_disconnected();
    }

    /// Id of the live connection, if any
    pub fn current_id(&self) -> Option<ConnectionId> {
        self.socket.as_ref().map(|socket| socket.id)
    }

    pub fn has_pending_reconnect(&self) -> bool {
        self.reconnect.is_some()
    }

    fn is_current(&self, id: ConnectionId) -> bool {
        self.current_id() == Some(id)
    }

    fn schedule_reconnect(&mut self) {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        // Replacing the timer drops (aborts) any earlier one
        self.reconnect = Some(PendingTimer::schedule(
            ticket,
            self.reconnect_delay,
            self.events.clone(),
            OverlayEvent::ReconnectElapsed { ticket },
        ));
        self.state.write().mark_reconnecting();
        debug!("Reconnecting in {:?}", self.reconnect_delay);
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn emit(events: &EventSender, id: ConnectionId, event: ConnectionEvent) {
    // Receiver gone means the overlay was torn down
    let _ = events.send(OverlayEvent::Connection { id, event }).await;
}

/// Drive one connection attempt from connect to close
///
/// Reports exactly one `Closed`, whatever ends the connection.
async fn pump(
    id: ConnectionId,
    transport: Arc<dyn Transport>,
    endpoint: String,
    events: EventSender,
    mut close_rx: oneshot::Receiver<()>,
) {
    let connected = tokio::select! {
        _ = &mut close_rx => None,
        result = transport.connect(&endpoint) => Some(result),
    };

    let mut conn = match connected {
        None => {
            debug!("[{}] Close requested while connecting", id);
            emit(&events, id, ConnectionEvent::Closed).await;
            return;
        }
        Some(Err(e)) => {
            emit(&events, id, ConnectionEvent::Error(e.to_string())).await;
            emit(&events, id, ConnectionEvent::Closed).await;
            return;
        }
        Some(Ok(conn)) => conn,
    };

    emit(&events, id, ConnectionEvent::Opened).await;

    loop {
        tokio::select! {
            _ = &mut close_rx => {
                if let Err(e) = conn.close().await {
                    debug!("[{}] {}", id, e);
                }
                break;
            }
            frame = conn.next_frame() => match frame {
                Some(Ok(Frame::Text(text))) => {
                    emit(&events, id, ConnectionEvent::Message(text)).await;
                }
                Some(Ok(Frame::Binary(data))) => {
                    debug!("[{}] Discarding {} byte binary frame", id, data.len());
                }
                Some(Ok(Frame::Close)) | None => break,
                Some(Err(e)) => {
                    emit(&events, id, ConnectionEvent::Error(e.to_string())).await;
                    break;
                }
            },
        }
    }

    // Release the socket before anyone can react to the close
    drop(conn);
    emit(&events, id, ConnectionEvent::Closed).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::WsTransport;
    use tokio::sync::mpsc;

    fn manager() -> (ConnectionManager, SharedOverlayState) {
        let state = SharedOverlayState::new();
        let (tx, _rx) = mpsc::channel(8);
        let manager = ConnectionManager::new(
            Arc::new(WsTransport::new()),
            "ws://localhost:8000/ws",
            Duration::from_millis(3000),
            tx,
            state.clone(),
        );
        (manager, state)
    }

    #[test]
    fn test_teardown_with_nothing_outstanding() {
        let (mut manager, state) = manager();
        manager.teardown();
        manager.teardown();

        assert!(manager.current_id().is_none());
        assert!(!manager.has_pending_reconnect());
        assert_eq!(state.connection_status(), crate::state::ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_stale_events_are_ignored() {
        let (mut manager, state) = manager();
        let stale = ConnectionId::new();

        manager.on_close(stale);
        manager.on_error(stale, "reset");
        manager.on_open(stale);

        assert!(!manager.has_pending_reconnect());
        assert!(!state.connection_status().is_connected());
        assert!(manager
            .on_message(stale, r#"{"status":"listening"}"#)
            .is_none());
    }

    #[test]
    fn test_stale_reconnect_ticket_is_ignored() {
        let (mut manager, _state) = manager();
        manager.on_reconnect_elapsed(42);
        assert!(manager.current_id().is_none());
    }
}

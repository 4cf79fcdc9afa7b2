//! The overlay dispatch loop
//!
//! `Overlay` owns the connection manager and the status projector and feeds
//! them events one at a time from a single channel:
//! - **Pump tasks** report socket lifecycle and frames
//! - **Timers** report reconnect and hide expirations
//! - **Render layer** sends key presses and toggles via `OverlayHandle`
//!
//! Shutdown travels on its own signal so a full event queue cannot hold it
//! back.
//!
//! Every handler runs to completion before the next event is taken, so the
//! state writers never interleave. Production runs this on a current-thread
//! runtime.

use crate::config::OverlayConfig;
use crate::connection::ConnectionManager;
use crate::event::{EventReceiver, EventSender, KeyPress, OverlayEvent};
use crate::projector::StatusProjector;
use crate::state::{OverlayStateSnapshot, SharedOverlayState};
use crate::transport::Transport;
use crate::{OverlayError, Result};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Notify;
use tracing::{debug, info};

/// Called after each handled event (e.g. to request a repaint)
pub type RepaintHook = Box<dyn Fn() + Send + 'static>;

/// Handle for talking to a running overlay from the render layer or tests
#[derive(Clone)]
pub struct OverlayHandle {
    events: EventSender,
    shutdown: Arc<Notify>,
    state: SharedOverlayState,
    toggle_key: String,
}

impl OverlayHandle {
    fn send(&self, event: OverlayEvent) -> Result<()> {
        self.events.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => OverlayError::ChannelError("event queue full".to_string()),
            TrySendError::Closed(_) => {
                OverlayError::ChannelError("overlay is not running".to_string())
            }
        })
    }

    /// Forward a key press; the overlay decides whether it toggles
    pub fn send_key(&self, key: KeyPress) -> Result<()> {
        self.send(OverlayEvent::Key(key))
    }

    /// Toggle visibility without key filtering
    pub fn toggle(&self) -> Result<()> {
        self.send(OverlayEvent::Toggle)
    }

    /// Stop the dispatch loop
    ///
    /// Delivered even when the event queue is full. The loop stops before
    /// handling any further queued events.
    pub fn shutdown(&self) -> Result<()> {
        if self.events.is_closed() {
            return Err(OverlayError::ChannelError(
                "overlay is not running".to_string(),
            ));
        }
        // Stores a permit if the loop is busy, so the request is never lost
        self.shutdown.notify_one();
        Ok(())
    }

    /// Get the shared overlay state
    pub fn state(&self) -> &SharedOverlayState {
        &self.state
    }

    pub fn snapshot(&self) -> OverlayStateSnapshot {
        self.state.snapshot()
    }

    /// Configured toggle key name
    pub fn toggle_key(&self) -> &str {
        &self.toggle_key
    }

    /// Whether the dispatch loop has exited
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }
}

/// Owned overlay context: connection, projector and their shared state
pub struct Overlay {
    endpoint: String,
    events_rx: EventReceiver,
    shutdown: Arc<Notify>,
    connection: ConnectionManager,
    projector: StatusProjector,
    repaint: Option<RepaintHook>,
}

impl Overlay {
    /// Create an overlay with fresh state
    ///
    /// Returns the overlay and a handle for controlling it. Nothing connects
    /// until `run()` is awaited.
    pub fn new(
        config: &OverlayConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<(Self, OverlayHandle)> {
        Self::with_state(config, transport, SharedOverlayState::new())
    }

    /// Create an overlay around an existing shared state
    pub fn with_state(
        config: &OverlayConfig,
        transport: Arc<dyn Transport>,
        state: SharedOverlayState,
    ) -> Result<(Self, OverlayHandle)> {
        config.validate()?;

        let (events_tx, events_rx) = mpsc::channel(config.channel_buffer_size);

        let connection = ConnectionManager::new(
            transport,
            config.endpoint.clone(),
            config.reconnect_delay(),
            events_tx.clone(),
            state.clone(),
        );
        let projector = StatusProjector::new(
            state.clone(),
            config.hide_delay(),
            config.toggle_key.clone(),
            events_tx.clone(),
        );

        let shutdown = Arc::new(Notify::new());

        let handle = OverlayHandle {
            events: events_tx,
            shutdown: Arc::clone(&shutdown),
            state,
            toggle_key: config.toggle_key.clone(),
        };

        let overlay = Self {
            endpoint: config.endpoint.clone(),
            events_rx,
            shutdown,
            connection,
            projector,
            repaint: None,
        };

        Ok((overlay, handle))
    }

    /// Install a hook called after every handled event
    pub fn with_repaint_hook(mut self, hook: impl Fn() + Send + 'static) -> Self {
        self.repaint = Some(Box::new(hook));
        self
    }

    /// Connect and handle events until shutdown, then tear down
    pub async fn run(mut self) {
        info!("Overlay starting, assistant at {}", self.endpoint);
        self.connection.connect();
        self.notify();

        loop {
            let event = tokio::select! {
                biased;
                _ = self.shutdown.notified() => {
                    debug!("Shutdown requested");
                    break;
                }
                event = self.events_rx.recv() => event,
            };
            let Some(event) = event else { break };
            self.dispatch(event);
            self.notify();
        }

        // Reject handle sends from here on
        self.events_rx.close();

        self.teardown();
        self.notify();
        info!("Overlay stopped");
    }

    /// Handle one event
    fn dispatch(&mut self, event: OverlayEvent) {
        match event {
            OverlayEvent::Connection { id, event } => {
                if let Some(signal) = self.connection.handle_event(id, event) {
                    self.projector.apply_signal(signal);
                }
            }
            OverlayEvent::ReconnectElapsed { ticket } => {
                self.connection.on_reconnect_elapsed(ticket);
            }
            OverlayEvent::HideElapsed { ticket } => {
                self.projector.on_hide_elapsed(ticket);
            }
            OverlayEvent::Key(key) => {
                self.projector.handle_key(&key);
            }
            OverlayEvent::Toggle => {
                self.projector.handle_manual_toggle();
            }
        }
    }

    /// Close the socket and cancel every pending timer
    fn teardown(&mut self) {
        self.connection.teardown();
        self.projector.teardown();
    }

    fn notify(&self) {
        if let Some(hook) = &self.repaint {
            hook();
        }
    }
}

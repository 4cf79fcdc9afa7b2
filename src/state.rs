//! Overlay state shared with the render layer
//!
//! The dispatch loop is the only writer. The renderer takes snapshots through
//! `SharedOverlayState` and never holds the lock across a frame.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

/// What the assistant is currently doing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OverlayStatus {
    /// Waiting for the user to speak
    #[default]
    Listening,
    /// Working on a request
    Processing,
    /// Playing back a response
    Speaking,
}

impl OverlayStatus {
    /// Wire name of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayStatus::Listening => "listening",
            OverlayStatus::Processing => "processing",
            OverlayStatus::Speaking => "speaking",
        }
    }

    /// Text shown while the overlay is visible
    pub fn label(&self) -> &'static str {
        match self {
            OverlayStatus::Listening => "Listening...",
            OverlayStatus::Processing => "Thinking...",
            OverlayStatus::Speaking => "Speaking...",
        }
    }

    /// Secondary hint under the label, if any
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            OverlayStatus::Listening => Some("Speak Now"),
            _ => None,
        }
    }
}

impl std::fmt::Display for OverlayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayStatus::Listening => write!(f, "Listening"),
            OverlayStatus::Processing => write!(f, "Processing"),
            OverlayStatus::Speaking => write!(f, "Speaking"),
        }
    }
}

/// Connection to the assistant, for diagnostics only
///
/// This never feeds back into visibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection and nothing scheduled
    #[default]
    Disconnected,
    /// Connect attempt in flight
    Connecting,
    /// Connection open
    Connected,
    /// Waiting for the reconnect delay to elapse
    Reconnecting,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connecting => write!(f, "Connecting"),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Reconnecting => write!(f, "Reconnecting"),
        }
    }
}

/// Overlay state
///
/// `visible` and `status` are independent. The status is kept while hidden so
/// a quick re-activation does not flash a stale default.
#[derive(Clone, Debug, Default)]
pub struct OverlayState {
    /// Whether the overlay is shown
    pub visible: bool,
    /// Last active status
    pub status: OverlayStatus,
    /// Connection diagnostics
    pub connection: ConnectionStatus,
    /// When the current connection opened
    pub connected_since: Option<DateTime<Utc>>,
    /// Connect attempts since the last successful open
    pub reconnect_attempts: u64,
    /// When the last recognized server signal arrived
    pub last_signal_at: Option<DateTime<Utc>>,
}

impl OverlayState {
    /// Create a new default state (hidden, listening)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an immutable snapshot of current state
    pub fn snapshot(&self) -> OverlayStateSnapshot {
        OverlayStateSnapshot {
            visible: self.visible,
            status: self.status,
            connection: self.connection,
            connected_since: self.connected_since,
            reconnect_attempts: self.reconnect_attempts,
            last_signal_at: self.last_signal_at,
        }
    }

    // === State transitions ===

    /// Show the overlay with the given status
    pub fn activate(&mut self, status: OverlayStatus) {
        self.visible = true;
        self.status = status;
    }

    /// Hide the overlay, keeping the last status
    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Flip visibility; turning on always starts in `Listening`
    ///
    /// Returns the new visibility.
    pub fn toggle(&mut self) -> bool {
        if self.visible {
            self.hide();
        } else {
            self.activate(OverlayStatus::Listening);
        }
        self.visible
    }

    pub fn mark_connecting(&mut self) {
        self.connection = ConnectionStatus::Connecting;
        self.reconnect_attempts += 1;
    }

    pub fn mark_connected(&mut self) {
        self.connection = ConnectionStatus::Connected;
        self.connected_since = Some(Utc::now());
        self.reconnect_attempts = 0;
    }

    pub fn mark_reconnecting(&mut self) {
        self.connection = ConnectionStatus::Reconnecting;
        self.connected_since = None;
    }

    pub fn mark_disconnected(&mut self) {
        self.connection = ConnectionStatus::Disconnected;
        self.connected_since = None;
    }
}

/// Immutable snapshot of overlay state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayStateSnapshot {
    pub visible: bool,
    pub status: OverlayStatus,
    pub connection: ConnectionStatus,
    pub connected_since: Option<DateTime<Utc>>,
    pub reconnect_attempts: u64,
    pub last_signal_at: Option<DateTime<Utc>>,
}

/// Thread-safe shared overlay state
#[derive(Clone, Default)]
pub struct SharedOverlayState {
    inner: Arc<RwLock<OverlayState>>,
}

impl SharedOverlayState {
    /// Create a new shared state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a read lock on the state
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, OverlayState> {
        self.inner.read()
    }

    /// Get a write lock on the state
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, OverlayState> {
        self.inner.write()
    }

    /// Get a snapshot of current state (no lock held after return)
    pub fn snapshot(&self) -> OverlayStateSnapshot {
        self.inner.read().snapshot()
    }

    pub fn is_visible(&self) -> bool {
        self.inner.read().visible
    }

    pub fn status(&self) -> OverlayStatus {
        self.inner.read().status
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.inner.read().connection
    }
}

//! Events handled by the overlay's dispatch loop
//!
//! Every asynchronous source (socket pump, timers, key presses, shutdown)
//! turns into an `OverlayEvent` on one channel. The loop handles them one at a
//! time, so no handler ever interleaves with another.

use tokio::sync::mpsc;
use uuid::Uuid;

/// Sender half of the dispatch channel
pub type EventSender = mpsc::Sender<OverlayEvent>;

/// Receiver half of the dispatch channel
pub type EventReceiver = mpsc::Receiver<OverlayEvent>;

/// Identifies one connection attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First block is enough to tell attempts apart in logs
        let id = self.0.simple().to_string();
        write!(f, "{}", &id[..8])
    }
}

/// Lifecycle events reported by a connection pump
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Handshake completed
    Opened,
    /// Text frame received
    Message(String),
    /// Connect or read failed; a `Closed` always follows
    Error(String),
    /// Connection is gone; reported exactly once per attempt
    Closed,
}

/// A key press forwarded from the render layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPress {
    /// Key name, e.g. "Space"
    pub key: String,
    /// Auto-repeat from a held key
    pub repeat: bool,
    /// A text-entry control had keyboard focus
    pub text_entry_focused: bool,
}

impl KeyPress {
    /// A fresh press with no focused text entry
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            repeat: false,
            text_entry_focused: false,
        }
    }

    /// Mark this press as an auto-repeat
    pub fn repeated(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Mark this press as happening inside a text-entry control
    pub fn in_text_entry(mut self) -> Self {
        self.text_entry_focused = true;
        self
    }
}

/// Everything the dispatch loop reacts to
#[derive(Clone, Debug)]
pub enum OverlayEvent {
    /// Socket lifecycle or data
    Connection {
        id: ConnectionId,
        event: ConnectionEvent,
    },
    /// Reconnect delay elapsed
    ReconnectElapsed { ticket: u64 },
    /// Hide delay elapsed
    HideElapsed { ticket: u64 },
    /// Key press from the render layer
    Key(KeyPress),
    /// Manual toggle requested directly (already filtered by the caller)
    Toggle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_ids_are_unique() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 8);
    }

    #[test]
    fn test_key_press_builders() {
        let key = KeyPress::new("Space");
        assert!(!key.repeat);
        assert!(!key.text_entry_focused);

        let key = KeyPress::new("Space").repeated().in_text_entry();
        assert!(key.repeat);
        assert!(key.text_entry_focused);
    }
}

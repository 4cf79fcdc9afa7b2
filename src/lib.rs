//! Voice overlay - live status indicator for a local voice assistant
//!
//! Keeps one WebSocket connection to the assistant, reconnecting forever on
//! loss, and projects its status messages plus a manual toggle key into a
//! small `{visible, status}` state for rendering.

pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod overlay;
pub mod projector;
pub mod protocol;
pub mod state;
mod timer;
pub mod transport;
pub mod ui;

// Re-export error types
pub use error::{OverlayError, Result};

pub use config::OverlayConfig;
pub use event::{ConnectionEvent, ConnectionId, KeyPress, OverlayEvent};
pub use overlay::{Overlay, OverlayHandle};
pub use protocol::{parse_signal, StatusSignal};
pub use state::{
    ConnectionStatus, OverlayState, OverlayStateSnapshot, OverlayStatus, SharedOverlayState,
};
pub use transport::{Connection, Frame, Transport, WsTransport};

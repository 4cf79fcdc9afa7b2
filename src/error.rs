//! Error types for the voice overlay
//!
//! Nothing in the overlay is fatal at runtime: connection and payload errors
//! are logged and recovered locally. These types exist so the pieces that can
//! fail (transport, config, channels) report through one enum.

use thiserror::Error;

/// Overlay errors
#[derive(Error, Debug, Clone)]
pub enum OverlayError {
    /// Could not open a connection to the assistant endpoint
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// An established connection failed while reading or closing
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Inbound payload was not a valid status message
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Channel communication error
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File system I/O error
    #[error("IO error: {0}")]
    IOError(String),

    /// Window or render shell error
    #[error("UI error: {0}")]
    UiError(String),
}

impl From<std::io::Error> for OverlayError {
    fn from(e: std::io::Error) -> Self {
        OverlayError::IOError(e.to_string())
    }
}

impl OverlayError {
    /// Check if this error is recoverable
    ///
    /// Recoverable errors are handled inside the overlay (retry or discard).
    /// The rest mean the overlay cannot keep running as configured.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The assistant comes and goes; we retry forever
            OverlayError::ConnectionError(_) => true,
            OverlayError::TransportError(_) => true,
            // Bad messages are dropped
            OverlayError::MalformedPayload(_) => true,
            // The dispatch loop is gone
            OverlayError::ChannelError(_) => false,
            OverlayError::ConfigError(_) => false,
            OverlayError::IOError(_) => false,
            OverlayError::UiError(_) => false,
        }
    }

    /// Get a user-friendly description of the error
    pub fn user_message(&self) -> String {
        match self {
            OverlayError::ConnectionError(_) | OverlayError::TransportError(_) => {
                "Voice assistant is not reachable. Retrying...".to_string()
            }
            OverlayError::MalformedPayload(_) => {
                "Received an unexpected message from the voice assistant.".to_string()
            }
            OverlayError::ChannelError(_) => {
                "Internal communication error. Please restart the overlay.".to_string()
            }
            OverlayError::ConfigError(_) => {
                "Configuration error. Please check the overlay settings.".to_string()
            }
            OverlayError::IOError(_) => "File system error occurred.".to_string(),
            OverlayError::UiError(_) => "The overlay window could not be shown.".to_string(),
        }
    }
}

/// Result type alias for overlay operations
pub type Result<T> = std::result::Result<T, OverlayError>;

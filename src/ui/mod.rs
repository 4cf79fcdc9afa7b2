//! Render shell for the overlay
//!
//! A thin egui/eframe window: paints the `{visible, status}` pair and forwards
//! the toggle key. No animation.

mod app;
mod theme;
mod view;

pub use app::OverlayApp;
pub use theme::Theme;
pub use view::OverlayView;

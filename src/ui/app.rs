//! Overlay window and eframe integration
//!
//! The window only reads snapshots and forwards key presses. All state
//! changes happen on the overlay's runtime thread.

use crate::event::KeyPress;
use crate::overlay::OverlayHandle;
use crate::ui::theme::Theme;
use crate::ui::view::OverlayView;
use egui::CentralPanel;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Overlay window
pub struct OverlayApp {
    handle: OverlayHandle,
    theme: Theme,
    /// Thread running the overlay's dispatch loop
    runtime: Option<JoinHandle<()>>,
}

impl OverlayApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        handle: OverlayHandle,
        runtime: JoinHandle<()>,
    ) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);

        Self {
            handle,
            theme,
            runtime: Some(runtime),
        }
    }

    /// Forward fresh key-down events to the overlay
    fn forward_keys(&self, ctx: &egui::Context) {
        let text_entry_focused = ctx.memory(|m| m.focused().is_some());
        let presses: Vec<KeyPress> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        repeat,
                        ..
                    } => Some(KeyPress {
                        key: key.name().to_string(),
                        repeat: *repeat,
                        text_entry_focused,
                    }),
                    _ => None,
                })
                .collect()
        });

        for press in presses {
            if let Err(e) = self.handle.send_key(press) {
                warn!("Dropping key press: {}", e);
            }
        }
    }
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.forward_keys(ctx);

        let snapshot = self.handle.snapshot();
        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary))
            .show(ctx, |ui| {
                OverlayView::new(&snapshot, &self.theme, self.handle.toggle_key()).show(ui);
            });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Overlay window closing");
        if let Err(e) = self.handle.shutdown() {
            debug!("Shutdown not delivered: {}", e);
        }
        if let Some(runtime) = self.runtime.take() {
            if runtime.join().is_err() {
                warn!("Overlay runtime thread panicked");
            }
        }
    }
}

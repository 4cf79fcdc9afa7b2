//! Status view painted from a state snapshot

use crate::state::{ConnectionStatus, OverlayStateSnapshot, OverlayStatus};
use crate::ui::theme::Theme;
use egui::{RichText, Ui, WidgetInfo, WidgetType};

/// Read-only view of the overlay state
pub struct OverlayView<'a> {
    snapshot: &'a OverlayStateSnapshot,
    theme: &'a Theme,
    toggle_key: &'a str,
}

impl<'a> OverlayView<'a> {
    pub fn new(snapshot: &'a OverlayStateSnapshot, theme: &'a Theme, toggle_key: &'a str) -> Self {
        Self {
            snapshot,
            theme,
            toggle_key,
        }
    }

    pub fn show(self, ui: &mut Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(self.theme.spacing);

            if self.snapshot.visible {
                self.show_status(ui);
            } else {
                let hint = format!("Press [{}] to talk", self.toggle_key);
                let response = ui.label(RichText::new(&hint).size(12.0).color(self.theme.text_muted));
                response.widget_info(|| WidgetInfo::labeled(WidgetType::Label, true, &hint));
            }

            ui.add_space(self.theme.spacing);
            self.show_connection(ui);
        });
    }

    fn show_status(&self, ui: &mut Ui) {
        let status = self.snapshot.status;
        let accent = match status {
            OverlayStatus::Speaking => self.theme.speaking,
            _ => self.theme.primary,
        };

        egui::Frame::none()
            .fill(self.theme.bg_card)
            .rounding(self.theme.card_rounding)
            .stroke(egui::Stroke::new(2.0, accent))
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                let label = status.label();
                let response = ui.label(
                    RichText::new(label)
                        .size(18.0)
                        .strong()
                        .color(self.theme.text_primary),
                );
                response.widget_info(|| WidgetInfo::labeled(WidgetType::Label, true, label));

                if let Some(hint) = status.hint() {
                    let response = ui.label(
                        RichText::new(hint.to_uppercase())
                            .size(11.0)
                            .color(self.theme.text_muted),
                    );
                    response.widget_info(|| WidgetInfo::labeled(WidgetType::Label, true, hint));
                }
            });
    }

    fn show_connection(&self, ui: &mut Ui) {
        let connection = self.snapshot.connection;
        let color = match connection {
            ConnectionStatus::Connected => self.theme.connected,
            ConnectionStatus::Connecting | ConnectionStatus::Reconnecting => self.theme.connecting,
            ConnectionStatus::Disconnected => self.theme.disconnected,
        };

        let text = format!("Connection: {}", connection);
        let response = ui.label(RichText::new(format!("● {}", connection)).size(10.0).color(color));
        response.widget_info(|| WidgetInfo::labeled(WidgetType::Label, true, &text));
    }
}

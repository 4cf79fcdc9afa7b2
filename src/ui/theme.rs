//! Theme and styling for the overlay window

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Vec2, Visuals};

/// Overlay theme configuration
#[derive(Clone, Debug)]
pub struct Theme {
    /// Accent for listening/processing
    pub primary: Color32,
    /// Accent while speaking
    pub speaking: Color32,
    /// Connection indicator colors
    pub connected: Color32,
    pub connecting: Color32,
    pub disconnected: Color32,

    /// Background colors
    pub bg_primary: Color32,
    pub bg_card: Color32,

    /// Text colors
    pub text_primary: Color32,
    pub text_muted: Color32,

    /// Border radius for the status card
    pub card_rounding: Rounding,

    /// Standard spacing
    pub spacing: f32,
    /// Small spacing
    pub spacing_sm: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Create a dark theme
    pub fn dark() -> Self {
        Self {
            primary: Color32::from_rgb(99, 102, 241),   // Indigo
            speaking: Color32::from_rgb(34, 197, 94),   // Green
            connected: Color32::from_rgb(34, 197, 94),  // Green
            connecting: Color32::from_rgb(234, 179, 8), // Yellow
            disconnected: Color32::from_rgb(239, 68, 68), // Red

            bg_primary: Color32::from_rgb(10, 10, 12),
            bg_card: Color32::from_rgba_unmultiplied(0, 0, 0, 204),

            text_primary: Color32::from_rgb(249, 250, 251),
            text_muted: Color32::from_rgba_unmultiplied(255, 255, 255, 77),

            card_rounding: Rounding::same(16.0),

            spacing: 16.0,
            spacing_sm: 8.0,
        }
    }

    /// Apply this theme to egui
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = Visuals::dark();

        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_card;
        visuals.window_rounding = self.card_rounding;
        visuals.window_stroke = Stroke::new(1.0, Color32::from_white_alpha(26));
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text_muted);

        ctx.set_visuals(visuals);

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = Vec2::splat(self.spacing_sm);
        style.spacing.window_margin = egui::Margin::same(self.spacing);

        style.text_styles.insert(
            egui::TextStyle::Heading,
            FontId::new(20.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Small,
            FontId::new(11.0, FontFamily::Proportional),
        );

        ctx.set_style(style);
    }
}

use eframe::egui::{self, Color32, RichText};

use crate::core::{output::OutputSink, registry::PortSelection, Severity};

pub const ORANGE: Color32 = Color32::from_rgb(255, 140, 0);
pub const RED: Color32 = Color32::from_rgb(220, 50, 47);
pub const YELLOW: Color32 = Color32::from_rgb(200, 170, 0);
pub const BLUE: Color32 = Color32::from_rgb(38, 139, 210);
pub const GREEN: Color32 = Color32::from_rgb(40, 160, 60);

/// Pane color for a severity; plain text keeps the theme color.
pub fn severity_color(severity: Severity) -> Option<Color32> {
    match severity {
        Severity::Critical => Some(ORANGE),
        Severity::Error => Some(RED),
        Severity::Warning => Some(YELLOW),
        Severity::Info => Some(BLUE),
        Severity::Success => Some(GREEN),
        Severity::Plain => None,
    }
}

/// Monospace text styled for its severity.
pub fn styled(text: &str, severity: Severity) -> RichText {
    let mut text = RichText::new(text).monospace();
    if let Some(color) = severity_color(severity) {
        text = text.color(color);
    }
    if matches!(
        severity,
        Severity::Critical | Severity::Error | Severity::Success
    ) {
        text = text.strong();
    }
    text
}

pub fn port_combo(ui: &mut egui::Ui, id: &str, selection: &mut PortSelection) {
    let selected_text = if selection.selected.is_empty() {
        "Select port...".to_string()
    } else {
        selection.selected.clone()
    };

    egui::ComboBox::from_id_salt(id)
        .selected_text(selected_text)
        .width(ui.available_width().min(320.0))
        .show_ui(ui, |ui| {
            for port in &selection.available {
                ui.selectable_value(&mut selection.selected, port.clone(), port);
            }
        });
}

/// Scrollback of one pane. Follows the newest row while the user is at the
/// bottom.
pub fn log_view(ui: &mut egui::Ui, id: &str, sink: &mut OutputSink) {
    let scroll_to_end = sink.take_scroll_request();

    egui::Frame::group(ui.style()).show(ui, |ui| {
        egui::ScrollArea::vertical()
            .id_salt(id)
            .stick_to_bottom(true)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for row in sink.rows() {
                    ui.horizontal_wrapped(|ui| {
                        ui.spacing_mut().item_spacing.x = 0.0;
                        for segment in row {
                            ui.label(styled(segment.text, segment.severity));
                        }
                    });
                }
                if scroll_to_end {
                    ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                }
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn only_plain_text_keeps_the_theme_color() {
        for severity in Severity::iter() {
            let colored = severity_color(severity).is_some();
            assert_eq!(colored, severity != Severity::Plain, "{}", severity.as_ref());
        }
    }
}

//! Error dialog.

use eframe::egui;

use crate::core::error::AppError;

/// Actions that can be triggered from the error dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDialogAction {
    /// Retry the failed operation
    Retry,
    /// Dismiss the dialog
    Close,
}

/// State of the error dialog.
#[derive(Debug, Clone, Default)]
pub struct ErrorDialogState {
    /// The error being shown; the dialog is open while this is set
    error: Option<AppError>,
    /// Whether the details section is expanded
    details_expanded: bool,
}

impl ErrorDialogState {
    /// Open the dialog for `error`.
    pub fn show(&mut self, error: AppError) {
        self.error = Some(error);
        self.details_expanded = false;
    }

    /// Close the dialog.
    pub fn close(&mut self) {
        self.error = None;
        self.details_expanded = false;
    }

    /// The error being shown, if the dialog is open.
    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    /// Render the dialog and return the action taken, if any.
    pub fn render(&mut self, ctx: &egui::Context) -> Option<ErrorDialogAction> {
        let error = self.error.as_ref()?;
        let title = error.dialog_title();
        let brief = error.brief_description();
        let detailed = error.detailed_info();
        let supports_retry = error.supports_retry();
        let path = error.file_path().map(|p| p.display().to_string());

        let mut action: Option<ErrorDialogAction> = None;

        egui::Window::new(format!("⚠ {}", title))
            .id(egui::Id::new("error_dialog"))
            .collapsible(false)
            .resizable(true)
            .default_width(420.0)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.label(egui::RichText::new(&brief).size(14.0));
                if let Some(path) = &path {
                    ui.weak(path);
                }
                ui.add_space(12.0);

                let header = if self.details_expanded {
                    "▼ Details"
                } else {
                    "▶ Details"
                };
                if ui.add(egui::Button::new(header).frame(false)).clicked() {
                    self.details_expanded = !self.details_expanded;
                }
                if self.details_expanded {
                    egui::Frame::new()
                        .fill(egui::Color32::from_gray(30))
                        .inner_margin(8.0)
                        .corner_radius(4.0)
                        .show(ui, |ui| {
                            ui.monospace(&detailed);
                        });
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("📋 Copy Error").clicked() {
                        ui.ctx().copy_text(detailed.clone());
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Close").clicked() {
                            action = Some(ErrorDialogAction::Close);
                        }
                        if supports_retry && ui.button("🔄 Retry").clicked() {
                            action = Some(ErrorDialogAction::Retry);
                        }
                    });
                });
            });

        if action.is_some() {
            self.close();
        }
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_show_and_close() {
        let mut state = ErrorDialogState::default();
        assert!(state.error().is_none());

        state.show(AppError::FileNotFound {
            path: PathBuf::from("/test/events.json"),
        });
        assert!(state.error().is_some());
        assert!(!state.details_expanded);

        state.close();
        assert!(state.error().is_none());
    }
}

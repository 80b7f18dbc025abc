//! Preview controls module.
//!
//! Stands in for the paired preview player: shows what the timeline last
//! reported through its change callback and sends seek requests back.

use chrono::{DateTime, Local, Utc};
use eframe::egui;

use crate::core::layout::EventBlock;
use crate::core::marker::MarkerChange;

/// Seek offsets offered by the panel, in seconds into the current event.
pub const SEEK_OFFSETS: &[i64] = &[0, 5, 10, 30];

/// User actions that can be triggered from the controls panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    /// Focus the first event
    FocusFirst,
    /// Focus the event before the current one
    FocusPrevious,
    /// Focus the event after the current one
    FocusNext,
    /// Focus the most recent event
    FocusLast,
    /// Seek to an offset within the current event
    SeekWithinEvent(i64),
    /// Toggle display-only mode
    SetDisplayOnly(bool),
    /// Re-run the layout so ongoing events catch up with the clock
    Refresh,
}

/// What the preview side last heard from the timeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewState {
    /// Current event as last reported
    pub event: Option<EventBlock>,
    /// Marker time as last reported
    pub marker_time: Option<DateTime<Utc>>,
    /// Whether the last report was a settled seek
    pub seek_complete: bool,
    /// Number of reports received
    pub notifications: u64,
}

impl PreviewState {
    /// Record a change notification.
    pub fn apply(&mut self, change: &MarkerChange) {
        self.event = change.event.clone();
        self.marker_time = change.marker_time;
        self.seek_complete = change.seek_complete;
        self.notifications += 1;
    }

    /// One-line description of the reported position.
    pub fn summary(&self) -> String {
        let time = self
            .marker_time
            .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string());
        let event = self
            .event
            .as_ref()
            .map(|e| format!("{} #{}", e.event.label, e.id()))
            .unwrap_or_else(|| "none".to_string());
        let status = if self.seek_complete { "settled" } else { "scrubbing" };
        format!("{} | event: {} | {}", time, event, status)
    }
}

/// Renders the preview controls and returns any actions triggered by user
/// interaction.
pub struct ControlsRenderer<'a> {
    /// Whether controls should be enabled
    enabled: bool,
    /// Whether the timeline is display-only
    display_only: bool,
    /// Last reported position
    preview: &'a PreviewState,
}

impl<'a> ControlsRenderer<'a> {
    /// Create a new controls renderer.
    pub fn new(enabled: bool, display_only: bool, preview: &'a PreviewState) -> Self {
        Self {
            enabled,
            display_only,
            preview,
        }
    }

    /// Render the controls and return any triggered action.
    pub fn render(&self, ui: &mut egui::Ui) -> Option<ControlAction> {
        let mut action: Option<ControlAction> = None;

        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                action = self.render_navigation_buttons(ui).or(action);
                ui.separator();
                action = self.render_seek_buttons(ui).or(action);
                ui.separator();
                action = self.render_toggles(ui).or(action);
            });

            ui.add_space(4.0);

            ui.horizontal(|ui| {
                ui.label("Preview:");
                ui.monospace(self.preview.summary());
            });
        });

        action
    }

    /// Render event navigation buttons.
    fn render_navigation_buttons(&self, ui: &mut egui::Ui) -> Option<ControlAction> {
        let mut action: Option<ControlAction> = None;

        ui.add_enabled_ui(self.enabled, |ui| {
            if ui.button("⏮").on_hover_text("First event (Home)").clicked() {
                action = Some(ControlAction::FocusFirst);
            }
            if ui.button("⏪").on_hover_text("Previous event (←)").clicked() {
                action = Some(ControlAction::FocusPrevious);
            }
            if ui.button("⏩").on_hover_text("Next event (→)").clicked() {
                action = Some(ControlAction::FocusNext);
            }
            if ui.button("⏭").on_hover_text("Latest event (End)").clicked() {
                action = Some(ControlAction::FocusLast);
            }
        });

        action
    }

    /// Render the seek-within-event buttons.
    fn render_seek_buttons(&self, ui: &mut egui::Ui) -> Option<ControlAction> {
        let mut action: Option<ControlAction> = None;
        let has_event = self.preview.event.is_some();

        ui.add_enabled_ui(self.enabled && has_event, |ui| {
            ui.label("Seek:");
            for &offset in SEEK_OFFSETS {
                if ui
                    .button(format!("+{}s", offset))
                    .on_hover_text("Seek within the current event")
                    .clicked()
                {
                    action = Some(ControlAction::SeekWithinEvent(offset));
                }
            }
        });

        action
    }

    /// Render the display-only toggle and refresh button.
    fn render_toggles(&self, ui: &mut egui::Ui) -> Option<ControlAction> {
        let mut action: Option<ControlAction> = None;

        ui.add_enabled_ui(self.enabled, |ui| {
            let mut display_only = self.display_only;
            if ui
                .checkbox(&mut display_only, "Display only")
                .on_hover_text("Ignore scrolling on the timeline")
                .changed()
            {
                action = Some(ControlAction::SetDisplayOnly(display_only));
            }
            if ui
                .button("⟳ Refresh")
                .on_hover_text("Extend ongoing events to now")
                .clicked()
            {
                action = Some(ControlAction::Refresh);
            }
        });

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::{DetectionEvent, DetectionLabel};
    use crate::core::layout::layout;

    #[test]
    fn test_preview_state_records_changes() {
        let events = [DetectionEvent::new("9", DetectionLabel::Dog, 1000, Some(1010))];
        let block = layout(&events, 0, DateTime::from_timestamp(0, 0).unwrap())
            .unwrap()
            .remove(0);

        let mut preview = PreviewState::default();
        preview.apply(&MarkerChange {
            event: None,
            marker_time: Some(block.start_time),
            seek_complete: false,
        });
        preview.apply(&MarkerChange {
            event: Some(block.clone()),
            marker_time: Some(block.start_time),
            seek_complete: true,
        });

        assert_eq!(preview.notifications, 2);
        assert!(preview.seek_complete);
        assert_eq!(preview.event, Some(block));
        assert!(preview.summary().contains("dog #9"));
        assert!(preview.summary().contains("settled"));
    }

    #[test]
    fn test_empty_preview_summary() {
        let summary = PreviewState::default().summary();
        assert!(summary.contains("--:--:--"));
        assert!(summary.contains("event: none"));
    }
}

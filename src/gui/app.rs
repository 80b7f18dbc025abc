//! Main application state and GUI logic.
//!
//! Hosts the timeline view: loads event files, owns the settings, and wires
//! the preview controls to the timeline's seek input and change callback.

use eframe::egui;
use log::{info, warn};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::core::config::AppSettings;
use crate::core::error::{self, AppError};
use crate::core::parser;

use super::controls::{ControlAction, ControlsRenderer, PreviewState};
use super::dialogs::{ErrorDialogAction, ErrorDialogState};
use super::timeline::TimelineView;

/// Accepted event file extensions.
const EVENT_FILE_EXTENSIONS: &[&str] = &["json"];

/// Application state indicating the current loading status.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum AppState {
    /// No file has been loaded yet
    #[default]
    NoFileLoaded,
    /// Events are loaded and the timeline is shown
    Ready,
}

/// Kind of status message to display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusKind {
    /// Success message (shown in green)
    Success,
    /// Error message (shown in red)
    Error,
}

/// A status message with its kind and timestamp.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    /// The message text
    pub text: String,
    /// Kind of message (success/error)
    pub kind: StatusKind,
    /// When the message was created (for auto-dismiss)
    pub created_at: std::time::Instant,
}

impl StatusMessage {
    /// Duration to show status messages before auto-dismissing.
    const DISPLAY_DURATION: std::time::Duration = std::time::Duration::from_secs(5);

    /// Create a new status message.
    pub fn new(text: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            text: text.into(),
            kind,
            created_at: std::time::Instant::now(),
        }
    }

    /// Check if the message should still be displayed.
    pub fn is_visible(&self) -> bool {
        self.created_at.elapsed() < Self::DISPLAY_DURATION
    }
}

/// Main application state and GUI logic.
pub struct DetectionTimelineApp {
    /// Current application state
    state: AppState,
    /// Timeline of the loaded events
    timeline: TimelineView,
    /// Last position reported by the timeline
    preview: Rc<RefCell<PreviewState>>,
    /// Camera name from the loaded file
    camera: Option<String>,
    /// Path to the currently loaded file
    loaded_file_path: Option<PathBuf>,
    /// Path of the last failed load, for retry
    failed_path: Option<PathBuf>,
    /// Status message to display
    status_message: Option<StatusMessage>,
    /// Persistent settings
    settings: AppSettings,
    /// Error dialog
    error_dialog: ErrorDialogState,
}

impl DetectionTimelineApp {
    /// Create a new application instance.
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings = AppSettings::load();

        let mut timeline = TimelineView::new(settings.timing.marker_timing());
        timeline.set_marker_events_disabled(settings.disable_marker_events);

        let preview = Rc::new(RefCell::new(PreviewState::default()));
        let sink = Rc::clone(&preview);
        timeline.on_change(move |change| {
            log::trace!(
                "marker change: {:?} seek_complete={}",
                change.marker_time,
                change.seek_complete
            );
            sink.borrow_mut().apply(change);
        });

        Self {
            state: AppState::NoFileLoaded,
            timeline,
            preview,
            camera: None,
            loaded_file_path: None,
            failed_path: None,
            status_message: None,
            settings,
            error_dialog: ErrorDialogState::default(),
        }
    }

    /// Open a file dialog and load the selected event file.
    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Detection events", EVENT_FILE_EXTENSIONS)
            .set_title("Open Event File")
            .pick_file()
        {
            self.load_file(path);
        }
    }

    /// Load an event file, reporting failures through the error dialog.
    fn load_file(&mut self, path: PathBuf) {
        match read_event_file(&path) {
            Ok(file) => {
                let event_count = file.events.len();
                info!("loaded {} events from {}", event_count, path.display());

                *self.preview.borrow_mut() = PreviewState::default();
                self.camera = file.camera;
                self.timeline.set_events(file.events);
                self.state = AppState::Ready;
                self.failed_path = None;
                self.status_message = Some(StatusMessage::new(
                    format!("Loaded: {} ({} events)", error::display_name(&path), event_count),
                    StatusKind::Success,
                ));

                self.settings.add_recent_file(path.clone());
                self.save_settings();
                self.loaded_file_path = Some(path);
            }
            Err(e) => {
                warn!("failed to load {}: {}", path.display(), e.brief_description());
                self.status_message = Some(StatusMessage::new(
                    e.brief_description(),
                    StatusKind::Error,
                ));
                self.failed_path = Some(path);
                self.error_dialog.show(e);
            }
        }
    }

    /// Persist settings, surfacing failures in the error dialog.
    fn save_settings(&mut self) {
        if let Err(e) = self.settings.save() {
            warn!("{}", e.brief_description());
            self.error_dialog.show(e);
        }
    }

    /// Handle a control action triggered by the controls panel or keyboard.
    fn handle_control_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::FocusFirst => {
                self.timeline.focus_block(0);
            }
            ControlAction::FocusPrevious => {
                self.timeline.focus_adjacent(-1);
            }
            ControlAction::FocusNext => {
                self.timeline.focus_adjacent(1);
            }
            ControlAction::FocusLast => {
                let last = self.timeline.blocks().len().saturating_sub(1);
                self.timeline.focus_block(last);
            }
            ControlAction::SeekWithinEvent(offset) => {
                self.timeline.seek_by_offset(offset);
            }
            ControlAction::SetDisplayOnly(display_only) => {
                self.timeline.set_marker_events_disabled(display_only);
                self.settings.disable_marker_events = display_only;
                self.save_settings();
            }
            ControlAction::Refresh => {
                self.timeline.recompute();
            }
        }
    }

    /// Map keyboard shortcuts to control actions.
    fn handle_keyboard_shortcuts(&self, ctx: &egui::Context) -> Option<ControlAction> {
        if self.state != AppState::Ready || self.error_dialog.error().is_some() {
            return None;
        }

        ctx.input(|i| {
            if i.key_pressed(egui::Key::Home) {
                Some(ControlAction::FocusFirst)
            } else if i.key_pressed(egui::Key::End) {
                Some(ControlAction::FocusLast)
            } else if i.key_pressed(egui::Key::ArrowLeft) {
                Some(ControlAction::FocusPrevious)
            } else if i.key_pressed(egui::Key::ArrowRight) {
                Some(ControlAction::FocusNext)
            } else {
                None
            }
        })
    }
}

impl eframe::App for DetectionTimelineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(action) = self.handle_keyboard_shortcuts(ctx) {
            self.handle_control_action(action);
        }

        self.render_toolbar(ctx);
        self.render_controls(ctx);
        self.render_timeline(ctx);

        match self.error_dialog.render(ctx) {
            Some(ErrorDialogAction::Retry) => {
                if let Some(path) = self.failed_path.take() {
                    self.load_file(path);
                }
            }
            Some(ErrorDialogAction::Close) | None => {}
        }
    }
}

impl DetectionTimelineApp {
    /// Render the top toolbar: file loading, recent files and status.
    fn render_toolbar(&mut self, ctx: &egui::Context) {
        let mut open_path: Option<PathBuf> = None;
        let mut clear_recent = false;

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Detection Timeline");
                ui.separator();

                if ui.button("📂 Open File").clicked() {
                    self.open_file_dialog();
                }

                ui.menu_button("Recent", |ui| {
                    if self.settings.recent_files.is_empty() {
                        ui.label("(none)");
                    }
                    for path in &self.settings.recent_files {
                        if ui.button(error::display_name(path)).clicked() {
                            open_path = Some(path.clone());
                            ui.close();
                        }
                    }
                    if !self.settings.recent_files.is_empty() {
                        ui.separator();
                        if ui.button("Clear").clicked() {
                            clear_recent = true;
                            ui.close();
                        }
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.render_status_message(ui);
                });
            });
        });

        if clear_recent {
            self.settings.clear_recent_files();
            self.save_settings();
        }
        if let Some(path) = open_path {
            self.load_file(path);
        }
    }

    /// Render the status message if one is active.
    fn render_status_message(&mut self, ui: &mut egui::Ui) {
        if self
            .status_message
            .as_ref()
            .is_some_and(|msg| !msg.is_visible())
        {
            self.status_message = None;
            return;
        }

        let Some(msg) = &self.status_message else {
            return;
        };
        let color = match msg.kind {
            StatusKind::Success => self.settings.colors.status_success_color(),
            StatusKind::Error => self.settings.colors.status_error_color(),
        };
        let text = msg.text.clone();

        let mut dismiss = false;
        ui.horizontal(|ui| {
            if ui.small_button("✕").clicked() {
                dismiss = true;
            }
            ui.colored_label(color, text);
        });
        if dismiss {
            self.status_message = None;
        }
    }

    /// Render the bottom preview controls.
    fn render_controls(&mut self, ctx: &egui::Context) {
        let enabled = self.state == AppState::Ready;
        let display_only = self.timeline.controller().marker_events_disabled();
        let mut action: Option<ControlAction> = None;

        egui::TopBottomPanel::bottom("controls")
            .min_height(60.0)
            .show(ctx, |ui| {
                let preview = self.preview.borrow();
                action = ControlsRenderer::new(enabled, display_only, &preview).render(ui);
            });

        if let Some(action) = action {
            self.handle_control_action(action);
        }
    }

    /// Render the central timeline area.
    fn render_timeline(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| match self.state {
            AppState::NoFileLoaded => {
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.heading("📁 No File Loaded");
                    ui.add_space(10.0);
                    ui.label("Use \"Open File\" to load a detection event file (.json).");
                });
            }
            AppState::Ready => {
                ui.horizontal(|ui| {
                    if let Some(path) = &self.loaded_file_path {
                        ui.label(format!("File: {}", error::display_name(path)));
                        ui.separator();
                    }
                    if let Some(camera) = &self.camera {
                        ui.label(format!("Camera: {}", camera));
                        ui.separator();
                    }
                    let events = self.timeline.events();
                    let ongoing = events.iter().filter(|e| e.is_ongoing()).count();
                    ui.label(format!("Events: {} ({} ongoing)", events.len(), ongoing));
                    ui.separator();
                    let controller = self.timeline.controller();
                    ui.weak(controller.state().as_str());
                    if let Some(time) = controller.marker_time() {
                        ui.separator();
                        ui.label(format!(
                            "Marker: {}",
                            time.with_timezone(&chrono::Local).format("%H:%M:%S")
                        ));
                    }
                    if !controller.is_scroll_enabled() {
                        ui.weak("(scroll input paused)");
                    }
                });
                ui.separator();
                ui.add_space(5.0);

                self.timeline.show(ui, &self.settings.colors);
            }
        });
    }
}

/// Read and parse an event file.
fn read_event_file(path: &Path) -> Result<parser::EventFile, AppError> {
    let extension_ok = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            EVENT_FILE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        });
    if !extension_ok {
        return Err(AppError::UnsupportedFileType {
            path: path.to_path_buf(),
            expected: EVENT_FILE_EXTENSIONS
                .iter()
                .map(|ext| format!(".{}", ext))
                .collect(),
        });
    }

    let content =
        std::fs::read_to_string(path).map_err(|e| error::from_io_error(path.to_path_buf(), e))?;
    parser::parse_json(&content).map_err(|e| error::from_parse_error(Some(path.to_path_buf()), &e))
}

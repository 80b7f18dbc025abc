//! Configuration and settings module.
//!
//! This module handles persistent settings: timeline colors, marker timing,
//! the display-only default and the recent files list.

use eframe::egui::Color32;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::error::AppError;
use super::event::DetectionLabel;
use super::marker::MarkerTiming;

/// Settings filename for persistence.
const SETTINGS_FILENAME: &str = "config.json";

/// Maximum number of recent files to track.
const MAX_RECENT_FILES: usize = 10;

/// Color settings for the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    // Block colors per label
    /// Car blocks (default: blue)
    pub car: [u8; 3],
    /// Person blocks (default: orange)
    pub person: [u8; 3],
    /// Dog blocks (default: green)
    pub dog: [u8; 3],

    /// Outline of the current event
    pub current_event: [u8; 3],
    /// Center marker line
    pub marker: [u8; 3],

    /// Timeline background
    pub background: [u8; 3],
    /// Time header background
    pub header_background: [u8; 3],
    /// Tick lines
    pub grid: [u8; 3],

    /// Header text
    pub text_header: [u8; 3],
    /// Placeholder/inactive text
    pub text_dim: [u8; 3],

    /// Success status
    pub status_success: [u8; 3],
    /// Error status
    pub status_error: [u8; 3],
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            car: [66, 135, 245],
            person: [245, 158, 66],
            dog: [76, 175, 80],

            current_event: [255, 255, 255],
            marker: [244, 67, 54],

            background: [30, 30, 35],
            header_background: [40, 40, 45],
            grid: [50, 50, 55],

            text_header: [128, 128, 128],
            text_dim: [105, 105, 105],

            status_success: [76, 175, 80],
            status_error: [244, 67, 54],
        }
    }
}

impl ColorSettings {
    /// Convert a color array to egui Color32.
    #[inline]
    pub fn to_color32(color: [u8; 3]) -> Color32 {
        Color32::from_rgb(color[0], color[1], color[2])
    }

    /// Convert a color array to egui Color32 with alpha.
    #[inline]
    pub fn to_color32_alpha(color: [u8; 3], alpha: u8) -> Color32 {
        Color32::from_rgba_unmultiplied(color[0], color[1], color[2], alpha)
    }

    /// Block color for a detection label.
    pub fn label_color(&self, label: DetectionLabel) -> Color32 {
        Self::to_color32(match label {
            DetectionLabel::Car => self.car,
            DetectionLabel::Person => self.person,
            DetectionLabel::Dog => self.dog,
        })
    }

    /// Translucent block color for events that are still ongoing.
    pub fn ongoing_label_color(&self, label: DetectionLabel) -> Color32 {
        let rgb = match label {
            DetectionLabel::Car => self.car,
            DetectionLabel::Person => self.person,
            DetectionLabel::Dog => self.dog,
        };
        Self::to_color32_alpha(rgb, 160)
    }

    pub fn current_event_color(&self) -> Color32 {
        Self::to_color32(self.current_event)
    }

    pub fn marker_color(&self) -> Color32 {
        Self::to_color32(self.marker)
    }

    pub fn background_color(&self) -> Color32 {
        Self::to_color32(self.background)
    }

    pub fn header_background_color(&self) -> Color32 {
        Self::to_color32(self.header_background)
    }

    pub fn grid_color(&self) -> Color32 {
        Self::to_color32(self.grid)
    }

    pub fn text_header_color(&self) -> Color32 {
        Self::to_color32(self.text_header)
    }

    pub fn text_dim_color(&self) -> Color32 {
        Self::to_color32(self.text_dim)
    }

    pub fn status_success_color(&self) -> Color32 {
        Self::to_color32(self.status_success)
    }

    pub fn status_error_color(&self) -> Color32 {
        Self::to_color32(self.status_error)
    }
}

/// Marker timing in milliseconds, as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Scroll inactivity before a scroll counts as settled
    pub settle_delay_ms: u64,
    /// Scroll-event suppression after a programmatic scroll
    pub quiescent_window_ms: u64,
    /// Smooth scroll duration; kept below the quiescent window
    pub scroll_animation_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 150,
            quiescent_window_ms: 150,
            scroll_animation_ms: 120,
        }
    }
}

impl TimingSettings {
    /// Convert to controller timing.
    ///
    /// A scroll animation that would outlast the quiescent window is
    /// shortened to fit inside it.
    pub fn marker_timing(&self) -> MarkerTiming {
        let animation_ms = if self.scroll_animation_ms >= self.quiescent_window_ms {
            warn!(
                "scroll animation ({}ms) does not fit the quiescent window ({}ms), shortening it",
                self.scroll_animation_ms, self.quiescent_window_ms
            );
            self.quiescent_window_ms * 4 / 5
        } else {
            self.scroll_animation_ms
        };

        MarkerTiming {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            quiescent_window: Duration::from_millis(self.quiescent_window_ms),
            scroll_animation: Duration::from_millis(animation_ms),
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSettings {
    /// Color customization settings.
    #[serde(default)]
    pub colors: ColorSettings,

    /// Marker timing.
    #[serde(default)]
    pub timing: TimingSettings,

    /// Start with the timeline in display-only mode.
    #[serde(default)]
    pub disable_marker_events: bool,

    /// Recently opened files (most recent first).
    #[serde(default)]
    pub recent_files: Vec<PathBuf>,
}

impl AppSettings {
    /// Get the settings file path in the user's config directory.
    fn get_settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("detection-timeline");
            path.push(SETTINGS_FILENAME);
            path
        })
    }

    /// Load settings from disk, returning defaults if loading fails.
    pub fn load() -> Self {
        let Some(path) = Self::get_settings_path() else {
            return Self::default();
        };
        let Ok(content) = std::fs::read_to_string(&path) else {
            debug!("no settings at {}, using defaults", path.display());
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("ignoring unreadable settings at {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Save settings to disk.
    pub fn save(&self) -> Result<(), AppError> {
        let save_error = |reason: String| AppError::SettingsSaveError { reason };

        let path = Self::get_settings_path()
            .ok_or_else(|| save_error("Could not determine config directory".to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| save_error(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| save_error(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(&path, content)
            .map_err(|e| save_error(format!("Failed to write settings file: {}", e)))?;

        debug!("settings saved to {}", path.display());
        Ok(())
    }

    /// Add a file to the recent files list.
    ///
    /// The file is moved to the front of the list and the list is capped at
    /// MAX_RECENT_FILES entries.
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| p != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(MAX_RECENT_FILES);
    }

    /// Clear the recent files list.
    pub fn clear_recent_files(&mut self) {
        self.recent_files.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_colors_are_distinct() {
        let colors = ColorSettings::default();
        let car = colors.label_color(DetectionLabel::Car);
        let person = colors.label_color(DetectionLabel::Person);
        let dog = colors.label_color(DetectionLabel::Dog);

        assert_ne!(car, person);
        assert_ne!(person, dog);
        assert_eq!(car, Color32::from_rgb(66, 135, 245));
    }

    #[test]
    fn test_color32_alpha_conversion() {
        let color32 = ColorSettings::to_color32_alpha([255, 128, 64], 100);
        assert_eq!(color32, Color32::from_rgba_unmultiplied(255, 128, 64, 100));
    }

    #[test]
    fn test_default_timing() {
        let timing = AppSettings::default().timing.marker_timing();
        assert_eq!(timing, MarkerTiming::default());
        assert!(timing.scroll_animation < timing.quiescent_window);
    }

    #[test]
    fn test_animation_is_fitted_into_quiescent_window() {
        let settings = TimingSettings {
            settle_delay_ms: 200,
            quiescent_window_ms: 100,
            scroll_animation_ms: 300,
        };
        let timing = settings.marker_timing();

        assert_eq!(timing.scroll_animation, Duration::from_millis(80));
        assert_eq!(timing.settle_delay, Duration::from_millis(200));
    }

    #[test]
    fn test_settings_serialization() {
        let mut settings = AppSettings::default();
        settings.timing.settle_delay_ms = 250;
        settings.disable_marker_events = true;
        settings.recent_files.push(PathBuf::from("/test/events.json"));

        let json = serde_json::to_string(&settings).unwrap();
        let restored: AppSettings = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.colors, settings.colors);
        assert_eq!(restored.timing.settle_delay_ms, 250);
        assert!(restored.disable_marker_events);
        assert_eq!(restored.recent_files.len(), 1);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let json = r#"{"colors": {"car": [1, 2, 3]}, "timing": {"settle_delay_ms": 300}}"#;
        let settings: AppSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.colors.car, [1, 2, 3]);
        assert_eq!(settings.colors.dog, ColorSettings::default().dog);
        assert_eq!(settings.timing.settle_delay_ms, 300);
        assert_eq!(settings.timing.quiescent_window_ms, 150);
        assert!(!settings.disable_marker_events);
        assert!(settings.recent_files.is_empty());
    }

    #[test]
    fn test_recent_files_add() {
        let mut settings = AppSettings::default();

        settings.add_recent_file(PathBuf::from("/test/a.json"));
        settings.add_recent_file(PathBuf::from("/test/b.json"));
        settings.add_recent_file(PathBuf::from("/test/a.json"));

        assert_eq!(
            settings.recent_files,
            vec![PathBuf::from("/test/a.json"), PathBuf::from("/test/b.json")]
        );
    }

    #[test]
    fn test_recent_files_max_limit() {
        let mut settings = AppSettings::default();
        for i in 0..15 {
            settings.add_recent_file(PathBuf::from(format!("/test/file{}.json", i)));
        }

        assert_eq!(settings.recent_files.len(), MAX_RECENT_FILES);
        assert_eq!(settings.recent_files[0], PathBuf::from("/test/file14.json"));

        settings.clear_recent_files();
        assert!(settings.recent_files.is_empty());
    }
}

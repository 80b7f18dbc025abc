//! GUI module for the detection timeline.
//!
//! This module contains the egui-based user interface components
//! including the main application window, timeline, and preview controls.

mod app;
mod controls;
mod dialogs;
mod timeline;

pub use app::DetectionTimelineApp;

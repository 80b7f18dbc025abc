//! Detection Timeline - a scrollable timeline of camera detection events.

mod core;
mod gui;

use gui::DetectionTimelineApp;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 480.0])
            .with_min_inner_size([480.0, 240.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Detection Timeline",
        options,
        Box::new(|cc| Ok(Box::new(DetectionTimelineApp::new(cc)))),
    )
}

use anyhow::anyhow;
use eframe::egui;
use sketchbook::gui::SketchbookApp;
use sketchbook::logging;
use sketchbook::settings::{resolve_settings_path, Settings};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let settings_path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => resolve_settings_path()?,
    };
    let settings = Settings::load(&settings_path)?;
    logging::init(settings.debug_logging);
    tracing::info!(path = %settings_path.display(), "settings loaded");

    let base_dir = settings_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(settings.window_size())
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sketchbook",
        native_options,
        Box::new(move |_cc| Box::new(SketchbookApp::new(settings, base_dir))),
    )
    .map_err(|err| anyhow!("failed to start window: {err}"))
}

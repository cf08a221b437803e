#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod error;
mod modules;
mod settings;
mod style;

use eframe::egui;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};
use settings::AppSettings;

/// File logging under the local data dir, warnings mirrored to stderr.
/// `RUST_LOG` overrides the configured spec.
fn start_logger(settings: &AppSettings) -> Option<LoggerHandle> {
    let log_dir = AppSettings::log_dir();
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create log directory {}: {}", log_dir.display(), e);
        return None;
    }
    let started = Logger::try_with_env_or_str(&settings.log_spec).and_then(|logger| {
        logger
            .log_to_file(FileSpec::default().directory(&log_dir).basename("pixelperfect").suffix("log").suppress_timestamp())
            .rotate(Criterion::Size(64 * 1024), Naming::Numbers, Cleanup::KeepLogFiles(3))
            .duplicate_to_stderr(Duplicate::Warn)
            .start()
    });
    match started {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Failed to start logger: {}", e);
            None
        }
    }
}

fn main() -> eframe::Result<()> {
    let (settings, settings_error) = AppSettings::load();
    let _logger: Option<LoggerHandle> = start_logger(&settings);
    log::info!("starting PixelPerfect {}", env!("CARGO_PKG_VERSION"));
    if let Some(e) = settings_error {
        log::warn!("ignoring {}: {}", AppSettings::get_config_path().display(), e);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([820.0, 520.0])
            .with_title("PixelPerfect")
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "PixelPerfect",
        options,
        Box::new(move |cc| Ok(Box::new(app::PixelPerfectApp::new(cc, settings)))),
    )
}

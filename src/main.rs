mod app;
mod engine;
#[cfg(feature = "hooks")]
mod hotkey;
mod input;
mod recorder;
mod settings;

use std::path::PathBuf;

use clap::Parser;
use eframe::egui;

/// Auto-click utility: pattern timing, global hotkey, macro playback.
#[derive(Parser, Debug)]
#[command(name = "clickmate", version, about)]
struct Args {
    /// Settings file to load and save (defaults to the platform config dir)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Start clicking immediately with the stored settings
    #[arg(long)]
    start: bool,
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings_path = args.settings.unwrap_or_else(settings::default_path);

    let mut opts = eframe::NativeOptions::default();
    opts.viewport.inner_size = Some(egui::vec2(480.0, 560.0));
    opts.viewport.resizable = Some(true);
    opts.follow_system_theme = false;

    eframe::run_native(
        "ClickMate",
        opts,
        Box::new(move |cc| Box::new(app::ClickmateApp::new(cc, settings_path, args.start))),
    )
}

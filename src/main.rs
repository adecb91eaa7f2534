#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

mod catalog;
mod color;
mod config;
mod constants;
mod display;
mod engine;
mod error;
mod font;
mod monitor;
mod overlay;
mod state;
mod texture_loader;

use crate::catalog::ImageCatalog;
use crate::config::{Config, ConfigWatermark};
use crate::display::RaylibScreen;
use crate::engine::Slideshow;
use crate::font::OverlayFont;
use crate::overlay::OverlayCompositor;

/// Fullscreen photo frame with clock, date and info overlays.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// JSON configuration file, watched for changes while running
    #[arg(default_value = "config.json")]
    config: PathBuf,

    /// Run in a window even when the config asks for fullscreen
    #[arg(long)]
    windowed: bool,

    /// Log at debug level regardless of LOG_LEVEL
    #[arg(short, long)]
    verbose: bool,
}

fn log_level(verbose: bool) -> TraceLevel {
    if verbose {
        return TraceLevel::DEBUG;
    }
    match std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()).to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(log_level(args.verbose)).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut watermark = ConfigWatermark::new(&args.config, None);
    let mtime = watermark.modified();
    let config = Config::load(&args.config).with_context(|| format!("cannot start without {}", args.config.display()))?;
    if let Some(mtime) = mtime {
        watermark.mark_loaded(mtime);
    }
    info!(path = %args.config.display(), "loaded config");

    let fullscreen = config.display.fullscreen && !args.windowed;
    let mut screen = RaylibScreen::open(config.display.resolution, fullscreen)?;

    let monitor = monitor::from_settings(config.display.monitor_commands.as_ref());
    let compositor = OverlayCompositor::new(OverlayFont::load(config.display.font.as_deref()));
    let catalog = ImageCatalog::from_sources(&config.sources);

    let mut slideshow = Slideshow::new(config, watermark, catalog, compositor, monitor, Instant::now());
    engine::run(&mut slideshow, &mut screen);

    info!("photo frame stopped");
    Ok(())
}

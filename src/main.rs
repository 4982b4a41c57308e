#![forbid(unsafe_code)]

mod bus;
mod catalog;
mod color;
mod display;
mod errors;
mod keybindings;
mod params;
mod rcfile;
mod resolver;
mod settings;
#[cfg(test)]
mod test_support;
mod theme;
mod x11;
mod xpm;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level as TraceLevel, debug, info, warn};
use tracing_subscriber::FmtSubscriber;
use x11rb::protocol::Event;

use bus::NoBus;
use params::ReloadMask;
use resolver::Paths;
use settings::{FrameUpdater, SettingsManager};
use x11::X11Display;

#[derive(Parser, Debug)]
#[command(name = "rfwm", about = "Window manager settings engine")]
struct Cli {
    /// X display to connect to, overriding $DISPLAY
    #[arg(short, long)]
    display: Option<String>,
}

/// Until the frame layer exists, reload notifications are only logged.
struct LogFrames;

impl FrameUpdater for LogFrames {
    fn notify_frames_changed(&mut self, mask: ReloadMask) {
        info!(?mask, "frames need updating");
    }
}

fn main() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let paths = Paths::discover();
    let display = X11Display::open(cli.display.as_deref())?;
    // No live settings bus is attached yet; everything comes from files.
    let mut manager = SettingsManager::new(display, NoBus, LogFrames, paths);
    manager.init().context("Failed to load initial settings")?;

    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&shutdown))
            .context("Failed to register signal handler")?;
    }

    info!("entering event loop");
    while !shutdown.load(Ordering::Relaxed) {
        manager.display().flush();
        let mut idle = true;
        while let Some(event) = manager.display().poll_event() {
            idle = false;
            match event {
                Event::KeyPress(key) => {
                    let modifiers = u16::from(key.state);
                    match manager.keys().lookup(key.detail, modifiers) {
                        Some(action) => info!(?action, keycode = key.detail, "key action"),
                        None => debug!(keycode = key.detail, modifiers, "unbound key press"),
                    }
                }
                Event::MappingNotify(_) => {
                    // Keyboard layout changed; bindings stay stale until
                    // the next reload re-resolves them.
                    warn!("keyboard mapping changed");
                }
                other => debug!(event = ?other, "ignoring event"),
            }
        }
        if idle {
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    info!("shutting down");
    manager.shutdown();
    manager.display().flush();
    Ok(())
}

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

mod actions;
mod app;
mod config;
mod store;
mod ticker;
mod timer;

use actions::Action;
use app::App;
use config::AppConfig;
use ticker::Ticker;

/// Open the log file for appending, creating its directory first.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// The terminal belongs to the UI, so logs go to a file or nowhere.
fn init_logging(config: &AppConfig) {
    let mut open_error = None;
    let writer = match config.log_file.as_deref().map(open_log_file) {
        Some(Ok(file)) => BoxMakeWriter::new(Mutex::new(file)),
        Some(Err(e)) => {
            open_error = Some(e);
            BoxMakeWriter::new(io::sink)
        }
        None => BoxMakeWriter::new(io::sink),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    // Logs are going nowhere; say so before the UI takes the terminal.
    if let Some(e) = open_error {
        eprintln!("session-timer: logging disabled: {}", e);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config);
    tracing::info!(record_file = %config.record_file.display(), "session timer starting");

    // Create event channel
    let (tx, mut rx) = mpsc::unbounded_channel::<Action>();

    // Initialize terminal
    let mut terminal = ratatui::init();

    // Spawn input handler
    let input_tx = tx.clone();
    tokio::spawn(async move {
        loop {
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                let sent = match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        input_tx.send(Action::KeyPress(key))
                    }
                    Ok(_) => Ok(()),
                    Err(e) => input_tx.send(Action::Error(format!("Input: {}", e))),
                };
                if sent.is_err() {
                    break;
                }
            }
        }
    });

    let mut ticker = Ticker::new(config.tick_interval());

    // Create app state, showing history from earlier runs
    let mut app = App::new(&config);
    app.refresh_records();

    // Main event loop
    let result = loop {
        // Render
        if let Err(e) = terminal
            .draw(|f| app.render(f))
            .context("Failed to draw terminal")
        {
            break Err(e);
        }

        // Schedule or cancel the ticker before reading further actions,
        // so a pause or stop never sees a tick from its own epoch.
        for pending_action in app.take_pending_actions() {
            match pending_action {
                Action::StartTicker(epoch) => ticker.start(epoch, tx.clone()),
                Action::CancelTicker => ticker.cancel(),
                _ => {}
            }
        }

        // Handle events from channel
        tokio::select! {
            Some(action) = rx.recv() => {
                match app.handle_action(action) {
                    Ok(should_quit) => {
                        if should_quit {
                            break Ok(());
                        }
                    }
                    Err(e) => {
                        break Err(e);
                    }
                }
            }
        }
    };

    ticker.cancel();

    // Restore terminal
    ratatui::restore();
    tracing::info!("session timer exiting");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session-timer.log");
        assert!(open_log_file(&path).is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_open_log_file_reports_bad_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        assert!(open_log_file(&blocker.join("session-timer.log")).is_err());
    }
}

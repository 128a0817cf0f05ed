// src/main.rs
mod backend;
mod config;
mod controller;
mod input;
mod logging;
mod models;
mod network;
mod theme;
mod ui;
mod utils;

use std::time::Duration;
use anyhow::Context;
use clap::Parser;
use crossterm::{cursor, event::{self, Event, KeyEventKind}, execute, terminal};
use ratatui::prelude::*;
use tracing::{error, info};

use crate::config::{Overrides, Settings};
use crate::controller::PageController;
use crate::input::handle_key;
use crate::models::PageState;
use crate::network::HttpBackend;
use crate::theme::Theme;
use crate::ui::{UiState, render_page};

#[derive(Parser, Debug)]
#[command(name = "medreport", version, about = "Upload a medical report image, read its explanation and ask questions about it")]
struct Cli {
    /// Base URL of the report service
    #[arg(short, long)]
    server: Option<String>,

    /// Language the explanation is translated into
    #[arg(short, long)]
    language: Option<String>,

    /// Report image to pre-fill in the upload form
    #[arg(short, long)]
    file: Option<String>,

    /// tracing level for the log file (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Persist --server and --language into the user config file
    #[arg(long)]
    save_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let overrides = Overrides {
        server_url: cli.server.clone(),
        target_language: cli.language.clone(),
        log_level: cli.log_level.clone(),
    };

    if cli.save_config {
        match config::save_overrides(&overrides)? {
            Some(path) => println!("Saved settings to {}", path.display()),
            None => println!("Nothing to save: pass --server and/or --language"),
        }
    }

    let settings = Settings::new(&overrides).context("failed to load settings")?;
    logging::init_tracing(&settings)?;
    info!(server = %settings.server_url, language = %settings.target_language, "starting medreport");

    let backend = HttpBackend::new(&settings)?;
    let mut state = PageState::new(settings.target_language.clone());
    if let Some(file) = cli.file {
        state.file_path = file;
    }
    let controller = PageController::new(backend, state);
    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;

    install_panic_hook();
    let guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;

    let result = run(&mut terminal, &controller, &rt);
    drop(terminal);
    drop(guard);

    if let Err(ref e) = result {
        error!(error = %e, "medreport exited with an error");
    }
    result
}

/// Raw mode and the alternate screen, undone on drop whichever way `main`
/// leaves.
struct TerminalGuard {
    restore: fn() -> std::io::Result<()>,
}

impl TerminalGuard {
    fn enter() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("failed to enable raw mode")?;
        let guard = Self { restore: restore_terminal };
        execute!(std::io::stdout(), terminal::EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = (self.restore)() {
            error!(error = %e, "failed to restore the terminal");
        }
    }
}

fn restore_terminal() -> std::io::Result<()> {
    terminal::disable_raw_mode()?;
    execute!(std::io::stdout(), terminal::LeaveAlternateScreen, cursor::Show)
}

/// Puts the terminal back before the panic message is printed, so it stays
/// readable.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Err(e) = restore_terminal() {
            eprintln!("failed to restore the terminal: {e}");
        }
        default_hook(info);
    }));
}

fn run<W: std::io::Write>(
    terminal: &mut Terminal<CrosstermBackend<W>>,
    controller: &PageController<HttpBackend>,
    rt: &tokio::runtime::Runtime,
) -> anyhow::Result<()> {
    let theme = Theme::default();
    let mut ui = UiState::default();

    loop {
        terminal.draw(|f| {
            let state = controller.state().lock();
            render_page(f, &state, &mut ui, &theme);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if !handle_key(key, &mut ui, controller, rt)? {
                    break;
                }
            }
        }
    }

    info!("medreport closed");
    Ok(())
}

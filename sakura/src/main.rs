//! Sakura Memories TUI application.
//!
//! A terminal visual novel where an AI writes every scene, choice and ending.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a text-based interface suitable for automated testing:
//!
//! ```bash
//! cargo run -p sakura -- --headless --name Aki
//! ```

mod app;
mod events;
mod headless;
mod ui;

use clap::Parser;
use crossterm::{
    event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use sakura_core::headless::{HeadlessConfig, HeadlessGame};
use sakura_core::{
    GeminiNarrator, MockNarrator, Narrator, NarratorConfig, ProxyNarrator, SessionController,
};
use std::error::Error;
use std::fs::File;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use app::{App, PendingAction};
use events::{handle_event, EventResult};
use ui::render::{render, render_loading};

/// Command line options
#[derive(Parser, Debug)]
#[command(name = "sakura", version, about = "Sakura Memories - a school romance written by AI")]
struct Args {
    /// Run in headless mode (text-only, no TUI)
    #[arg(long)]
    headless: bool,

    /// Player name for headless mode
    #[arg(long, default_value = "Aki")]
    name: String,

    /// Send generation requests to this proxy endpoint instead of calling Gemini
    #[arg(long, value_name = "URL", conflicts_with = "offline")]
    proxy: Option<String>,

    /// Play with the built-in scripted narrator (no network)
    #[arg(long)]
    offline: bool,

    /// Text model (overrides SAKURA_TEXT_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Image model (overrides SAKURA_IMAGE_MODEL)
    #[arg(long)]
    image_model: Option<String>,

    /// Story language (overrides SAKURA_LANGUAGE)
    #[arg(long)]
    language: Option<String>,

    /// Log file for the TUI (headless mode logs to stderr)
    #[arg(long, default_value = "sakura.log")]
    log_file: PathBuf,
}

impl Args {
    fn narrator_config(&self) -> NarratorConfig {
        let mut config = NarratorConfig::from_env();
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(model) = &self.image_model {
            config = config.with_image_model(model);
        }
        if let Some(language) = &self.language {
            config = config.with_language(language);
        }
        config
    }

    fn build_narrator(&self) -> Result<Arc<dyn Narrator>, Box<dyn Error>> {
        if self.offline {
            tracing::info!("using offline narrator");
            return Ok(Arc::new(MockNarrator::new()));
        }
        if let Some(url) = &self.proxy {
            tracing::info!(endpoint = %url, "using proxy narrator");
            return Ok(Arc::new(ProxyNarrator::new(url)));
        }

        let narrator = GeminiNarrator::from_env().map_err(|e| {
            format!("{e}. Set GEMINI_API_KEY in a .env file, pass --proxy <URL>, or use --offline")
        })?;
        let config = self.narrator_config();
        tracing::info!(language = %config.language, "using Gemini narrator");
        Ok(Arc::new(narrator.with_config(config)))
    }
}

fn init_tracing(args: &Args) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if args.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        // Keep log lines off the alternate screen
        let file = File::create(&args.log_file)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    let narrator = args.build_narrator()?;

    if args.headless {
        let config = HeadlessConfig::new(args.name.as_str()).with_narrator(args.narrator_config());
        let game = HeadlessGame::new(config, narrator);
        return headless::run_headless(game).await.map_err(|e| e.into());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new(SessionController::new(narrator));
    let result = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        tracing::error!(error = %e, "terminal error");
        eprintln!("Error: {e}");
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    loop {
        // Render
        terminal.draw(|f| render(f, &app))?;

        // Poll for events with timeout for animations
        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;

            match handle_event(&mut app, ev) {
                EventResult::Quit => return Ok(()),
                EventResult::Action(action) => {
                    run_action(terminal, &mut app, action).await?;
                }
                EventResult::NeedsRedraw | EventResult::Continue => {}
            }
        } else {
            app.tick();
        }
    }
}

/// Drive one narrator action to completion while animating the loading screen.
async fn run_action<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    action: PendingAction,
) -> io::Result<()> {
    let theme = app.theme.clone();
    let status = app.session.subscribe();
    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    let mut tick = app.animation_frame;

    let result = {
        let work = app.perform(action);
        tokio::pin!(work);

        loop {
            tokio::select! {
                result = &mut work => break result,
                _ = ticker.tick() => {
                    tick = tick.wrapping_add(1);
                    let snapshot = status.borrow().clone();
                    terminal.draw(|f| render_loading(f, &theme, &snapshot, tick))?;
                }
            }
        }
    };

    app.animation_frame = tick;
    app.finish(result);

    // Keys pressed while loading are discarded
    while event::poll(Duration::ZERO)? {
        event::read()?;
    }

    Ok(())
}

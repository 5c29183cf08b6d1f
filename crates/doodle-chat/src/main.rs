//! Doodle chat, terminal edition.
//!
//! Asks for a display name, then shows the shared transcript, refreshing it
//! on a fixed interval. Logs go to a file since the terminal belongs to the
//! UI.

mod app;
mod app_state;
mod tui;
mod ui;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use doodle_sdk::{ApiClient, ClientConfig, FileIdentityStore, IdentityStore, MemoryIdentityStore};
use tracing::{info, warn};

use crate::app::App;
use crate::app_state::SharedIdentity;
use crate::tui::{EventHandler, Tui};

const TICK_RATE: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "doodle-chat")]
#[command(author, version, about = "Terminal client for the Doodle chat", long_about = None)]
struct Cli {
    /// Message API base URL (overrides DOODLE_API_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token (overrides DOODLE_AUTH_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Poll interval in milliseconds (overrides DOODLE_POLL_INTERVAL_MS)
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Display name; skips the entry screen
    #[arg(long)]
    name: Option<String>,

    /// Where the display name is remembered
    #[arg(long)]
    identity_file: Option<PathBuf>,

    /// Log file (default: <data dir>/doodle-chat/doodle-chat.log)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(token) = &self.token {
            config = config.with_auth_token(token.clone());
        }
        if let Some(ms) = self.poll_interval_ms {
            config = config.with_poll_interval(Duration::from_millis(ms));
        }
        config
    }

    fn identity(&self) -> SharedIdentity {
        if let Some(path) = &self.identity_file {
            return Arc::new(FileIdentityStore::new(path.clone()));
        }
        match FileIdentityStore::default_location() {
            Some(store) => Arc::new(store),
            None => {
                warn!("no config directory, display name will not be remembered");
                Arc::new(MemoryIdentityStore::default())
            }
        }
    }

    fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("doodle-chat")
                .join("doodle-chat.log")
        })
    }
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Put the terminal back before the default hook prints the panic.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = tui::restore();
        default_hook(info);
    }));
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> anyhow::Result<()> {
    while !app.should_quit() {
        terminal.draw(|f| app.render(f))?;
        match events.next().await {
            Some(action) => app.update(action),
            None => break,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_path())?;

    let config = cli.client_config();
    let api = Arc::new(ApiClient::new(&config)?);
    info!(
        url = api.messages_url(),
        poll_ms = config.poll_interval.as_millis(),
        "doodle-chat starting"
    );

    let identity = cli.identity();
    let skip_entry = match cli.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            identity.set(name)?;
            true
        }
        _ => false,
    };

    let mut events = EventHandler::new(TICK_RATE);
    let mut app = App::new(api, identity, config.poll_interval, events.sender());
    if skip_entry {
        app.enter_chat();
    }

    install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;

    info!("doodle-chat stopped");
    result
}

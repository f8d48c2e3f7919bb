use anyhow::{Context, Result};
use chanview::app::{App, AppEvent};
use chanview::channel::ChannelId;
use chanview::config::Config;
use chanview::keybindings::KeybindingRegistry;
use chanview::transport::Endpoints;
use chanview::ui;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Get the config directory path (~/.config/chanview/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("chanview"))
}

/// Send tracing output to `chanview.log` when `RUST_LOG` is set.
///
/// The TUI owns stdout, so logs never go to the terminal.
fn init_logging(config_dir: &Path) -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }

    std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;

    // Logs may carry server URLs and filters; keep the directory private.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(config_dir, std::fs::Permissions::from_mode(0o700))
        {
            eprintln!("Warning: failed to restrict {}: {}", config_dir.display(), e);
        }
    }

    let log_path = config_dir.join("chanview.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    name = "chanview",
    about = "Terminal viewer that streams channel feeds over a WebSocket"
)]
struct Args {
    /// Server or channel page URL, e.g. http://localhost:8080/channels/5
    page_url: Option<String>,

    /// Open this channel instead of the one in the URL
    #[arg(long, value_name = "ID")]
    channel: Option<ChannelId>,

    /// Config file (default: ~/.config/chanview/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    init_logging(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let mut keybindings = KeybindingRegistry::new();
    for warning in keybindings.apply_overrides(&config.keybindings) {
        eprintln!("Warning: {}", warning);
    }

    let Some(raw_url) = args.page_url.clone().or_else(|| config.server_url.clone()) else {
        eprintln!("Error: no server URL given.");
        eprintln!();
        eprintln!("Pass a server or channel page URL:");
        eprintln!("  chanview http://localhost:8080/channels/5");
        eprintln!();
        eprintln!("Or set server_url in {}.", config_path.display());
        std::process::exit(1);
    };

    let mut endpoints = Endpoints::from_page_url(&raw_url)
        .with_context(|| format!("Invalid server URL '{}'", raw_url))?;
    if let Some(channel) = args.channel {
        endpoints = endpoints.for_channel(channel);
    }
    tracing::info!(
        page = %endpoints.page_url(),
        socket = %endpoints.ws_url(),
        "Starting session"
    );

    let mut app =
        App::new(config, endpoints, keybindings).context("Failed to create application")?;

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(64);

    ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}

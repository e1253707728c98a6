//! Serve a composer workspace to the browser.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p ain-web
//! cargo run -p ain-web -- --port 8080 --state-dir /tmp/ain
//! cargo run -p ain-web -- --static-dir frontend/out
//! ```
//!
//! ## Editing blocks
//!
//! **WebSocket** (connect to `/ws`):
//! ```json
//! {"type": "add", "content": "Background: clinics book by phone"}
//! ```
//!
//! **REST** (`POST /api/blocks`):
//! ```json
//! {"content": "Background: clinics book by phone"}
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use ain_rs::Language;
use ain_rs::config::ComposerConfig;
use ain_rs::workspace::Workspace;
use ain_web::{WebConfig, WsMessage, observe_workspace, spawn_web};
use clap::Parser;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Composer workspace server.
#[derive(Parser)]
#[command(about = "Serve an ain composer workspace over HTTP and WebSocket")]
struct Args {
    /// Port for the web server.
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Directory holding the persisted workspace.
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Built front end to serve for non-API paths.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Skip the simulated analysis and compression delays.
    #[arg(long)]
    no_delay: bool,

    /// Language used until one is saved in the state directory (en, ja).
    #[arg(long)]
    language: Option<Language>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Args::parse()).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ComposerConfig::from_env();
    if let Some(dir) = args.state_dir {
        config = config.with_state_dir(dir);
    }
    if args.no_delay {
        config = config.without_delays();
    }
    if let Some(language) = args.language {
        config = config.with_language(language);
    }

    let web_config = WebConfig {
        bind_addr: ([127, 0, 0, 1], args.port).into(),
        static_dir: args.static_dir,
        ..Default::default()
    };
    let (ws_tx, _) = tokio::sync::broadcast::channel::<WsMessage>(web_config.broadcast_capacity);

    let workspace = observe_workspace(Workspace::open(config)?, &ws_tx);
    let workspace = Arc::new(Mutex::new(workspace));

    let addr = spawn_web(workspace, ws_tx, web_config).await?;
    println!("Composer: http://{addr}");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}

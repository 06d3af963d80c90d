mod chat;
mod config_cmd;
mod status_cmd;
mod terminal_output;
mod wiring;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use chatrelay_config::{
    apply_all_defaults, collect_referenced_vars, config_dir, config_file_path, load_and_prepare,
    load_config, load_raw, ChatRelayConfig,
};
use chatrelay_gateway::{router, start_server, GatewayState};

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(about = "Streams chat replies from an LLM provider, with uploads and a conversation sidebar")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.chatrelay/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Interactive chat in the terminal
    Chat,
    /// Send one prompt and stream the reply
    Ask {
        #[arg(required = true)]
        prompt: Vec<String>,
    },
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Query a running gateway
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config with secrets masked
    Show,
    /// Write a starter config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_file_path(&config_dir()));

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = match load_and_prepare(&path).await {
                    Ok(config) => config,
                    // Still show an invalid file so its problems can be read.
                    Err(_) => apply_all_defaults(load_config(&path).await?),
                };
                let env_refs = collect_referenced_vars(&load_raw(&path).await?);
                config_cmd::show(&config, &path, &env_refs)?;
            }
            ConfigAction::Init { force } => {
                config_cmd::init(&path, force).await?;
            }
        },
        Commands::Serve { port } => {
            let mut config = load(&path, None).await?;
            if let Some(port) = port {
                let mut gateway = config.gateway();
                let derived_url = format!(
                    "http://{}:{}/media",
                    gateway.host.as_deref().unwrap_or("127.0.0.1"),
                    gateway.port.unwrap_or(8080)
                );
                gateway.port = Some(port);
                config.gateway = Some(gateway);
                // A derived local media URL follows the new port.
                if let Some(storage) = config.storage.as_mut() {
                    if storage.public_base_url.as_deref() == Some(derived_url.as_str()) {
                        storage.public_base_url = None;
                    }
                }
                config = apply_all_defaults(config);
            }
            run_server(config).await?;
        }
        Commands::Chat => {
            let config = load(&path, Some("warn")).await?;
            let producer = wiring::build_producer(&config)?;
            let (store, _) = wiring::build_store(&config.storage())?;
            chat::run_chat(chat::ChatDesk::new(producer, store)).await?;
        }
        Commands::Ask { prompt } => {
            let config = load(&path, Some("warn")).await?;
            let producer = wiring::build_producer(&config)?;
            chat::run_ask(producer, &prompt.join(" ")).await?;
        }
        Commands::Status => {
            let config = apply_all_defaults(load_config(&path).await?);
            let gateway = config.gateway();
            let host = gateway.host.as_deref().unwrap_or("127.0.0.1");
            status_cmd::run(host, gateway.port.unwrap_or(8080)).await?;
        }
    }

    Ok(())
}

/// Load the config and start logging. `console_level` overrides the
/// configured level for interactive commands.
async fn load(path: &Path, console_level: Option<&str>) -> Result<ChatRelayConfig> {
    let config = load_and_prepare(path).await?;
    let logging = config.logging();
    let level = console_level
        .or(logging.level.as_deref())
        .unwrap_or("info");
    chatrelay_logging::init_logger(logging.dir.as_deref().map(Path::new), level);
    Ok(config)
}

async fn run_server(config: ChatRelayConfig) -> Result<()> {
    let gateway = config.gateway();
    let storage = config.storage();
    let host = gateway.host.as_deref().unwrap_or("127.0.0.1");
    let addr: SocketAddr = format!("{host}:{}", gateway.port.unwrap_or(8080))
        .parse()
        .with_context(|| format!("Invalid gateway address {host}"))?;

    let producer = wiring::build_producer(&config)?;
    let (store, media_dir) = wiring::build_store(&storage)?;
    if let Some(dir) = &media_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create media directory: {}", dir.display()))?;
    }

    info!(
        addr = %addr,
        provider = %producer.provider_name(),
        store = %store.name(),
        "Starting chatrelay gateway"
    );

    let state = GatewayState::new(producer, store, storage.max_upload_bytes());
    let app = router(state, media_dir)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    start_server(addr, app).await
}

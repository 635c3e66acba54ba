//! lorod: Loro reflection proxy
//!
//! Usage:
//!   lorod [--config ~/.config/loro/config.toml] [--listen 127.0.0.1:8787]
//!
//! Reads the upstream API key from `OPENAI_API_KEY`. Without it the server
//! still starts and answers `/health`, but `/reflect` returns 500.

mod crisis;
mod http;
mod reflect;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use secrecy::SecretString;
use tracing::{info, warn};

use loro_core::config::default_config_path;
use loro_core::LoroConfig;

use crate::http::AppState;
use crate::reflect::{OpenAiReflector, Reflector};

#[derive(Parser, Debug)]
#[command(name = "lorod", version, about = "Loro journal reflection proxy")]
struct Cli {
    /// Path to config.toml
    #[arg(long, short = 'c', env = "LORO_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides [server] listen
    #[arg(long, env = "LORO_LISTEN")]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LORO_LOG")]
    log: Option<String>,

    /// Log format (json, text)
    #[arg(long, env = "LORO_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Upstream API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = LoroConfig::load(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    let level = cli.log.as_deref().unwrap_or(&config.log.level);
    let format = match cli.log_format {
        Some(f) => f,
        None if config.log.format == "json" => LogFormat::Json,
        None => LogFormat::Text,
    };
    init_logging(level, &format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "lorod starting"
    );

    let reflector: Option<Arc<dyn Reflector>> = match cli.api_key.filter(|k| !k.is_empty()) {
        Some(key) => {
            let reflector = OpenAiReflector::new(&config.server, SecretString::from(key))
                .context("building upstream HTTP client")?;
            info!(model = reflector.model(), api_base = %config.server.api_base, "reflection upstream configured");
            Some(Arc::new(reflector))
        }
        None => {
            warn!("OPENAI_API_KEY not set; /reflect will return 500");
            None
        }
    };

    let state = AppState {
        reflector,
        model: config.server.model.clone(),
    };
    let listen = cli.listen.unwrap_or(config.server.listen);

    http::serve(&listen, state, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}

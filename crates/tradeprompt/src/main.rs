use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tradeprompt::config::{load_config, Credentials};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tradeprompt", about = "Natural-language order relay")]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config and TRADEPROMPT_BIND)
    #[arg(short, long)]
    bind: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (respects RUST_LOG env var)
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    let credentials = Credentials::from_env();
    let handler =
        tradeprompt::build_handler(&config, &credentials).context("Failed to build handler")?;

    tradeprompt::server::serve(Arc::new(handler), &config.server.bind).await
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tabletop::assets::HttpAssetApi;
use tabletop::command::spawn_stdin_reader;
use tabletop::config::Config;
use tabletop::error::ClientError;
use tabletop::session::{Outcome, Session};
use tabletop::transport;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tabletop", about = "Headless shared tabletop client")]
struct Cli {
    /// Env file to load instead of `./.env`.
    #[arg(long, env = "TABLETOP_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Join this game instead of `TABLETOP_GAME`.
    #[arg(long)]
    game: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(Outcome::Quit) => {}
        Ok(Outcome::Failed(reason)) => {
            tracing::error!(%reason, "session refused");
            std::process::exit(2);
        }
        Ok(Outcome::Lost) => {
            tracing::warn!("connection lost");
            std::process::exit(3);
        }
        Err(error) => {
            tracing::error!(%error, "tabletop failed");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<Outcome, ClientError> {
    let mut config = Config::from_env(cli.env_file.as_deref())?;
    if let Some(game) = cli.game {
        config.game = game;
    }

    let api = HttpAssetApi::new(&config.api_url, Duration::from_secs(config.http_timeout_secs))?;
    let mut session = Session::new(&config, Arc::new(api));
    let transport = transport::connect(&config.ws_url).await?;
    tracing::info!(username = %config.username, game = %config.game, "joining");

    tokio::select! {
        outcome = session.run(transport, spawn_stdin_reader()) => outcome,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("interrupted");
            Ok(Outcome::Quit)
        }
    }
}

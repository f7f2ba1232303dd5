//! Termbridge daemon - streaming translation between product and engineering language

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use termbridge_server::config::Config;
use termbridge_server::error::Result;
use termbridge_server::gateway::{ChatModel, OpenAiGateway};
use termbridge_server::server::ApiServer;
use termbridge_server::translate::{IntentClassifier, Orchestrator, StreamTranslator};

/// Termbridge - translation service between product and engineering language
#[derive(Parser)]
#[command(name = "termbridge")]
#[command(about = "A streaming translation service between product-requirement and technical-implementation language")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the API server (default command)
    #[command(name = "serve")]
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => serve(cli.config).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,termbridge_server=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = config_path {
        tracing::info!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(&path).map_err(|e| {
            termbridge_server::TermbridgeError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            termbridge_server::TermbridgeError::Config(format!("Failed to parse config: {e}"))
        })?;
        Ok(config)
    } else {
        let default_paths = [
            dirs::home_dir().map(|h| h.join(".termbridge").join("config.toml")),
            dirs::config_dir().map(|c| c.join("termbridge").join("config.toml")),
            Some(PathBuf::from("config.toml")),
        ];

        for path_opt in default_paths.iter().flatten() {
            if path_opt.exists() {
                tracing::info!("Loading config from: {}", path_opt.display());
                let content = std::fs::read_to_string(path_opt).map_err(|e| {
                    termbridge_server::TermbridgeError::Config(format!(
                        "Failed to read config file {}: {}",
                        path_opt.display(),
                        e
                    ))
                })?;
                let config: Config = toml::from_str(&content).map_err(|e| {
                    termbridge_server::TermbridgeError::Config(format!(
                        "Failed to parse config: {e}"
                    ))
                })?;
                return Ok(config);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }
}

async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting Termbridge daemon");

    let config = load_config(config_path)?;
    tracing::debug!("Config loaded: {:?}", config);

    if config.model.api_key().is_empty() {
        tracing::warn!(
            "API key env var '{}' is not set - translation requests will be rejected",
            config.model.api_key_env
        );
    } else {
        tracing::info!("API key configured");
    }

    let gateway: Arc<dyn ChatModel> = Arc::new(OpenAiGateway::new(&config.model).map_err(
        |e| termbridge_server::TermbridgeError::Config(format!("Failed to build gateway: {e}")),
    )?);

    let classifier = IntentClassifier::new(Arc::clone(&gateway), config.intent.temperature);
    let translator = StreamTranslator::new(Arc::clone(&gateway), config.model.timeout());
    let orchestrator = Arc::new(Orchestrator::new(
        classifier,
        translator,
        config.intent.clone(),
    ));

    let server = ApiServer::new(config, gateway, orchestrator);
    tracing::info!("Starting API server");

    server.serve().await?;

    tracing::info!("Termbridge daemon stopped");
    Ok(())
}

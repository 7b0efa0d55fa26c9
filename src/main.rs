use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use content_shield::crypto::keys::KeyPair;
use content_shield::{ClientConfig, DrmError, Pipeline};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "content-shield")]
#[command(about = "Open protected documents through the license service")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "CONTENT_SHIELD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for one document and report what was recovered
    Open {
        content_id: String,
        /// Base URL of the license/content service
        #[arg(long, env = "CONTENT_SHIELD_BASE_URL")]
        base_url: Option<String>,
        #[arg(long, env = "CONTENT_SHIELD_DEVICE_ID")]
        device_id: Option<String>,
        /// Bearer token for both endpoints
        #[arg(long, env = "CONTENT_SHIELD_TOKEN", hide_env_values = true)]
        token: Option<String>,
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long)]
        max_retries: Option<u32>,
    },
    /// Generate a session key pair and print its SPKI public key (base64)
    Keygen,
}

fn load_config(path: Option<&PathBuf>) -> Result<ClientConfig, DrmError> {
    match path {
        Some(path) => ClientConfig::load(path),
        None => Ok(ClientConfig::default()),
    }
}

fn report(error: &DrmError) -> ExitCode {
    eprintln!("{}", error.user_message());
    eprintln!("error kind: {}", error.kind());
    tracing::debug!(error = %error, "Failure detail");
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("content_shield=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Open {
            content_id,
            base_url,
            device_id,
            token,
            timeout_ms,
            max_retries,
        } => {
            let mut config = match load_config(cli.config.as_ref()) {
                Ok(config) => config,
                Err(e) => return report(&e),
            };
            if let Some(base_url) = base_url {
                config.base_url = base_url;
            }
            if let Some(device_id) = device_id {
                config.device_id = device_id;
            }
            if token.is_some() {
                config.auth_token = token;
            }
            if let Some(timeout_ms) = timeout_ms {
                config.request_timeout_ms = timeout_ms;
            }
            if let Some(max_retries) = max_retries {
                config.retry.max_retries = max_retries;
            }

            let pipeline = match Pipeline::from_config(&config) {
                Ok(pipeline) => pipeline,
                Err(e) => return report(&e),
            };

            let session = pipeline.session(&content_id);
            let token = session.cancellation_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    token.cancel();
                }
            });

            match session.open().await {
                Ok(payload) => {
                    println!(
                        "{content_id}: {} ({}), {} bytes",
                        payload.resolved_type(),
                        payload.resolved_type().mime(),
                        payload.len()
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => report(&e),
            }
        }
        Commands::Keygen => {
            match tokio::task::spawn_blocking(KeyPair::generate).await {
                Ok(Ok(pair)) => {
                    println!("{}", pair.public_key_base64());
                    ExitCode::SUCCESS
                }
                Ok(Err(e)) => report(&e),
                Err(e) => report(&DrmError::KeyGeneration(e.to_string())),
            }
        }
    }
}

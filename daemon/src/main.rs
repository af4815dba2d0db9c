//! Wellspring daemon — entry point for running the services backend.

mod config;

use anyhow::Context;
use clap::Parser;
use config::ServiceConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use wellspring_api::{ApiServer, AppState};
use wellspring_identity::{session::SECRET_LEN, IdentityStore, SessionSigner};
use wellspring_mailer::HttpMailer;
use wellspring_verify::Registrar;

/// How often expired pending registrations are swept.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "wellspring-daemon", about = "Wellspring services backend daemon")]
struct Cli {
    /// Data directory for the identity collection.
    #[arg(long, env = "WELLSPRING_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// HTTP API port.
    #[arg(long, env = "WELLSPRING_API_PORT")]
    api_port: Option<u16>,

    /// Mail provider endpoint.
    #[arg(long, env = "WELLSPRING_MAIL_ENDPOINT")]
    mail_endpoint: Option<String>,

    /// Mail provider API key.
    #[arg(long, env = "WELLSPRING_MAIL_API_KEY")]
    mail_api_key: Option<String>,

    /// Sender address on outgoing mail.
    #[arg(long, env = "WELLSPRING_MAIL_FROM")]
    mail_from: Option<String>,

    /// Hex-encoded 32-byte session-signing secret.
    #[arg(long, env = "WELLSPRING_SESSION_SECRET")]
    session_secret: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "WELLSPRING_LOG_LEVEL")]
    log_level: String,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wellspring_utils::init_tracing();

    let cli = Cli::parse();

    let file_config: Option<ServiceConfig> = if let Some(ref config_path) = cli.config {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str::<ServiceConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("Loaded config from {}", config_path.display());
                    Some(cfg)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {e}, using CLI defaults");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {e}, using CLI defaults",
                    config_path.display()
                );
                None
            }
        }
    } else {
        None
    };

    let base = file_config.unwrap_or_default();
    let config = ServiceConfig {
        data_dir: cli.data_dir.unwrap_or(base.data_dir),
        api_port: cli.api_port.unwrap_or(base.api_port),
        mail_endpoint: cli.mail_endpoint.unwrap_or(base.mail_endpoint),
        mail_api_key: cli.mail_api_key.unwrap_or(base.mail_api_key),
        mail_from: cli.mail_from.unwrap_or(base.mail_from),
        session_secret: cli.session_secret.unwrap_or(base.session_secret),
        log_level: cli.log_level,
        ..base
    };

    let signer = build_signer(&config)?;
    let identities = IdentityStore::open(config.data_dir.join("identities.json"))
        .context("failed to open identity store")?;
    let mailer = Arc::new(HttpMailer::new(
        config.mail_endpoint.as_str(),
        config.mail_api_key.as_str(),
        config.mail_from.as_str(),
        config.mail_from_name.as_str(),
    ));
    let registrar = Arc::new(Registrar::new(
        identities,
        signer,
        mailer,
        config.params.clone(),
    ));

    // Sweep expired pending registrations in the background; expiry is
    // also enforced lazily on access.
    let sweeper = registrar.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let dropped = sweeper.purge_expired().await;
            if dropped > 0 {
                tracing::debug!(dropped, "purged expired pending registrations");
            }
        }
    });

    tracing::info!(
        "Starting Wellspring backend (API:{}, data:{})",
        config.api_port,
        config.data_dir.display(),
    );

    let server = ApiServer::new(config.api_port);
    server
        .start(AppState { registrar })
        .await
        .map_err(|e| anyhow::anyhow!("API server failed: {e}"))?;

    tracing::info!("Wellspring daemon exited cleanly");
    Ok(())
}

/// Build the session signer from the configured secret, or fall back to
/// a random per-process secret.
fn build_signer(config: &ServiceConfig) -> anyhow::Result<SessionSigner> {
    let ttl = config.params.session_ttl_secs;
    if config.session_secret.is_empty() {
        tracing::warn!("no session secret configured; sessions will not survive a restart");
        return Ok(SessionSigner::with_random_secret(ttl));
    }
    let bytes = hex::decode(&config.session_secret).context("session secret is not valid hex")?;
    let secret: [u8; SECRET_LEN] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("session secret must be {SECRET_LEN} bytes of hex"))?;
    Ok(SessionSigner::new(secret, ttl))
}

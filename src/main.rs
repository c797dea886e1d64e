//! Callout CLI entry point

mod cli;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use callout::auth::CredentialStore;
use callout::claims::IssuerKey;
use callout::server::{CalloutConfig, CalloutService, NatsConfig};
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve {
            nats_url,
            nats_user,
            nats_pass,
            issuer_seed,
            xkey_seed,
            users,
        } => {
            let mut nats = NatsConfig::new(nats_url);
            if let Some(user) = nats_user {
                nats = nats.with_user_and_password(user, nats_pass.unwrap_or_default());
            }

            serve(CalloutConfig {
                nats,
                issuer_seed,
                xkey_seed,
                users_path: users,
            })
            .await
        }
        Commands::Keygen => keygen(),
        Commands::Check { users } => check(users),
    }
}

async fn serve(config: CalloutConfig) -> Result<()> {
    let service = CalloutService::new(config).context("Failed to start callout service")?;

    info!("Starting callout service...");

    tokio::select! {
        result = service.run() => {
            let stats = result.context("Callout service failed")?;
            info!(
                received = stats.received,
                granted = stats.granted,
                rejected = stats.rejected,
                "Subscription closed"
            );
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping");
        }
    }

    info!("Callout service stopped");
    Ok(())
}

fn keygen() -> Result<()> {
    let issuer = IssuerKey::generate();
    let seed = issuer.seed().context("Failed to export generated seed")?;

    println!("Seed (--issuer-seed): {}", seed);
    println!("Public key (auth_callout.issuer): {}", issuer.public_key());

    Ok(())
}

fn check(users: PathBuf) -> Result<()> {
    let store = CredentialStore::load(&users)
        .with_context(|| format!("Invalid users file: {}", users.display()))?;

    println!("{}: {} user(s)", users.display(), store.len());
    for name in store.usernames() {
        if let Some(record) = store.lookup(name) {
            let scope = match &record.permissions {
                Some(p) if !p.is_empty() => "restricted",
                _ => "unrestricted",
            };
            println!("  {} -> {} ({})", name, record.account, scope);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

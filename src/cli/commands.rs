//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "callout")]
#[command(about = "NATS authorization callout service", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve authorization requests
    Serve {
        /// NATS server URL
        #[arg(long, env = "NATS_URL", default_value = "nats://127.0.0.1:4222")]
        nats_url: String,

        /// User of the auth account the service connects as
        #[arg(long, env = "NATS_USER")]
        nats_user: Option<String>,

        /// Password of the auth account user
        #[arg(long, env = "NATS_PASS", requires = "nats_user")]
        nats_pass: Option<String>,

        /// Account seed used to sign responses and user JWTs
        #[arg(long, env = "CALLOUT_ISSUER_SEED", hide_env_values = true)]
        issuer_seed: String,

        /// Curve seed for encrypted callouts (accepted, currently unused)
        #[arg(long, env = "CALLOUT_XKEY_SEED", hide_env_values = true)]
        xkey_seed: Option<String>,

        /// Path to the users JSON file
        #[arg(long, env = "CALLOUT_USERS")]
        users: PathBuf,
    },

    /// Generate an issuer account key
    ///
    /// Put the seed in --issuer-seed and the public key in the server's
    /// `authorization.auth_callout.issuer`.
    Keygen,

    /// Validate a users file and list its users
    Check {
        /// Path to the users JSON file
        #[arg(long, env = "CALLOUT_USERS")]
        users: PathBuf,
    },
}

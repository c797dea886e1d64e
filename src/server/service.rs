//! Callout service: config, startup and the NATS subscription

use crate::auth::{CredentialStore, LoadError};
use crate::claims::{CodecError, IssuerKey, NatsJwtCodec};
use crate::server::dispatcher::{DispatchStats, Dispatcher};
use crate::server::transport::{
    CalloutMessage, NatsReplier, TransportError, AUTH_CALLOUT_SUBJECT,
};
use futures::StreamExt;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("issuer key: {0}")]
    Issuer(#[from] CodecError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Connection settings for the auth account user
#[derive(Clone)]
pub struct NatsConfig {
    pub url: String,
    pub user: Option<String>,
    pub pass: Option<String>,
}

impl NatsConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user: None,
            pass: None,
        }
    }

    pub fn with_user_and_password(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.pass = Some(pass.into());
        self
    }

    pub async fn connect(&self) -> Result<async_nats::Client, TransportError> {
        let mut options = async_nats::ConnectOptions::new().name("callout");

        if let Some(user) = &self.user {
            options = options.user_and_password(user.clone(), self.pass.clone().unwrap_or_default());
        }

        options
            .connect(self.url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))
    }
}

impl fmt::Debug for NatsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NatsConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("pass", &self.pass.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Everything the service needs at startup
#[derive(Clone)]
pub struct CalloutConfig {
    pub nats: NatsConfig,
    /// Account seed that signs responses and user JWTs
    pub issuer_seed: String,
    /// Curve seed for encrypted callouts; accepted but not used
    pub xkey_seed: Option<String>,
    /// Path to the users JSON file
    pub users_path: PathBuf,
}

impl fmt::Debug for CalloutConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalloutConfig")
            .field("nats", &self.nats)
            .field("issuer_seed", &"[REDACTED]")
            .field("xkey_seed", &self.xkey_seed.as_ref().map(|_| "[REDACTED]"))
            .field("users_path", &self.users_path)
            .finish()
    }
}

/// The running service
pub struct CalloutService {
    nats: NatsConfig,
    issuer: IssuerKey,
    dispatcher: Dispatcher,
}

impl CalloutService {
    /// Parse the issuer key and load the users file
    ///
    /// Fails before any connection is made.
    pub fn new(config: CalloutConfig) -> Result<Self, ServiceError> {
        let issuer = IssuerKey::from_seed(&config.issuer_seed)?;

        if config.xkey_seed.as_deref().is_some_and(|seed| !seed.is_empty()) {
            warn!("xkey seed provided but encrypted callouts are not supported, ignoring it");
        }

        let store = CredentialStore::load(&config.users_path)?;
        info!(
            users = store.len(),
            path = %config.users_path.display(),
            "Loaded users file"
        );

        let codec = NatsJwtCodec::new(issuer.clone());
        let dispatcher = Dispatcher::new(Arc::new(codec), Arc::new(store));

        Ok(Self {
            nats: config.nats,
            issuer,
            dispatcher,
        })
    }

    pub fn issuer(&self) -> &IssuerKey {
        &self.issuer
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Connect, subscribe and serve until the subscription closes
    pub async fn run(&self) -> Result<DispatchStats, ServiceError> {
        let client = self.nats.connect().await?;
        let subscriber = client
            .subscribe(AUTH_CALLOUT_SUBJECT)
            .await
            .map_err(|e| TransportError::Subscribe(e.to_string()))?;

        info!(
            subject = AUTH_CALLOUT_SUBJECT,
            issuer = %self.issuer.public_key(),
            url = %self.nats.url,
            "Listening for authorization requests"
        );

        let replier = NatsReplier::new(client);
        let inbound = Box::pin(subscriber.map(CalloutMessage::from));

        Ok(self.dispatcher.run(inbound, &replier).await)
    }
}

//! Transport plumbing: inbound callout messages and reply sinks

use crate::server::xkey::SERVER_XKEY_HEADER;
use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

/// Subject the server publishes authorization requests on
pub const AUTH_CALLOUT_SUBJECT: &str = "$SYS.REQ.USER.AUTH";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect error: {0}")]
    Connect(String),

    #[error("subscribe error: {0}")]
    Subscribe(String),

    #[error("publish error: {0}")]
    Publish(String),
}

/// One inbound request, detached from the transport that delivered it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalloutMessage {
    /// Where the reply goes; `None` means nobody is waiting
    pub reply: Option<String>,
    pub payload: Vec<u8>,
    /// Server curve key from the `Nats-Server-Xkey` header
    pub server_xkey: Option<String>,
}

impl CalloutMessage {
    pub fn new(reply: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            reply: Some(reply.into()),
            payload: payload.into(),
            server_xkey: None,
        }
    }

    pub fn with_server_xkey(mut self, xkey: impl Into<String>) -> Self {
        self.server_xkey = Some(xkey.into());
        self
    }
}

impl From<async_nats::Message> for CalloutMessage {
    fn from(msg: async_nats::Message) -> Self {
        let server_xkey = msg
            .headers
            .as_ref()
            .and_then(|headers| headers.get(SERVER_XKEY_HEADER))
            .map(|value| value.as_str().to_string())
            .filter(|value| !value.is_empty());

        Self {
            reply: msg.reply.map(|subject| subject.to_string()),
            payload: msg.payload.to_vec(),
            server_xkey,
        }
    }
}

/// Sends reply payloads back to the requester
#[async_trait]
pub trait Replier: Send + Sync {
    async fn reply(&self, subject: &str, payload: Vec<u8>) -> Result<(), TransportError>;
}

/// Replies over a NATS connection
#[derive(Clone)]
pub struct NatsReplier {
    client: async_nats::Client,
}

impl NatsReplier {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Replier for NatsReplier {
    async fn reply(&self, subject: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| TransportError::Publish(e.to_string()))
    }
}

/// A reply captured by `MemoryReplier`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReply {
    pub subject: String,
    pub payload: Vec<u8>,
}

/// Records replies in memory instead of sending them
#[derive(Debug, Default)]
pub struct MemoryReplier {
    sent: Mutex<Vec<SentReply>>,
}

impl MemoryReplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replies sent so far, in send order
    pub fn replies(&self) -> Vec<SentReply> {
        self.sent.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl Replier for MemoryReplier {
    async fn reply(&self, subject: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        debug!(subject = subject, bytes = payload.len(), "Recording reply");
        self.sent.lock().push(SentReply {
            subject: subject.to_string(),
            payload,
        });
        Ok(())
    }
}

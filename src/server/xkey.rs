//! Payload transform for encrypted callouts
//!
//! When the server sends a `Nats-Server-Xkey` header the request payload is
//! sealed for this service and the reply must be sealed for the server. The
//! transform is pluggable; the default passes bytes through unchanged.

use thiserror::Error;

/// Header carrying the server's curve public key
pub const SERVER_XKEY_HEADER: &str = "Nats-Server-Xkey";

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("error decrypting message")]
    Open(String),

    #[error("error encrypting response")]
    Seal(String),
}

pub trait PayloadTransform: Send + Sync {
    /// Encrypt an outgoing payload for `peer_key`
    fn seal(&self, payload: &[u8], peer_key: &str) -> Result<Vec<u8>, TransformError>;

    /// Decrypt an incoming payload from `peer_key`
    fn open(&self, payload: &[u8], peer_key: &str) -> Result<Vec<u8>, TransformError>;
}

/// Pass-through transform
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransform;

impl PayloadTransform for NoopTransform {
    fn seal(&self, payload: &[u8], _peer_key: &str) -> Result<Vec<u8>, TransformError> {
        Ok(payload.to_vec())
    }

    fn open(&self, payload: &[u8], _peer_key: &str) -> Result<Vec<u8>, TransformError> {
        Ok(payload.to_vec())
    }
}

//! Signed claims in and out
//!
//! - `jwt`: the token envelope (header, claims, nkey signature)
//! - `request`: what the server sends on the callout subject
//! - `response`: what the service replies with
//! - `user`: the user JWT minted for a granted connection
//!
//! The `ClaimsCodec` trait is the seam the dispatcher consumes;
//! `NatsJwtCodec` is the production implementation.

mod codec;
pub mod jwt;
mod keys;
mod request;
mod response;
mod user;

pub use codec::NatsJwtCodec;
pub use keys::IssuerKey;
pub use request::{
    AuthorizationRequest, AuthorizationRequestClaims, ClientInfo, ConnectOptions, ServerId,
    AUTH_REQUEST_AUDIENCE, AUTH_REQUEST_TYPE,
};
pub use response::{AuthorizationResponseClaims, ResponsePayload, AUTH_RESPONSE_TYPE};
pub use user::{UserClaims, NO_LIMIT, USER_CLAIM_TYPE};

use crate::auth::Grant;
use thiserror::Error;

/// Token decode/encode failures
///
/// Decode messages are sent back to the server verbatim, so no variant
/// carries key material.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("token is not valid UTF-8")]
    NotUtf8,

    #[error("invalid token format: expected 3 segments, got {0}")]
    InvalidFormat(usize),

    #[error("unsupported token header: typ '{typ}', alg '{alg}'")]
    UnsupportedHeader { typ: String, alg: String },

    #[error("token decode error: {0}")]
    Decode(String),

    #[error("invalid token issuer")]
    InvalidIssuer,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("unexpected claim type: expected '{expected}', got '{got}'")]
    UnexpectedType { expected: &'static str, got: String },

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("claims serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Decodes requests and mints signed responses and user JWTs
///
/// Implementations hold their own issuer key.
pub trait ClaimsCodec: Send + Sync {
    /// Verify and decode a raw request token
    fn decode_request(&self, raw: &[u8]) -> Result<AuthorizationRequest, CodecError>;

    /// Sign a response bound to `requester_key` (subject) and `server_id` (audience)
    fn encode_response(
        &self,
        requester_key: &str,
        server_id: &str,
        payload: &ResponsePayload,
    ) -> Result<String, CodecError>;

    /// Sign a user JWT for a granted connection
    fn encode_grant(&self, grant: &Grant) -> Result<String, CodecError>;
}

//! NATS JWT envelope
//!
//! Format: `base64url(header).base64url(claims).base64url(signature)`, unpadded.
//! The signature is Ed25519 over the first two segments, made with an nkey and
//! verified against the public key in the `iss` claim.

use crate::claims::CodecError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use nkeys::KeyPair;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha512_256};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

pub const TOKEN_TYPE: &str = "JWT";
pub const ALGORITHM: &str = "ed25519-nkey";
/// Accepted on decode for tokens minted by v1 tooling
const LEGACY_ALGORITHM: &str = "ed25519";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub typ: String,
    pub alg: String,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            typ: TOKEN_TYPE.to_string(),
            alg: ALGORITHM.to_string(),
        }
    }
}

/// Standard claims with the NATS-specific section under `nats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims<T> {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jti: String,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub iss: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub sub: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub aud: String,
    pub nats: T,
}

impl<T> Claims<T> {
    pub fn new(subject: impl Into<String>, nats: T) -> Self {
        Self {
            jti: String::new(),
            iat: 0,
            iss: String::new(),
            name: String::new(),
            sub: subject.into(),
            aud: String::new(),
            nats,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn audience(mut self, aud: impl Into<String>) -> Self {
        self.aud = aud.into();
        self
    }
}

/// Only the issuer, read before the full claims so the signature is checked first
#[derive(Deserialize)]
struct IssuerOnly {
    #[serde(default)]
    iss: String,
}

fn now_unix() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => {
            warn!(error = %e, "System clock is before the unix epoch, using iat 0");
            0
        }
    }
}

/// Unpadded base32 SHA-512/256, the way nats-jwt derives `jti`
fn claims_id(unsigned: &[u8]) -> String {
    BASE32_NOPAD.encode(&Sha512_256::digest(unsigned))
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, CodecError> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| CodecError::Decode(e.to_string()))
}

/// Stamp `iss`/`iat`/`jti` and sign
///
/// `jti` is a hash of the claims serialized without it.
pub fn encode<T: Serialize>(mut claims: Claims<T>, signer: &KeyPair) -> Result<String, CodecError> {
    claims.iss = signer.public_key();
    claims.iat = now_unix();
    claims.jti = String::new();

    let unsigned = serde_json::to_vec(&claims)?;
    claims.jti = claims_id(&unsigned);

    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&Header::default())?);
    let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let signature = signer
        .sign(signing_input.as_bytes())
        .map_err(|e| CodecError::Signing(e.to_string()))?;

    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
}

/// Parse a token, verify it against its own issuer and decode the claims
pub fn decode<T: DeserializeOwned>(token: &str) -> Result<Claims<T>, CodecError> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(CodecError::InvalidFormat(parts.len()));
    }

    let header: Header = serde_json::from_slice(&decode_segment(parts[0])?)
        .map_err(|e| CodecError::Decode(e.to_string()))?;
    let supported_alg = header.alg == ALGORITHM || header.alg == LEGACY_ALGORITHM;
    if !header.typ.eq_ignore_ascii_case(TOKEN_TYPE) || !supported_alg {
        return Err(CodecError::UnsupportedHeader {
            typ: header.typ,
            alg: header.alg,
        });
    }

    let claims_json = decode_segment(parts[1])?;
    let issuer: IssuerOnly =
        serde_json::from_slice(&claims_json).map_err(|e| CodecError::Decode(e.to_string()))?;
    let verifier = KeyPair::from_public_key(&issuer.iss).map_err(|_| CodecError::InvalidIssuer)?;

    let signature = decode_segment(parts[2])?;
    let signing_input = &token.trim()[..parts[0].len() + 1 + parts[1].len()];
    verifier
        .verify(signing_input.as_bytes(), &signature)
        .map_err(|_| CodecError::InvalidSignature)?;

    serde_json::from_slice(&claims_json).map_err(|e| CodecError::Decode(e.to_string()))
}

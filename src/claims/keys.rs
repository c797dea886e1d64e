//! Issuer signing key

use crate::claims::CodecError;
use nkeys::{KeyPair, KeyPairType};
use std::fmt;
use std::sync::Arc;

/// Account key that signs every outgoing token
///
/// Its public key is what the server lists as the callout `issuer`.
#[derive(Clone)]
pub struct IssuerKey {
    pair: Arc<KeyPair>,
}

impl IssuerKey {
    /// Parse an account seed (`SA...`)
    pub fn from_seed(seed: &str) -> Result<Self, CodecError> {
        // nkeys errors can echo the input, keep the seed out of the message
        let pair = KeyPair::from_seed(seed.trim())
            .map_err(|_| CodecError::InvalidKey("malformed issuer seed".to_string()))?;

        if !matches!(pair.key_pair_type(), KeyPairType::Account) {
            return Err(CodecError::InvalidKey(
                "issuer seed must be an account seed".to_string(),
            ));
        }

        Ok(Self {
            pair: Arc::new(pair),
        })
    }

    /// Generate a fresh account key
    pub fn generate() -> Self {
        Self {
            pair: Arc::new(KeyPair::new_account()),
        }
    }

    pub fn public_key(&self) -> String {
        self.pair.public_key()
    }

    /// The seed, for `keygen` output only
    pub fn seed(&self) -> Result<String, CodecError> {
        self.pair
            .seed()
            .map_err(|_| CodecError::InvalidKey("issuer key has no seed".to_string()))
    }

    pub(crate) fn key_pair(&self) -> &KeyPair {
        &self.pair
    }
}

impl fmt::Debug for IssuerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IssuerKey({}, seed: [REDACTED])", self.pair.public_key())
    }
}

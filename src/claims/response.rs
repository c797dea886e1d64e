//! Authorization response claims

use serde::{Deserialize, Serialize};

pub const AUTH_RESPONSE_TYPE: &str = "authorization_response";

/// Result carried by a response: a user JWT or an error, never both
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    Grant(String),
    Error(String),
}

impl ResponsePayload {
    pub fn error(reason: impl ToString) -> Self {
        ResponsePayload::Error(reason.to_string())
    }

    pub fn is_grant(&self) -> bool {
        matches!(self, ResponsePayload::Grant(_))
    }
}

/// The `nats` section of a response token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResponseClaims {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jwt: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub issuer_account: String,
    #[serde(default, rename = "type")]
    pub claim_type: String,
    #[serde(default)]
    pub version: u8,
}

impl AuthorizationResponseClaims {
    /// Back to a payload; `None` when the claims carry neither or both
    pub fn payload(&self) -> Option<ResponsePayload> {
        match (self.jwt.is_empty(), self.error.is_empty()) {
            (false, true) => Some(ResponsePayload::Grant(self.jwt.clone())),
            (true, false) => Some(ResponsePayload::Error(self.error.clone())),
            _ => None,
        }
    }
}

impl From<&ResponsePayload> for AuthorizationResponseClaims {
    fn from(payload: &ResponsePayload) -> Self {
        let (jwt, error) = match payload {
            ResponsePayload::Grant(jwt) => (jwt.clone(), String::new()),
            ResponsePayload::Error(error) => (String::new(), error.clone()),
        };

        Self {
            jwt,
            error,
            issuer_account: String::new(),
            claim_type: AUTH_RESPONSE_TYPE.to_string(),
            version: 2,
        }
    }
}

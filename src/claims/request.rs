//! Authorization request claims, as sent by the server

use serde::{Deserialize, Serialize};
use std::fmt;

pub const AUTH_REQUEST_TYPE: &str = "authorization_request";
/// `aud` the server puts on every request
pub const AUTH_REQUEST_AUDIENCE: &str = "nats-authorization-request";

/// Identity of the server instance asking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerId {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster: String,
}

/// What the server knows about the connecting client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub client_type: String,
}

/// The client's CONNECT options
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jwt: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nkey: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sig: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pass: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lang: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default)]
    pub protocol: i32,
}

impl ConnectOptions {
    pub fn with_user_and_password(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
            ..Default::default()
        }
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("user", &self.user)
            .field("pass", &"[REDACTED]")
            .field("auth_token", &"[REDACTED]")
            .field("nkey", &self.nkey)
            .field("name", &self.name)
            .field("lang", &self.lang)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// The `nats` section of a request token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequestClaims {
    pub server_id: ServerId,
    /// Key the server generated for this connection; the grant must be issued to it
    pub user_nkey: String,
    #[serde(default)]
    pub client_info: ClientInfo,
    #[serde(default)]
    pub connect_opts: ConnectOptions,
    #[serde(default, rename = "type")]
    pub claim_type: String,
    #[serde(default)]
    pub version: u8,
}

impl AuthorizationRequestClaims {
    pub fn new(
        server_id: ServerId,
        user_nkey: impl Into<String>,
        connect_opts: ConnectOptions,
    ) -> Self {
        Self {
            server_id,
            user_nkey: user_nkey.into(),
            client_info: ClientInfo::default(),
            connect_opts,
            claim_type: AUTH_REQUEST_TYPE.to_string(),
            version: 2,
        }
    }

    pub fn into_request(self) -> AuthorizationRequest {
        AuthorizationRequest {
            requester_key: self.user_nkey,
            server_id: self.server_id.id,
            server_name: self.server_id.name,
            client_host: self.client_info.host,
            client_name: self.client_info.name,
            user: self.connect_opts.user,
            secret: self.connect_opts.pass,
        }
    }
}

/// The fields the decision pipeline works with
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Echoed back as the response subject
    pub requester_key: String,
    /// Echoed back as the response audience
    pub server_id: String,
    pub server_name: String,
    pub client_host: String,
    pub client_name: String,
    /// Presented username
    pub user: String,
    /// Presented password
    pub secret: String,
}

impl fmt::Debug for AuthorizationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationRequest")
            .field("requester_key", &self.requester_key)
            .field("server_id", &self.server_id)
            .field("server_name", &self.server_name)
            .field("client_host", &self.client_host)
            .field("client_name", &self.client_name)
            .field("user", &self.user)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

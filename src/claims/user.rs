//! User claims minted for a granted connection

use crate::auth::Permissions;
use serde::{Deserialize, Serialize};

pub const USER_CLAIM_TYPE: &str = "user";
/// Limit value meaning "unlimited"
pub const NO_LIMIT: i64 = -1;

/// The `nats` section of a user JWT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    #[serde(flatten)]
    pub permissions: Permissions,
    #[serde(default = "no_limit")]
    pub subs: i64,
    #[serde(default = "no_limit")]
    pub data: i64,
    #[serde(default = "no_limit")]
    pub payload: i64,
    #[serde(default, rename = "type")]
    pub claim_type: String,
    #[serde(default)]
    pub version: u8,
}

fn no_limit() -> i64 {
    NO_LIMIT
}

impl UserClaims {
    pub fn new(permissions: Option<Permissions>) -> Self {
        Self {
            permissions: permissions.unwrap_or_default(),
            subs: NO_LIMIT,
            data: NO_LIMIT,
            payload: NO_LIMIT,
            claim_type: USER_CLAIM_TYPE.to_string(),
            version: 2,
        }
    }
}

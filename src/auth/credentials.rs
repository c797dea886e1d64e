//! Static credential store loaded from a users file
//!
//! The file is a JSON object keyed by username:
//!
//! ```json
//! {
//!   "alice": { "pass": "s3cr3t", "account": "APP" },
//!   "bob": {
//!     "pass": "hunter2",
//!     "account": "APP",
//!     "permissions": { "pub": { "allow": ["bob.>"] }, "resp": { "max": 1 } }
//!   }
//! }
//! ```

use crate::auth::permissions::{PermissionKind, Permissions};
use crate::subjects::SubjectError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read users file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid users file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("user '{user}' has an invalid {kind} subject: {source}")]
    InvalidSubject {
        user: String,
        kind: PermissionKind,
        #[source]
        source: SubjectError,
    },
}

/// One known user
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialRecord {
    /// Shared secret, compared verbatim against the presented password
    #[serde(rename = "pass", alias = "secret")]
    pub secret: String,
    /// Account the user is placed in
    pub account: String,
    /// Absent means no restriction beyond the account
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

impl CredentialRecord {
    pub fn new(secret: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            account: account.into(),
            permissions: None,
        }
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("secret", &"[REDACTED]")
            .field("account", &self.account)
            .field("permissions", &self.permissions)
            .finish()
    }
}

/// Read-only username -> record map
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: HashMap<String, CredentialRecord>,
}

impl CredentialStore {
    /// Load and validate a users file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&data)
    }

    /// Parse and validate users from a JSON document
    pub fn from_json(data: &str) -> Result<Self, LoadError> {
        let users: HashMap<String, CredentialRecord> = serde_json::from_str(data)?;

        for (user, record) in &users {
            if let Some(permissions) = &record.permissions {
                permissions
                    .validate()
                    .map_err(|(kind, source)| LoadError::InvalidSubject {
                        user: user.clone(),
                        kind,
                        source,
                    })?;
            }
        }

        Ok(Self { users })
    }

    pub fn lookup(&self, username: &str) -> Option<&CredentialRecord> {
        self.users.get(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Usernames in sorted order
    pub fn usernames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.users.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<(String, CredentialRecord)> for CredentialStore {
    fn from_iter<T: IntoIterator<Item = (String, CredentialRecord)>>(iter: T) -> Self {
        Self {
            users: iter.into_iter().collect(),
        }
    }
}

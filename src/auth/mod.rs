//! Authentication and authorization
//!
//! - `credentials`: static users file, loaded once at startup
//! - `decision`: approve/deny for a decoded request
//! - `permissions`: pub/sub/resp permissions passed through to user JWTs

mod credentials;
mod decision;
mod permissions;

pub use credentials::{CredentialRecord, CredentialStore, LoadError};
pub use decision::{decide, Decision, Denial, Grant};
pub use permissions::{PermissionKind, Permissions, ResponsePermission, SubjectPermission};

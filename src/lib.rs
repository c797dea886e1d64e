//! Callout - NATS authorization callout service
//!
//! Answers `$SYS.REQ.USER.AUTH` requests from a NATS server: checks the
//! presented username and password against a static users file and replies
//! with a signed response carrying either a freshly minted user JWT or an
//! error.

pub mod auth;
pub mod claims;
pub mod server;
pub mod subjects;

pub use auth::{CredentialRecord, CredentialStore, Decision, Denial, Grant, Permissions};
pub use claims::{ClaimsCodec, IssuerKey, NatsJwtCodec};
pub use server::{CalloutConfig, CalloutService, Dispatcher};

//! Callout server
//!
//! Receives authorization requests from the transport, runs them through the
//! decision pipeline and replies, one request at a time.

mod dispatcher;
mod service;
pub mod transport;
pub mod xkey;

pub use dispatcher::{DispatchStats, Dispatcher, Reply, GRANT_SIGNING_FAILED};
pub use service::{CalloutConfig, CalloutService, NatsConfig, ServiceError};
pub use transport::{
    CalloutMessage, MemoryReplier, NatsReplier, Replier, SentReply, TransportError,
    AUTH_CALLOUT_SUBJECT,
};
pub use xkey::{NoopTransform, PayloadTransform, TransformError, SERVER_XKEY_HEADER};

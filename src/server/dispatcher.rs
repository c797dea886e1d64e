//! Callout dispatcher
//!
//! Per message: open (if the server sent an xkey) → decode → decide →
//! sign → seal → reply. Every reply is a signed response token. If the final
//! response cannot be produced nothing is sent.

use crate::auth::{decide, CredentialStore, Decision};
use crate::claims::{ClaimsCodec, ResponsePayload};
use crate::server::transport::{CalloutMessage, Replier};
use crate::server::xkey::{NoopTransform, PayloadTransform};
use futures::{Stream, StreamExt};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Error text sent when the user JWT could not be signed
pub const GRANT_SIGNING_FAILED: &str = "error signing user JWT";

/// A reply ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub payload: Vec<u8>,
    /// Whether the response carries a user JWT
    pub granted: bool,
}

/// Counters for one `run`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub received: u64,
    pub granted: u64,
    /// Error responses, including undecodable requests
    pub rejected: u64,
    pub replied: u64,
    /// Messages that got no reply
    pub dropped: u64,
}

pub struct Dispatcher {
    codec: Arc<dyn ClaimsCodec>,
    store: Arc<CredentialStore>,
    transform: Arc<dyn PayloadTransform>,
}

impl Dispatcher {
    pub fn new(codec: Arc<dyn ClaimsCodec>, store: Arc<CredentialStore>) -> Self {
        Self {
            codec,
            store,
            transform: Arc::new(NoopTransform),
        }
    }

    /// Replace the pass-through payload transform
    pub fn with_transform(mut self, transform: Arc<dyn PayloadTransform>) -> Self {
        self.transform = transform;
        self
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Consume messages one at a time until the stream ends
    ///
    /// The next message is not pulled until the current one has been
    /// replied to, so a slow signer or transport throttles intake.
    pub async fn run<S, R>(&self, mut inbound: S, replier: &R) -> DispatchStats
    where
        S: Stream<Item = CalloutMessage> + Unpin,
        R: Replier + ?Sized,
    {
        let mut stats = DispatchStats::default();

        while let Some(msg) = inbound.next().await {
            stats.received += 1;
            let span = info_span!("callout", request_id = %Uuid::new_v4());
            self.dispatch(msg, replier, &mut stats).instrument(span).await;
        }

        info!(
            received = stats.received,
            replied = stats.replied,
            dropped = stats.dropped,
            "Callout stream ended"
        );
        stats
    }

    async fn dispatch<R>(&self, msg: CalloutMessage, replier: &R, stats: &mut DispatchStats)
    where
        R: Replier + ?Sized,
    {
        let Some(reply_to) = msg.reply.as_deref() else {
            warn!("Dropping callout request without a reply subject");
            stats.dropped += 1;
            return;
        };

        let Some(reply) = self.respond(&msg) else {
            stats.dropped += 1;
            return;
        };

        if reply.granted {
            stats.granted += 1;
        } else {
            stats.rejected += 1;
        }

        match replier.reply(reply_to, reply.payload).await {
            Ok(()) => stats.replied += 1,
            Err(e) => error!(error = %e, subject = reply_to, "Failed to send callout reply"),
        }
    }

    /// Build the reply for one message without sending it
    ///
    /// `None` only when the response itself could not be encoded or sealed.
    pub fn respond(&self, msg: &CalloutMessage) -> Option<Reply> {
        let xkey = msg.server_xkey.as_deref();

        let payload: Cow<'_, [u8]> = match xkey {
            Some(key) => match self.transform.open(&msg.payload, key) {
                Ok(opened) => Cow::Owned(opened),
                Err(e) => {
                    warn!(error = ?e, "Failed to open request payload");
                    return self.finish("", "", ResponsePayload::error(e), xkey);
                }
            },
            None => Cow::Borrowed(&msg.payload),
        };

        // Nothing in the request is trustworthy until it decodes
        let request = match self.codec.decode_request(&payload) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Rejecting undecodable authorization request");
                return self.finish("", "", ResponsePayload::error(e), xkey);
            }
        };

        debug!(
            user = %request.user,
            server = %request.server_name,
            client_host = %request.client_host,
            "Decoded authorization request"
        );

        let response = match decide(&request, &self.store) {
            Decision::Denied(denial) => {
                info!(user = %request.user, reason = %denial, "Connection denied");
                ResponsePayload::error(denial)
            }
            Decision::Granted(grant) => match self.codec.encode_grant(&grant) {
                Ok(jwt) => {
                    info!(user = %grant.username, account = %grant.account, "Connection granted");
                    ResponsePayload::Grant(jwt)
                }
                Err(e) => {
                    warn!(user = %grant.username, error = %e, "Failed to sign user JWT");
                    ResponsePayload::error(GRANT_SIGNING_FAILED)
                }
            },
        };

        self.finish(&request.requester_key, &request.server_id, response, xkey)
    }

    fn finish(
        &self,
        requester_key: &str,
        server_id: &str,
        payload: ResponsePayload,
        xkey: Option<&str>,
    ) -> Option<Reply> {
        let granted = payload.is_grant();

        let token = match self.codec.encode_response(requester_key, server_id, &payload) {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "Failed to encode response JWT, not replying");
                return None;
            }
        };

        let payload = match xkey {
            Some(key) => match self.transform.seal(token.as_bytes(), key) {
                Ok(sealed) => sealed,
                Err(e) => {
                    error!(error = ?e, "Failed to seal response, not replying");
                    return None;
                }
            },
            None => token.into_bytes(),
        };

        Some(Reply { payload, granted })
    }
}

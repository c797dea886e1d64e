//! NATS JWT implementation of the claims codec

use crate::auth::Grant;
use crate::claims::jwt::{self, Claims};
use crate::claims::{
    AuthorizationRequest, AuthorizationRequestClaims, AuthorizationResponseClaims, ClaimsCodec,
    CodecError, IssuerKey, ResponsePayload, UserClaims, AUTH_REQUEST_TYPE,
};

/// Signs with an account issuer key (non-operator mode)
#[derive(Debug, Clone)]
pub struct NatsJwtCodec {
    issuer: IssuerKey,
}

impl NatsJwtCodec {
    pub fn new(issuer: IssuerKey) -> Self {
        Self { issuer }
    }
}

impl ClaimsCodec for NatsJwtCodec {
    fn decode_request(&self, raw: &[u8]) -> Result<AuthorizationRequest, CodecError> {
        let token = std::str::from_utf8(raw).map_err(|_| CodecError::NotUtf8)?;
        let claims: Claims<AuthorizationRequestClaims> = jwt::decode(token)?;

        if claims.nats.claim_type != AUTH_REQUEST_TYPE {
            return Err(CodecError::UnexpectedType {
                expected: AUTH_REQUEST_TYPE,
                got: claims.nats.claim_type,
            });
        }

        Ok(claims.nats.into_request())
    }

    fn encode_response(
        &self,
        requester_key: &str,
        server_id: &str,
        payload: &ResponsePayload,
    ) -> Result<String, CodecError> {
        let claims = Claims::new(requester_key, AuthorizationResponseClaims::from(payload))
            .audience(server_id);

        jwt::encode(claims, self.issuer.key_pair())
    }

    fn encode_grant(&self, grant: &Grant) -> Result<String, CodecError> {
        // In non-operator mode the audience names the account
        let claims = Claims::new(
            grant.requester_key.as_str(),
            UserClaims::new(grant.permissions.clone()),
        )
        .named(grant.username.as_str())
        .audience(grant.account.as_str());

        jwt::encode(claims, self.issuer.key_pair())
    }
}

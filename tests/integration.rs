//! Integration tests for the callout pipeline
//!
//! Requests are signed with a throwaway server key, run through the
//! dispatcher, and the replies are decoded and checked claim by claim.

use callout::auth::{CredentialRecord, CredentialStore, Permissions, ResponsePermission, SubjectPermission};
use callout::claims::jwt::{self, Claims};
use callout::claims::{
    AuthorizationRequestClaims, AuthorizationResponseClaims, ConnectOptions, IssuerKey,
    NatsJwtCodec, ResponsePayload, ServerId, UserClaims, AUTH_REQUEST_AUDIENCE, USER_CLAIM_TYPE,
};
use callout::server::{CalloutMessage, Dispatcher, MemoryReplier};
use futures::stream;
use nkeys::KeyPair;
use std::sync::Arc;
use std::time::Duration;

const USERS: &str = r#"{
    "alice": { "pass": "s3cr3t", "account": "A" },
    "bob": {
        "pass": "hunter2",
        "account": "APP",
        "permissions": {
            "pub": { "allow": ["bob.>"], "deny": ["bob.admin.>"] },
            "sub": { "allow": ["bob.>", "_INBOX.>"] },
            "resp": { "max": 1, "ttl": 5000000000 }
        }
    }
}"#;

struct Harness {
    issuer: IssuerKey,
    server: KeyPair,
    dispatcher: Dispatcher,
}

impl Harness {
    fn new() -> Self {
        let issuer = IssuerKey::generate();
        let store = CredentialStore::from_json(USERS).unwrap();
        let dispatcher = Dispatcher::new(
            Arc::new(NatsJwtCodec::new(issuer.clone())),
            Arc::new(store),
        );

        Self {
            issuer,
            server: KeyPair::new_server(),
            dispatcher,
        }
    }

    fn request(&self, requester_key: &str, user: &str, pass: &str) -> CalloutMessage {
        let server_id = ServerId {
            name: "n1".to_string(),
            host: "0.0.0.0".to_string(),
            id: self.server.public_key(),
            ..Default::default()
        };
        let nats = AuthorizationRequestClaims::new(
            server_id,
            requester_key,
            ConnectOptions::with_user_and_password(user, pass),
        );
        let token = jwt::encode(
            Claims::new(requester_key, nats).audience(AUTH_REQUEST_AUDIENCE),
            &self.server,
        )
        .unwrap();

        CalloutMessage::new(format!("_INBOX.{}", requester_key), token)
    }

    async fn run(&self, messages: Vec<CalloutMessage>) -> Vec<Claims<AuthorizationResponseClaims>> {
        let replier = MemoryReplier::new();
        self.dispatcher.run(stream::iter(messages), &replier).await;

        replier
            .replies()
            .iter()
            .map(|sent| {
                let token = std::str::from_utf8(&sent.payload).unwrap();
                let claims: Claims<AuthorizationResponseClaims> = jwt::decode(token).unwrap();
                assert_eq!(claims.iss, self.issuer.public_key(), "reply not signed by issuer");
                claims
            })
            .collect()
    }
}

fn user_claims(response: &Claims<AuthorizationResponseClaims>) -> Claims<UserClaims> {
    match response.nats.payload() {
        Some(ResponsePayload::Grant(token)) => jwt::decode(&token).unwrap(),
        other => panic!("expected a grant, got {:?}", other),
    }
}

#[tokio::test]
async fn test_grant_for_valid_credentials() {
    let h = Harness::new();
    let user_key = KeyPair::new_user().public_key();

    let replies = h.run(vec![h.request(&user_key, "alice", "s3cr3t")]).await;
    assert_eq!(replies.len(), 1);

    let response = &replies[0];
    assert_eq!(response.sub, user_key);
    assert_eq!(response.aud, h.server.public_key());
    assert!(response.nats.error.is_empty());

    let user = user_claims(response);
    assert_eq!(user.iss, h.issuer.public_key());
    assert_eq!(user.name, "alice");
    assert_eq!(user.sub, user_key);
    assert_eq!(user.aud, "A");
    assert_eq!(user.nats.claim_type, USER_CLAIM_TYPE);
    assert!(user.nats.permissions.is_empty());
}

#[tokio::test]
async fn test_grant_carries_stored_permissions() {
    let h = Harness::new();

    let replies = h.run(vec![h.request("UBOB", "bob", "hunter2")]).await;
    let user = user_claims(&replies[0]);

    let expected = Permissions {
        publish: SubjectPermission {
            allow: vec!["bob.>".to_string()],
            deny: vec!["bob.admin.>".to_string()],
        },
        subscribe: SubjectPermission::allow(["bob.>", "_INBOX.>"]),
        response: Some(ResponsePermission {
            max: 1,
            ttl: Duration::from_secs(5),
        }),
    };
    assert_eq!(user.aud, "APP");
    assert_eq!(user.nats.permissions, expected);
}

#[tokio::test]
async fn test_invalid_credentials() {
    let h = Harness::new();

    let replies = h.run(vec![h.request("UALICE", "alice", "wrong")]).await;
    let response = &replies[0];

    assert_eq!(response.nats.error, "invalid credentials");
    assert!(response.nats.jwt.is_empty());
    assert_eq!(response.sub, "UALICE");
    assert_eq!(response.aud, h.server.public_key());
}

#[tokio::test]
async fn test_unknown_user() {
    let h = Harness::new();

    let replies = h.run(vec![h.request("UBOB", "carol", "x")]).await;
    let response = &replies[0];

    assert_eq!(response.nats.error, "user not found");
    assert!(response.nats.jwt.is_empty());
    assert_eq!(response.sub, "UBOB");
    assert_eq!(response.aud, h.server.public_key());
}

#[tokio::test]
async fn test_undecodable_request_gets_unbound_error() {
    let h = Harness::new();

    let mut forged = h.request("UALICE", "alice", "s3cr3t");
    // Re-sign the same claims with a different key but keep the original issuer
    let parts: Vec<String> = String::from_utf8(forged.payload.clone())
        .unwrap()
        .split('.')
        .map(str::to_string)
        .collect();
    let other = h.request("UOTHER", "alice", "s3cr3t");
    let other_sig = String::from_utf8(other.payload).unwrap().rsplit('.').next().unwrap().to_string();
    forged.payload = format!("{}.{}.{}", parts[0], parts[1], other_sig).into_bytes();

    let messages = vec![
        CalloutMessage::new("_INBOX.garbage", b"not a token".to_vec()),
        forged,
    ];
    let replies = h.run(messages).await;
    assert_eq!(replies.len(), 2);

    assert_eq!(replies[0].sub, "");
    assert_eq!(replies[0].aud, "");
    assert_eq!(
        replies[0].nats.error,
        "invalid token format: expected 3 segments, got 1"
    );

    assert_eq!(replies[1].sub, "");
    assert_eq!(replies[1].aud, "");
    assert_eq!(replies[1].nats.error, "invalid token signature");
}

#[tokio::test]
async fn test_same_request_twice_gives_equivalent_grants() {
    let h = Harness::new();
    let msg = h.request("UBOB", "bob", "hunter2");

    let replies = h.run(vec![msg.clone(), msg]).await;
    assert_eq!(replies.len(), 2);

    let first = user_claims(&replies[0]);
    let second = user_claims(&replies[1]);
    assert_eq!(first.sub, second.sub);
    assert_eq!(first.name, second.name);
    assert_eq!(first.aud, second.aud);
    assert_eq!(first.nats, second.nats);
}

#[tokio::test]
async fn test_one_reply_per_message_on_its_reply_subject() {
    let h = Harness::new();
    let messages = vec![
        h.request("U1", "alice", "s3cr3t"),
        h.request("U2", "alice", "wrong"),
        h.request("U3", "nobody", "x"),
        CalloutMessage::new("_INBOX.U4", b"junk".to_vec()),
    ];

    let replier = MemoryReplier::new();
    let stats = h.dispatcher.run(stream::iter(messages), &replier).await;

    let subjects: Vec<String> = replier.replies().into_iter().map(|r| r.subject).collect();
    assert_eq!(subjects, vec!["_INBOX.U1", "_INBOX.U2", "_INBOX.U3", "_INBOX.U4"]);

    assert_eq!(stats.received, 4);
    assert_eq!(stats.granted, 1);
    assert_eq!(stats.rejected, 3);
    assert_eq!(stats.replied, 4);
    assert_eq!(stats.dropped, 0);
}

#[tokio::test]
async fn test_scenario_alice_bob() {
    let issuer = IssuerKey::generate();
    let store: CredentialStore = [("alice".to_string(), CredentialRecord::new("s3cr3t", "A"))]
        .into_iter()
        .collect();
    let h = Harness {
        issuer: issuer.clone(),
        server: KeyPair::new_server(),
        dispatcher: Dispatcher::new(Arc::new(NatsJwtCodec::new(issuer)), Arc::new(store)),
    };

    let replies = h
        .run(vec![
            h.request("UA", "alice", "s3cr3t"),
            h.request("UB", "alice", "wrong"),
            h.request("UC", "bob", "x"),
        ])
        .await;

    let granted = user_claims(&replies[0]);
    assert_eq!(granted.aud, "A");
    assert!(granted.nats.permissions.is_empty());

    assert_eq!(replies[1].nats.error, "invalid credentials");
    assert_eq!(replies[2].nats.error, "user not found");
}

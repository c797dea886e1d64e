//! Approve/deny decision for a single authorization request

use crate::auth::credentials::CredentialStore;
use crate::auth::permissions::Permissions;
use crate::claims::AuthorizationRequest;
use thiserror::Error;

/// Expected, user-facing reasons for refusing a connection
///
/// The display strings are sent back to the server verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("user not found")]
    UserNotFound,

    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Everything needed to mint a user JWT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    /// Username as presented by the client
    pub username: String,
    /// Client's nkey, becomes the JWT subject
    pub requester_key: String,
    /// Account name, becomes the JWT audience
    pub account: String,
    pub permissions: Option<Permissions>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Denied(Denial),
    Granted(Grant),
}

impl Decision {
    pub fn is_granted(&self) -> bool {
        matches!(self, Decision::Granted(_))
    }
}

/// Decide whether the request may connect
///
/// Checks run in order and the first failure wins. The secret is compared with
/// plain string equality.
pub fn decide(request: &AuthorizationRequest, store: &CredentialStore) -> Decision {
    let Some(record) = store.lookup(&request.user) else {
        return Decision::Denied(Denial::UserNotFound);
    };

    if record.secret != request.secret {
        return Decision::Denied(Denial::InvalidCredentials);
    }

    Decision::Granted(Grant {
        username: request.user.clone(),
        requester_key: request.requester_key.clone(),
        account: record.account.clone(),
        permissions: record.permissions.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::CredentialRecord;
    use crate::auth::permissions::SubjectPermission;

    fn store() -> CredentialStore {
        let bob_perms = Permissions {
            publish: SubjectPermission::allow(["bob.>"]),
            ..Default::default()
        };

        [
            ("alice".to_string(), CredentialRecord::new("s3cr3t", "A")),
            (
                "bob".to_string(),
                CredentialRecord::new("hunter2", "APP").with_permissions(bob_perms),
            ),
        ]
        .into_iter()
        .collect()
    }

    fn request(user: &str, pass: &str) -> AuthorizationRequest {
        AuthorizationRequest {
            requester_key: "UCLIENTKEY".to_string(),
            server_id: "NSERVERID".to_string(),
            user: user.to_string(),
            secret: pass.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_grant_on_matching_secret() {
        let decision = decide(&request("alice", "s3cr3t"), &store());

        assert_eq!(
            decision,
            Decision::Granted(Grant {
                username: "alice".to_string(),
                requester_key: "UCLIENTKEY".to_string(),
                account: "A".to_string(),
                permissions: None,
            })
        );
    }

    #[test]
    fn test_grant_carries_permissions() {
        let Decision::Granted(grant) = decide(&request("bob", "hunter2"), &store()) else {
            panic!("expected grant");
        };

        assert_eq!(grant.account, "APP");
        assert_eq!(grant.permissions.unwrap().publish.allow, vec!["bob.>"]);
    }

    #[test]
    fn test_wrong_secret() {
        let decision = decide(&request("alice", "wrong"), &store());
        assert_eq!(decision, Decision::Denied(Denial::InvalidCredentials));
    }

    #[test]
    fn test_unknown_user() {
        let decision = decide(&request("bob2", "x"), &store());
        assert_eq!(decision, Decision::Denied(Denial::UserNotFound));
    }

    #[test]
    fn test_unknown_user_checked_before_secret() {
        // Empty user and secret never match an absent record
        let decision = decide(&request("", ""), &store());
        assert_eq!(decision, Decision::Denied(Denial::UserNotFound));
    }

    #[test]
    fn test_secret_is_case_sensitive() {
        let decision = decide(&request("alice", "S3CR3T"), &store());
        assert!(!decision.is_granted());
    }

    #[test]
    fn test_denial_messages() {
        assert_eq!(Denial::UserNotFound.to_string(), "user not found");
        assert_eq!(Denial::InvalidCredentials.to_string(), "invalid credentials");
    }
}

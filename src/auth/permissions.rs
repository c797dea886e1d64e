//! Permission sets attached to user grants

use crate::subjects::{SubjectError, SubjectPattern};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which permission list a subject came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionKind {
    PublishAllow,
    PublishDeny,
    SubscribeAllow,
    SubscribeDeny,
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionKind::PublishAllow => write!(f, "pub.allow"),
            PermissionKind::PublishDeny => write!(f, "pub.deny"),
            PermissionKind::SubscribeAllow => write!(f, "sub.allow"),
            PermissionKind::SubscribeDeny => write!(f, "sub.deny"),
        }
    }
}

/// Ordered allow/deny subject lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectPermission {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<String>,
}

impl SubjectPermission {
    pub fn allow(subjects: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allow: subjects.into_iter().map(Into::into).collect(),
            deny: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }
}

/// Limits on replies to requests the user receives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePermission {
    /// Number of replies allowed per request
    #[serde(default)]
    pub max: i64,
    /// How long the reply subject stays usable
    #[serde(default, with = "duration_nanos")]
    pub ttl: Duration,
}

/// Publish/subscribe/response permissions, passed through to the user JWT untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(
        default,
        rename = "pub",
        alias = "publish",
        skip_serializing_if = "SubjectPermission::is_empty"
    )]
    pub publish: SubjectPermission,

    #[serde(
        default,
        rename = "sub",
        alias = "subscribe",
        skip_serializing_if = "SubjectPermission::is_empty"
    )]
    pub subscribe: SubjectPermission,

    #[serde(
        default,
        rename = "resp",
        alias = "response",
        skip_serializing_if = "Option::is_none"
    )]
    pub response: Option<ResponsePermission>,
}

impl Permissions {
    /// All subjects with the list they belong to, in declaration order
    pub fn subjects(&self) -> impl Iterator<Item = (PermissionKind, &str)> {
        fn tag(kind: PermissionKind, list: &[String]) -> impl Iterator<Item = (PermissionKind, &str)> {
            list.iter().map(move |s| (kind, s.as_str()))
        }

        tag(PermissionKind::PublishAllow, &self.publish.allow)
            .chain(tag(PermissionKind::PublishDeny, &self.publish.deny))
            .chain(tag(PermissionKind::SubscribeAllow, &self.subscribe.allow))
            .chain(tag(PermissionKind::SubscribeDeny, &self.subscribe.deny))
    }

    /// Check every subject is a well-formed pattern
    ///
    /// Queue groups are only meaningful on subscribe lists.
    pub fn validate(&self) -> Result<(), (PermissionKind, SubjectError)> {
        for (kind, subject) in self.subjects() {
            let pattern = SubjectPattern::parse(subject).map_err(|e| (kind, e))?;

            let publishing = matches!(
                kind,
                PermissionKind::PublishAllow | PermissionKind::PublishDeny
            );
            if publishing {
                if let Some(queue) = pattern.queue() {
                    return Err((kind, SubjectError::InvalidQueue(queue.to_string())));
                }
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.publish.is_empty() && self.subscribe.is_empty() && self.response.is_none()
    }
}

/// Serde helper: durations as integer nanoseconds
mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = u64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_permissions_wire_names() {
        let perms = Permissions {
            publish: SubjectPermission::allow(["bob.>"]),
            subscribe: SubjectPermission {
                allow: vec!["bob.>".to_string()],
                deny: vec!["bob.secret".to_string()],
            },
            response: Some(ResponsePermission {
                max: 1,
                ttl: Duration::from_secs(2),
            }),
        };

        let value = serde_json::to_value(&perms).unwrap();
        assert_eq!(
            value,
            json!({
                "pub": {"allow": ["bob.>"]},
                "sub": {"allow": ["bob.>"], "deny": ["bob.secret"]},
                "resp": {"max": 1, "ttl": 2_000_000_000u64}
            })
        );
    }

    #[test]
    fn test_permissions_long_aliases() {
        let perms: Permissions = serde_json::from_value(json!({
            "publish": {"allow": ["a.b"]},
            "subscribe": {"deny": ["c.>"]},
            "response": {"max": 5}
        }))
        .unwrap();

        assert_eq!(perms.publish.allow, vec!["a.b"]);
        assert_eq!(perms.subscribe.deny, vec!["c.>"]);
        assert_eq!(perms.response.as_ref().map(|r| r.max), Some(5));
        assert_eq!(perms.response.unwrap().ttl, Duration::ZERO);
    }

    #[test]
    fn test_empty_permissions_serialize_to_nothing() {
        let value = serde_json::to_value(Permissions::default()).unwrap();
        assert_eq!(value, json!({}));
        assert!(Permissions::default().is_empty());
    }

    #[test]
    fn test_subjects_order() {
        let perms = Permissions {
            publish: SubjectPermission {
                allow: vec!["p.a".into()],
                deny: vec!["p.d".into()],
            },
            subscribe: SubjectPermission {
                allow: vec!["s.a".into()],
                deny: vec!["s.d".into()],
            },
            response: None,
        };

        let subjects: Vec<_> = perms.subjects().collect();
        assert_eq!(
            subjects,
            vec![
                (PermissionKind::PublishAllow, "p.a"),
                (PermissionKind::PublishDeny, "p.d"),
                (PermissionKind::SubscribeAllow, "s.a"),
                (PermissionKind::SubscribeDeny, "s.d"),
            ]
        );
    }

    #[test]
    fn test_validate() {
        let mut perms = Permissions {
            subscribe: SubjectPermission::allow(["jobs.> workers"]),
            ..Default::default()
        };
        assert!(perms.validate().is_ok());

        perms.publish = SubjectPermission::allow(["jobs.> workers"]);
        let (kind, _) = perms.validate().unwrap_err();
        assert_eq!(kind, PermissionKind::PublishAllow);

        perms.publish = SubjectPermission::allow(["jobs..x"]);
        assert!(perms.validate().is_err());
    }
}

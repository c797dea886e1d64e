//! Subject naming and pattern validation
//!
//! Subjects are dot-separated tokens: `orders.eu.created`
//! Tokens are non-empty and contain no whitespace.
//!
//! Wildcards are only special as a whole token:
//! - `orders.*.created` matches exactly one token in that position
//! - `orders.>` matches one or more trailing tokens, only as the last token
//!
//! Tokens like `cpu*` or `b>` are literal, as they are to the server.
//!
//! Subscribe permissions may carry a queue group after a single space:
//! `orders.> workers`.

use std::fmt;
use thiserror::Error;

/// Trailing multi-token wildcard
pub const TAIL_WILDCARD_TOKEN: &str = ">";

fn is_valid_token(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(char::is_whitespace)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubjectError {
    #[error("subject cannot be empty")]
    Empty,

    #[error("invalid token '{0}': tokens cannot contain whitespace")]
    InvalidToken(String),

    #[error("empty token in subject '{0}'")]
    EmptyToken(String),

    #[error("'>' can only appear as the last token")]
    TailWildcardNotAtEnd,

    #[error("invalid queue group '{0}'")]
    InvalidQueue(String),
}

/// A validated subject pattern as it appears in a permission list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectPattern {
    subject: String,
    queue: Option<String>,
}

impl SubjectPattern {
    /// Parse and validate a permission subject
    pub fn parse(pattern: &str) -> Result<Self, SubjectError> {
        if pattern.is_empty() {
            return Err(SubjectError::Empty);
        }

        let (subject, queue) = match pattern.split_once(' ') {
            Some((subject, queue)) => {
                if !is_valid_token(queue) {
                    return Err(SubjectError::InvalidQueue(queue.to_string()));
                }
                (subject, Some(queue.to_string()))
            }
            None => (pattern, None),
        };

        if subject.is_empty() {
            return Err(SubjectError::Empty);
        }

        let tokens: Vec<&str> = subject.split('.').collect();
        let last = tokens.len() - 1;

        for (i, token) in tokens.iter().enumerate() {
            if token.is_empty() {
                return Err(SubjectError::EmptyToken(subject.to_string()));
            }

            if !is_valid_token(token) {
                return Err(SubjectError::InvalidToken(token.to_string()));
            }

            if *token == TAIL_WILDCARD_TOKEN && i != last {
                return Err(SubjectError::TailWildcardNotAtEnd);
            }
        }

        Ok(Self {
            subject: subject.to_string(),
            queue,
        })
    }

    /// The subject without any queue group
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn queue(&self) -> Option<&str> {
        self.queue.as_deref()
    }
}

impl fmt::Display for SubjectPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.queue {
            Some(queue) => write!(f, "{} {}", self.subject, queue),
            None => write!(f, "{}", self.subject),
        }
    }
}

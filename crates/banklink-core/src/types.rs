use std::fmt;

use serde::{Deserialize, Serialize};

/// Uninterpreted metadata attached to widget callbacks.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A single account or transaction record, kept exactly as the backend returned it.
pub type Record = serde_json::Value;

/// Ordered account or transaction records from the most recent sync.
pub type Snapshot = Vec<Record>;

const REDACTION_PREFIX: &str = "******";
const VISIBLE_SUFFIX_CHARS: usize = 8;

/// Render a secret as `******` followed by its last 8 characters.
pub fn redact(secret: &str) -> String {
    let len = secret.chars().count();
    let suffix: String = secret
        .chars()
        .skip(len.saturating_sub(VISIBLE_SUFFIX_CHARS))
        .collect();
    format!("{}{}", REDACTION_PREFIX, suffix)
}

macro_rules! secret_string {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Redacted form, safe for logs and display.
            pub fn redacted(&self) -> String {
                redact(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name))
                    .field(&self.redacted())
                    .finish()
            }
        }
    };
}

secret_string!(
    /// One-time token authorizing a single link-widget session. Never persisted.
    InitToken
);

secret_string!(
    /// Durable credential authorizing repeated data pulls for one linked item.
    AccessCredential
);

/// One-time artifact emitted by the link widget on success.
///
/// The metadata is informational only and never affects committed state.
#[derive(Clone, PartialEq)]
pub struct PublicAuthorization {
    token: String,
    pub metadata: Metadata,
}

impl PublicAuthorization {
    pub fn new(token: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            token: token.into(),
            metadata,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for PublicAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicAuthorization")
            .field("token", &redact(&self.token))
            .field("metadata", &self.metadata)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_keeps_last_eight_chars() {
        assert_eq!(redact("access-sandbox-1234abcd"), "******1234abcd");
        assert_eq!(redact("short"), "******short");
        assert_eq!(redact(""), "******");
    }

    #[test]
    fn test_debug_never_prints_full_secret() {
        let credential = AccessCredential::new("access-sandbox-secret-5678efgh");
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("5678efgh"));

        let public = PublicAuthorization::new("public-sandbox-abcdefgh12345678", Metadata::new());
        let rendered = format!("{:?}", public);
        assert!(!rendered.contains("public-sandbox"));
    }

    #[test]
    fn test_credential_serializes_as_plain_string() {
        let credential = AccessCredential::new("acc-456");
        assert_eq!(serde_json::to_string(&credential).unwrap(), "\"acc-456\"");
    }
}

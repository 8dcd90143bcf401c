//! Snippet identifiers

use crate::error::StoreError;
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Length of every snippet id
pub const ID_LENGTH: usize = 10;

/// Salt used by the Go Playground; keeping it makes ids interchangeable
/// with ids minted there.
const SALT: &[u8] = b"[replace this with something unique]";

/// Content-derived snippet key: 10 characters of `[A-Za-z0-9_-]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SnippetId(String);

impl SnippetId {
    /// `urlsafe_base64(sha1(salt || body))[..10]`
    pub fn for_body(body: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(SALT);
        hasher.update(body);
        let encoded = URL_SAFE.encode(hasher.finalize());
        Self(encoded[..ID_LENGTH].to_string())
    }

    /// Validate an id received from a client
    pub fn parse(id: &str) -> Result<Self, StoreError> {
        if id.len() != ID_LENGTH {
            return Err(StoreError::InvalidId(format!(
                "id length is {} instead of {}",
                id.len(),
                ID_LENGTH
            )));
        }
        if let Some(b) = id.bytes().find(|b| !is_id_byte(*b)) {
            return Err(StoreError::InvalidId(format!(
                "id contains unexpected character {:?}",
                char::from(b)
            )));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

impl std::fmt::Display for SnippetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SnippetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for SnippetId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SnippetId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SnippetId> for String {
    fn from(id: SnippetId) -> Self {
        id.0
    }
}

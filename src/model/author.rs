//! Author identifiers — the nodes of the interaction graph.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw author identifier as it appears in post records (e.g. a screen name).
///
/// Hashes and compares exactly like the underlying string, so graph maps
/// keyed by `AuthorId` can be queried with a plain `&str`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(pub String);

impl AuthorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for AuthorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AuthorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AuthorId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for AuthorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for AuthorId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AuthorId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

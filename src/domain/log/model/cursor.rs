use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque continuation token issued by the log backend.
///
/// Only meaningful together with the interval, filters and page size of the
/// query that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Backends signal "no more pages" with null or an empty string.
    pub fn from_wire(token: Option<String>) -> Option<Self> {
        token.filter(|t| !t.is_empty()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Statement digest used as the ledger key.

use serde::Serialize;
use std::fmt;

/// MD5 digest of a statement's exact bytes, lower-case hex (32 characters).
///
/// Whitespace is significant: `"SELECT 1"` and `"SELECT 1 "` hash differently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StatementHash(String);

impl StatementHash {
    /// Length of the hex-encoded digest.
    pub const HEX_LEN: usize = 32;

    /// Hash the exact text of a statement.
    pub fn of(statement: &str) -> Self {
        Self(format!("{:x}", md5::compute(statement.as_bytes())))
    }

    /// Return the hex digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatementHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StatementHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for StatementHash {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "hash_test.rs"]
mod tests;

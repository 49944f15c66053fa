//! Strongly-typed ledger table name wrapper.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Name of the table that records applied statement hashes.
///
/// The name is operator-supplied configuration and is interpolated into SQL
/// verbatim. It may be schema-qualified (`ops.migrations`). The only enforced
/// invariant is that it is not empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LedgerName(String);

impl LedgerName {
    /// Create a new `LedgerName`, panicking in debug builds if the name is empty.
    ///
    /// Prefer [`try_new`](Self::try_new) for names read from configuration.
    pub fn new(name: impl Into<String>) -> Self {
        let s = name.into();
        debug_assert!(!s.is_empty(), "LedgerName must not be empty");
        Self(s)
    }

    /// Try to create a new `LedgerName`, returning `None` if the name is empty.
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let s = name.into();
        if s.is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Return the underlying name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LedgerName {
    fn default() -> Self {
        Self(crate::DEFAULT_LEDGER_TABLE.to_string())
    }
}

impl<'de> Deserialize<'de> for LedgerName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        LedgerName::try_new(s).ok_or_else(|| serde::de::Error::custom("LedgerName must not be empty"))
    }
}

impl fmt::Display for LedgerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LedgerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for LedgerName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for LedgerName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_new_rejects_empty() {
        assert!(LedgerName::try_new("").is_none());
        assert_eq!(LedgerName::try_new("migrations").unwrap(), "migrations");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "LedgerName must not be empty")]
    fn test_new_empty_panics_in_debug() {
        let _ = LedgerName::new("");
    }

    #[test]
    fn test_default_is_migrations() {
        assert_eq!(LedgerName::default(), "migrations");
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        let err = serde_yaml::from_str::<LedgerName>("''").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));

        let name: LedgerName = serde_yaml::from_str("ops.migrations").unwrap();
        assert_eq!(name, "ops.migrations");
    }
}

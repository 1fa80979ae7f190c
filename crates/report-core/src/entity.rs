//! Normalised entity identifiers (stock tickers)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_LEN: usize = 16;

/// Uppercased, validated external key for a report subject
///
/// # Example
///
/// ```
/// use report_core::EntityId;
///
/// let id = EntityId::parse("  brk.b ").unwrap();
/// assert_eq!(id.as_str(), "BRK.B");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Normalise and validate a raw identifier
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_uppercase();
        let invalid = |reason: &str| Error::InvalidEntity {
            input: raw.to_string(),
            reason: reason.to_string(),
        };

        if normalized.is_empty() {
            return Err(invalid("identifier is empty"));
        }
        if normalized.len() > MAX_LEN {
            return Err(invalid("identifier is too long"));
        }
        if let Some(c) = normalized
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
        {
            return Err(invalid(&format!("unsupported character '{c}'")));
        }
        if !normalized.chars().any(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid("identifier has no alphanumeric characters"));
        }
        if normalized.contains("..") {
            return Err(invalid("identifier contains '..'"));
        }

        Ok(Self(normalized))
    }

    /// Borrow the normalised identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntityId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalises_case_and_whitespace() {
        let id = EntityId::parse(" acme ").unwrap();
        assert_eq!(id.as_str(), "ACME");
        assert_eq!(id.to_string(), "ACME");
    }

    #[test]
    fn test_accepts_exchange_suffixes() {
        assert!(EntityId::parse("brk-b").is_ok());
        assert!(EntityId::parse("^gspc").is_ok());
        assert!(EntityId::parse("7203.t").is_ok());
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(EntityId::parse("").is_err());
        assert!(EntityId::parse("   ").is_err());
        assert!(EntityId::parse("AC ME").is_err());
        assert!(EntityId::parse("../etc").is_err());
        assert!(EntityId::parse("...").is_err());
        assert!(EntityId::parse("ABCDEFGHIJKLMNOPQ").is_err());
    }

    #[test]
    fn test_serde_validates() {
        let id: EntityId = serde_json::from_str("\"msft\"").unwrap();
        assert_eq!(id.as_str(), "MSFT");
        assert!(serde_json::from_str::<EntityId>("\"a/b\"").is_err());
    }
}

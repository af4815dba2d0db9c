//! Validated email address newtype.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("email address is empty")]
    Empty,
    #[error("email address {0:?} is malformed")]
    Malformed(String),
}

/// An email address that has passed shape validation.
///
/// Validation is deliberately shallow: non-empty local part and domain,
/// exactly one `@`, a dot somewhere in the domain, no whitespace. Real
/// ownership is proven by the verification code flow, not by parsing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(EmailError::Malformed(raw.to_string()));
        }
        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(EmailError::Malformed(raw.to_string()));
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(EmailError::Malformed(raw.to_string()));
        }
        // The domain needs an interior dot: "user@host" is rejected,
        // "user@host." as well.
        let dot_ok = domain
            .split_once('.')
            .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty());
        if !dot_ok {
            return Err(EmailError::Malformed(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(EmailAddress::parse("a@b.com").is_ok());
        assert!(EmailAddress::parse("first.last@mail.example.org").is_ok());
    }

    #[test]
    fn lowercases_and_trims() {
        let addr = EmailAddress::parse("  User@Example.COM ").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "plain", "@example.com", "user@", "user@nodot", "a b@c.com", "a@b@c.com", "user@.com", "user@host."] {
            assert!(EmailAddress::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn serde_roundtrip_validates() {
        let addr: EmailAddress = serde_json::from_str("\"a@b.com\"").unwrap();
        assert_eq!(addr.as_str(), "a@b.com");
        assert!(serde_json::from_str::<EmailAddress>("\"not-an-email\"").is_err());
    }
}

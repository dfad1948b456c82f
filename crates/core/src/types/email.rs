//! Subscriber email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why an address was rejected. Messages are shown to the user as-is.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("Please enter your email address.")]
    Empty,
    #[error("Email addresses are limited to {max} characters.")]
    TooLong { max: usize },
    #[error("Please enter a valid email address.")]
    MissingAtSymbol,
    #[error("Please enter the part of your email before the @.")]
    EmptyLocalPart,
    #[error("Please enter the part of your email after the @.")]
    EmptyDomain,
}

/// A normalized subscriber email address.
///
/// Subscription state is keyed by email, so every address is stored in its
/// normalized form: surrounding whitespace trimmed and all characters
/// lowercased. `Email::parse(" Fan@Example.COM ")` and
/// `Email::parse("fan@example.com")` produce equal values.
///
/// ## Constraints
///
/// - Length: 1-254 characters after normalization (RFC 5321 limit)
/// - Must contain an @ symbol
/// - Local part (before @) must not be empty
/// - Domain part (after @) must not be empty
///
/// ## Examples
///
/// ```
/// use concierge_core::Email;
///
/// let email = Email::parse("  Fan@Example.com ").unwrap();
/// assert_eq!(email.as_str(), "fan@example.com");
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("@domain.com").is_err());
/// assert!(Email::parse("user@").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Normalize, then validate.
    ///
    /// # Errors
    ///
    /// Returns the first constraint the normalized address breaks.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let normalized = normalize(s);

        if normalized.is_empty() {
            return Err(EmailError::Empty);
        }

        if normalized.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        match normalized.split_once('@') {
            None => Err(EmailError::MissingAtSymbol),
            Some(("", _)) => Err(EmailError::EmptyLocalPart),
            Some((_, "")) => Err(EmailError::EmptyDomain),
            Some(_) => Ok(Self(normalized)),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Everything after the first `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

/// Trim and lowercase an address the way it is stored.
#[must_use]
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let email = Email::parse("  Fan.Name@Example.COM\n").unwrap();
        assert_eq!(email.as_str(), "fan.name@example.com");
    }

    #[test]
    fn test_normalized_inputs_compare_equal() {
        assert_eq!(
            Email::parse("FAN@example.com").unwrap(),
            Email::parse(" fan@EXAMPLE.com").unwrap()
        );
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_missing_at() {
        assert_eq!(
            Email::parse("no-at-symbol"),
            Err(EmailError::MissingAtSymbol)
        );
    }

    #[test]
    fn test_parse_empty_parts() {
        assert_eq!(Email::parse("@domain.com"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("user@"), Err(EmailError::EmptyDomain));
    }

    #[test]
    fn test_domain() {
        let email = Email::parse("user@example.com").unwrap();
        assert_eq!(email.domain(), "example.com");
    }

    #[test]
    fn test_deserialize_normalizes() {
        let parsed: Email = serde_json::from_str("\" User@Example.com \"").unwrap();
        assert_eq!(parsed.as_str(), "user@example.com");
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"user@example.com\"");
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        assert!(serde_json::from_str::<Email>("\"not-an-email\"").is_err());
    }
}

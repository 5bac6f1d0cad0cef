//! Delivery contact phone number.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Country calling code prefix accepted for delivery contacts.
pub const COUNTRY_PREFIX: &str = "+91";

/// Number of subscriber digits after the country prefix.
pub const SUBSCRIBER_DIGITS: usize = 10;

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input does not start with the supported country prefix.
    #[error("phone number must start with {COUNTRY_PREFIX}")]
    MissingCountryPrefix,
    /// The subscriber part is not exactly ten digits.
    #[error("phone number must have exactly {SUBSCRIBER_DIGITS} digits after {COUNTRY_PREFIX}")]
    InvalidSubscriberNumber,
}

/// A delivery contact phone number.
///
/// The storefront ships domestically only, so every number carries the
/// fixed `+91` prefix followed by exactly ten digits.
///
/// ## Examples
///
/// ```
/// use medleaf_core::Phone;
///
/// assert!(Phone::parse("+919876543210").is_ok());
///
/// assert!(Phone::parse("").is_err());             // empty
/// assert!(Phone::parse("9876543210").is_err());   // missing prefix
/// assert!(Phone::parse("+91987654321").is_err()); // nine digits
/// assert!(Phone::parse("+9198765432x0").is_err()); // non-digit
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse a `Phone` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, does not start with `+91`,
    /// or is not followed by exactly ten digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        let subscriber = s
            .strip_prefix(COUNTRY_PREFIX)
            .ok_or(PhoneError::MissingCountryPrefix)?;

        if subscriber.len() != SUBSCRIBER_DIGITS
            || !subscriber.chars().all(|c| c.is_ascii_digit())
        {
            return Err(PhoneError::InvalidSubscriberNumber);
        }

        Ok(Self(s.to_owned()))
    }

    /// Build a `Phone` from the ten subscriber digits alone, prepending the
    /// country prefix. This is the shape address forms submit.
    ///
    /// # Errors
    ///
    /// Returns an error if `digits` is not exactly ten ASCII digits.
    pub fn from_subscriber(digits: &str) -> Result<Self, PhoneError> {
        Self::parse(&format!("{COUNTRY_PREFIX}{digits}"))
    }

    /// Returns the full number as a string slice, prefix included.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the ten subscriber digits without the country prefix.
    #[must_use]
    pub fn subscriber(&self) -> &str {
        self.0.strip_prefix(COUNTRY_PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let phone = Phone::parse("+919876543210").unwrap();
        assert_eq!(phone.as_str(), "+919876543210");
        assert_eq!(phone.subscriber(), "9876543210");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Phone::parse(""), Err(PhoneError::Empty)));
    }

    #[test]
    fn test_parse_missing_prefix() {
        assert!(matches!(
            Phone::parse("9876543210"),
            Err(PhoneError::MissingCountryPrefix)
        ));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            Phone::parse("+91987654321"),
            Err(PhoneError::InvalidSubscriberNumber)
        ));
        assert!(matches!(
            Phone::parse("+9198765432100"),
            Err(PhoneError::InvalidSubscriberNumber)
        ));
    }

    #[test]
    fn test_parse_non_digit() {
        assert!(matches!(
            Phone::parse("+91abcdefghij"),
            Err(PhoneError::InvalidSubscriberNumber)
        ));
    }

    #[test]
    fn test_from_subscriber() {
        let phone = Phone::from_subscriber("9876543210").unwrap();
        assert_eq!(phone.as_str(), "+919876543210");
        assert!(Phone::from_subscriber("123").is_err());
    }
}

//! Validated value types for domain primitives.
//!
//! Newtype wrappers for email addresses and phone numbers, guaranteed valid
//! once constructed.
//!
//! # Example
//!
//! ```ignore
//! use edulife_models::value_types::{Email, PhoneNumber};
//!
//! let email: Email = "user@example.com".parse().unwrap();
//! let phone: PhoneNumber = "+998901234567".parse().unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::ValidateEmail;

/// Error type for value type parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueTypeError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),
}

// ============================================================================
// Email
// ============================================================================

/// A validated email address, stored lowercased.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
#[serde(try_from = "String")]
pub struct Email(String);

impl Email {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for Email {
    type Err = ValueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized.validate_email() {
            Ok(Self(normalized))
        } else {
            Err(ValueTypeError::InvalidEmail(s.to_string()))
        }
    }
}

impl TryFrom<String> for Email {
    type Error = ValueTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// PhoneNumber
// ============================================================================

/// A validated phone number: optional leading `+`, 7–15 digits.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
#[serde(try_from = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PhoneNumber {
    type Err = ValueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let valid = (7..=15).contains(&digits.len())
            && digits.chars().all(|c| c.is_ascii_digit());
        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ValueTypeError::InvalidPhoneNumber(s.to_string()))
        }
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = ValueTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        let email: Email = " User@Example.COM ".parse().unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn invalid_email_is_rejected() {
        assert!("not-an-email".parse::<Email>().is_err());
        assert!("".parse::<Email>().is_err());
    }

    #[test]
    fn phone_accepts_plus_prefix() {
        assert!("+998901234567".parse::<PhoneNumber>().is_ok());
        assert!("901234567".parse::<PhoneNumber>().is_ok());
    }

    #[test]
    fn phone_rejects_garbage() {
        assert!("abc".parse::<PhoneNumber>().is_err());
        assert!("12345".parse::<PhoneNumber>().is_err());
        assert!("+123456789012345678".parse::<PhoneNumber>().is_err());
    }
}

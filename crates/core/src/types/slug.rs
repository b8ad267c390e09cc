//! Category identifier type.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("Invalid regex"));

/// Errors that can occur when parsing a [`CategorySlug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("Category ID is required")]
    Empty,
    #[error(
        "Category ID must start with a letter and contain only lowercase letters, numbers, and underscores"
    )]
    InvalidFormat,
    #[error("Category ID must be at most {max} characters")]
    TooLong { max: usize },
}

/// Stable identifier of a category, e.g. `software` or `vehicle_hire`.
///
/// Providers reference categories by this value, so it is also the
/// foreign key in the `directory.providers` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CategorySlug(String);

impl CategorySlug {
    pub const MAX_LENGTH: usize = 50;

    /// Parse a slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, does not match
    /// `^[a-z][a-z0-9_]*$`, or exceeds 50 characters.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if !SLUG_PATTERN.is_match(s) {
            return Err(SlugError::InvalidFormat);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategorySlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CategorySlug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for CategorySlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CategorySlug {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for CategorySlug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for CategorySlug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for CategorySlug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_lowercase_identifiers() {
        for ok in ["software", "vehicle_hire", "a", "crm2"] {
            assert!(CategorySlug::parse(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn test_rejects_bad_format() {
        for bad in ["Software", "2fast", "_x", "sales-tools", "with space"] {
            assert_eq!(
                CategorySlug::parse(bad),
                Err(SlugError::InvalidFormat),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_length_boundary() {
        assert!(CategorySlug::parse(&"a".repeat(50)).is_ok());
        assert_eq!(
            CategorySlug::parse(&"a".repeat(51)),
            Err(SlugError::TooLong { max: 50 })
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(CategorySlug::parse("  "), Err(SlugError::Empty));
    }
}

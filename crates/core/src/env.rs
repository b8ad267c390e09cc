//! Environment variable reading shared by the storefront, admin and CLI
//! binaries.
//!
//! [`Env`] reads through a lookup function so configuration loading can be
//! exercised against a map in tests. Blank values count as unset.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

/// Shortest session signing secret accepted.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Lowest Shannon entropy (bits per character) accepted for a secret.
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Fragments that mark a copied-from-docs value (matched case-insensitively).
const PLACEHOLDER_FRAGMENTS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("Missing environment variable: {0}")]
    Missing(String),
    #[error("Invalid environment variable {key}: {reason}")]
    Invalid { key: String, reason: String },
    #[error("Insecure secret in {key}: {reason}")]
    InsecureSecret { key: String, reason: String },
}

/// Sentry client settings. Sentry stays off without a DSN.
#[derive(Debug, Clone, Default)]
pub struct SentrySettings {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

/// A source of environment variables.
pub struct Env<L = fn(&str) -> Option<String>> {
    lookup: L,
}

fn process_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl Env {
    /// Read from the process environment after loading `.env` if present.
    #[must_use]
    pub fn process() -> Self {
        dotenvy::dotenv().ok();
        Self {
            lookup: process_var,
        }
    }
}

impl Env<Box<dyn Fn(&str) -> Option<String>>> {
    /// Read from a fixed set of values.
    #[must_use]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|&(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Self {
            lookup: Box::new(move |key: &str| values.get(key).cloned()),
        }
    }
}

impl<L: Fn(&str) -> Option<String>> Env<L> {
    /// The trimmed value of `key`, or `None` when unset or blank.
    #[must_use]
    pub fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }

    /// The first of `keys` that is set.
    #[must_use]
    pub fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.optional(key))
    }

    /// # Errors
    ///
    /// Returns `EnvError::Missing` when `key` is unset or blank.
    pub fn required(&self, key: &str) -> Result<String, EnvError> {
        self.optional(key)
            .ok_or_else(|| EnvError::Missing(key.to_owned()))
    }

    /// Parse `key`, falling back to `default` when unset.
    ///
    /// # Errors
    ///
    /// Returns `EnvError::Invalid` when the value does not parse.
    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T, EnvError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.parse().map_err(|e: T::Err| EnvError::Invalid {
                key: key.to_owned(),
                reason: e.to_string(),
            })
        })
    }

    /// Parse `key` with a domain parser when it is set.
    ///
    /// # Errors
    ///
    /// Returns `EnvError::Invalid` when the parser rejects the value.
    pub fn parse_optional<T, E: Display>(
        &self,
        key: &str,
        parse: impl FnOnce(&str) -> Result<T, E>,
    ) -> Result<Option<T>, EnvError> {
        self.optional(key)
            .map(|raw| {
                parse(&raw).map_err(|e| EnvError::Invalid {
                    key: key.to_owned(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// A required signing secret that passes [`check_secret`].
    ///
    /// # Errors
    ///
    /// Returns `EnvError::Missing` when unset and `EnvError::InsecureSecret`
    /// when too short, a placeholder, or low in entropy.
    pub fn secret(&self, key: &str) -> Result<SecretString, EnvError> {
        let value = self.required(key)?;
        check_secret(&value).map_err(|reason| EnvError::InsecureSecret {
            key: key.to_owned(),
            reason,
        })?;
        Ok(SecretString::from(value))
    }

    /// `SENTRY_*` settings shared by every binary.
    ///
    /// # Errors
    ///
    /// Returns `EnvError::Invalid` when a sample rate is not a number.
    pub fn sentry(&self) -> Result<SentrySettings, EnvError> {
        Ok(SentrySettings {
            dsn: self.optional("SENTRY_DSN"),
            environment: self.optional("SENTRY_ENVIRONMENT"),
            sample_rate: self.parse_or("SENTRY_SAMPLE_RATE", 1.0)?,
            traces_sample_rate: self.parse_or("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        })
    }
}

/// Reject secrets that are short, copied placeholders, or low in entropy.
///
/// # Errors
///
/// Returns a human-readable reason.
pub fn check_secret(value: &str) -> Result<(), String> {
    let length = value.chars().count();
    if length < MIN_SECRET_LENGTH {
        return Err(format!(
            "must be at least {MIN_SECRET_LENGTH} characters (got {length})"
        ));
    }

    let lower = value.to_lowercase();
    if let Some(fragment) = PLACEHOLDER_FRAGMENTS.iter().find(|f| lower.contains(*f)) {
        return Err(format!("appears to be a placeholder (contains '{fragment}')"));
    }

    let entropy = shannon_entropy(value);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
        ));
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn shannon_entropy(s: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }
    if counts.is_empty() {
        return 0.0;
    }

    let len = counts.values().sum::<usize>() as f64;
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / len;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const STRONG: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

    #[test]
    fn test_blank_values_count_as_unset() {
        let env = Env::from_pairs(&[("A", "  "), ("B", " value ")]);
        assert_eq!(env.optional("A"), None);
        assert_eq!(env.optional("B").as_deref(), Some("value"));
        assert!(matches!(env.required("A"), Err(EnvError::Missing(k)) if k == "A"));
    }

    #[test]
    fn test_first_of_prefers_earlier_keys() {
        let env = Env::from_pairs(&[("DATABASE_URL", "postgres://fallback")]);
        assert_eq!(
            env.first_of(&["ADMIN_DATABASE_URL", "DATABASE_URL"]).as_deref(),
            Some("postgres://fallback")
        );
    }

    #[test]
    fn test_parse_or_defaults_and_rejects() {
        let env = Env::from_pairs(&[("PORT", "80x")]);
        assert_eq!(env.parse_or("COOLDOWN", 30_i64).unwrap(), 30);
        assert!(matches!(
            env.parse_or("PORT", 3000_u16),
            Err(EnvError::Invalid { key, .. }) if key == "PORT"
        ));
    }

    #[test]
    fn test_secret_checks() {
        assert!(check_secret("short").is_err());
        assert!(check_secret("your-session-key-here-0123456789abcdef").is_err());
        assert!(check_secret(&"a".repeat(40)).is_err());
        assert!(check_secret(STRONG).is_ok());

        let env = Env::from_pairs(&[("SESSION", STRONG)]);
        assert_eq!(env.secret("SESSION").unwrap().expose_secret(), STRONG);
    }

    #[test]
    fn test_entropy() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_sentry_defaults() {
        let sentry = Env::from_pairs(&[]).sentry().unwrap();
        assert!(sentry.dsn.is_none());
        assert!((sentry.sample_rate - 1.0).abs() < f32::EPSILON);
        assert!((sentry.traces_sample_rate - 0.1).abs() < f32::EPSILON);
    }
}

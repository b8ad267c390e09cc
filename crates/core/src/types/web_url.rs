//! Website and logo URLs.

use core::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WebUrlError {
    #[error("not a valid URL")]
    Malformed,
    #[error("URL must start with http:// or https://")]
    UnsupportedScheme,
}

/// An absolute `http` or `https` URL.
///
/// ```
/// use appy_link_core::WebUrl;
///
/// assert!(WebUrl::parse("https://basilfry.co.uk").is_ok());
/// assert!(WebUrl::parse("ftp://files.example.com").is_err());
/// assert!(WebUrl::parse("basilfry.co.uk").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct WebUrl(Url);

impl WebUrl {
    /// Parse a URL, accepting only the `http` and `https` schemes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not parse or uses another scheme.
    pub fn parse(s: &str) -> Result<Self, WebUrlError> {
        let url = Url::parse(s.trim()).map_err(|_| WebUrlError::Malformed)?;
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            _ => Err(WebUrlError::UnsupportedScheme),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Hostname without port, if any.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }
}

impl fmt::Display for WebUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for WebUrl {
    type Error = WebUrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WebUrl> for String {
    fn from(value: WebUrl) -> Self {
        value.0.into()
    }
}

/// Returns `true` for absolute `http`/`https` URLs.
#[must_use]
pub fn is_web_url(s: &str) -> bool {
    WebUrl::parse(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schemes() {
        assert!(is_web_url("http://example.com"));
        assert!(is_web_url("https://www.moneypenny.com/uk"));
        assert!(!is_web_url("mailto:ops@example.com"));
        assert!(!is_web_url("javascript:alert(1)"));
        assert!(!is_web_url("www.example.com"));
        assert!(!is_web_url(""));
    }

    #[test]
    fn test_host() {
        let url = WebUrl::parse("https://www.movemanpro.com/pricing").ok();
        assert_eq!(url.as_ref().and_then(WebUrl::host), Some("www.movemanpro.com"));
    }
}

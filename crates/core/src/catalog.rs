//! Directory entities: categories, providers, submissions and contact messages.
//!
//! These are plain data types shared by the storefront (read side), the admin
//! portal (write side) and the seed list. Database row types live in the
//! binaries and convert into these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    AccountId, CategorySlug, ContactMessageId, ProviderId, ProviderTier, SubmissionId,
    SubmissionStatus, WebUrl,
};

/// Favicon service used when a provider has no logo of its own.
const FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons";

/// A topical grouping of providers, e.g. "Software & CRM".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategorySlug,
    pub label: String,
    pub sort_order: i32,
}

/// A promotional offer attached to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    /// Short badge text, e.g. "10% off first year".
    pub label: String,
    pub details: Option<String>,
}

/// A supplier listed in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub category: CategorySlug,
    pub tags: Vec<String>,
    pub website: Option<String>,
    pub summary: String,
    pub details: String,
    pub discount: Option<Discount>,
    pub logo_url: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub featured_until: Option<DateTime<Utc>>,
    pub tier: ProviderTier,
}

impl Provider {
    /// Whether the provider gets priority placement at `now`.
    ///
    /// A featured flag without an expiry never lapses.
    #[must_use]
    pub fn is_featured_at(&self, now: DateTime<Utc>) -> bool {
        self.is_featured && self.featured_until.is_none_or(|until| until > now)
    }

    #[must_use]
    pub const fn has_discount(&self) -> bool {
        self.discount.is_some()
    }

    /// Image URL to show for this provider.
    ///
    /// Uses the explicit logo when set, otherwise the website's favicon,
    /// otherwise a generic favicon.
    #[must_use]
    pub fn logo_src(&self) -> String {
        if let Some(logo) = self.logo_url.as_deref().filter(|l| !l.trim().is_empty()) {
            return logo.to_owned();
        }
        let host = self
            .website
            .as_deref()
            .and_then(|w| WebUrl::parse(w).ok())
            .and_then(|url| url.host().map(str::to_owned))
            .unwrap_or_else(|| "example.com".to_owned());
        format!("{FAVICON_SERVICE}?domain={host}&sz=128")
    }
}

/// A publicly proposed provider awaiting review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSubmission {
    pub id: SubmissionId,
    pub company_name: String,
    pub category: CategorySlug,
    pub website: Option<String>,
    pub description: String,
    pub discount: Option<String>,
    pub status: SubmissionStatus,
    pub reviewed_by: Option<AccountId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    /// Provider created when the submission was approved.
    pub provider_id: Option<ProviderId>,
    pub created_at: DateTime<Utc>,
}

/// A message sent through the public contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn provider() -> Provider {
        Provider {
            id: ProviderId::new(1),
            name: "MoveMan".to_owned(),
            category: CategorySlug::parse("software").unwrap(),
            tags: vec!["crm".to_owned()],
            website: Some("https://www.movemanpro.com".to_owned()),
            summary: "UK removals CRM".to_owned(),
            details: String::new(),
            discount: None,
            logo_url: None,
            is_active: true,
            is_featured: true,
            featured_until: None,
            tier: ProviderTier::Featured,
        }
    }

    #[test]
    fn test_featured_without_expiry() {
        assert!(provider().is_featured_at(Utc::now()));
    }

    #[test]
    fn test_featured_expires() {
        let now = Utc::now();
        let mut p = provider();
        p.featured_until = Some(now - Duration::days(1));
        assert!(!p.is_featured_at(now));
        p.featured_until = Some(now + Duration::days(1));
        assert!(p.is_featured_at(now));
        p.is_featured = false;
        assert!(!p.is_featured_at(now));
    }

    #[test]
    fn test_logo_prefers_explicit_url() {
        let mut p = provider();
        p.logo_url = Some("https://cdn.example.com/moveman.png".to_owned());
        assert_eq!(p.logo_src(), "https://cdn.example.com/moveman.png");
    }

    #[test]
    fn test_logo_falls_back_to_favicon() {
        let p = provider();
        assert_eq!(
            p.logo_src(),
            "https://www.google.com/s2/favicons?domain=www.movemanpro.com&sz=128"
        );
    }

    #[test]
    fn test_logo_without_website() {
        let mut p = provider();
        p.website = Some("not a url".to_owned());
        assert!(p.logo_src().contains("domain=example.com"));
        p.website = None;
        assert!(p.logo_src().contains("domain=example.com"));
    }
}

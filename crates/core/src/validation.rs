//! Field-level validation for every form in the application.
//!
//! Each `validate_*` function takes the raw form input and either returns the
//! cleaned, typed value ready to persist or a [`FieldErrors`] map that the
//! page re-renders inline next to the offending fields.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Category, Discount};
use crate::types::{CategorySlug, Email, EmailError, ProviderTier, is_web_url};

/// Validation failures keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. The first error per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn optional(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_owned())
}

/// Checks a required text field against inclusive length bounds.
fn check_length(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = char_len(value);
    if len == 0 {
        errors.add(field, format!("{label} is required"));
    } else if len < min {
        errors.add(field, format!("{label} must be at least {min} characters"));
    } else if len > max {
        errors.add(field, format!("{label} must be at most {max} characters"));
    }
}

fn resolve_category(
    errors: &mut FieldErrors,
    field: &str,
    raw: &str,
    known: &[Category],
) -> Option<CategorySlug> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add(field, "Category is required");
        return None;
    }
    let found = known.iter().find(|c| c.id == *raw).map(|c| c.id.clone());
    if found.is_none() {
        errors.add(field, "Please choose a category from the list");
    }
    found
}

// =============================================================================
// Listing submission
// =============================================================================

/// Raw values from the public "list your business" form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SubmissionInput {
    pub company_name: String,
    pub category: String,
    pub website: String,
    pub description: String,
    pub discount: String,
}

/// A validated submission ready to store or queue as a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubmission {
    pub company_name: String,
    pub category: CategorySlug,
    pub website: Option<String>,
    pub description: String,
    pub discount: Option<String>,
}

pub const COMPANY_NAME_MIN: usize = 2;
pub const COMPANY_NAME_MAX: usize = 100;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 500;
pub const DISCOUNT_MAX: usize = 100;

/// Validate a listing submission.
///
/// # Errors
///
/// Returns the per-field errors when any field is invalid.
pub fn validate_submission(
    input: &SubmissionInput,
    categories: &[Category],
) -> Result<NewSubmission, FieldErrors> {
    let mut errors = FieldErrors::new();

    let company_name = input.company_name.trim();
    check_length(
        &mut errors,
        "company_name",
        "Company name",
        company_name,
        COMPANY_NAME_MIN,
        COMPANY_NAME_MAX,
    );

    let category = resolve_category(&mut errors, "category", &input.category, categories);

    let website = optional(&input.website);
    if website.as_deref().is_some_and(|w| !is_web_url(w)) {
        errors.add(
            "website",
            "Please enter a valid URL starting with http:// or https://",
        );
    }

    let description = input.description.trim();
    check_length(
        &mut errors,
        "description",
        "Description",
        description,
        DESCRIPTION_MIN,
        DESCRIPTION_MAX,
    );

    let discount = optional(&input.discount);
    if discount.as_deref().is_some_and(|d| char_len(d) > DISCOUNT_MAX) {
        errors.add(
            "discount",
            format!("Discount must be at most {DISCOUNT_MAX} characters"),
        );
    }

    match category {
        Some(category) if errors.is_empty() => Ok(NewSubmission {
            company_name: company_name.to_owned(),
            category,
            website,
            description: description.to_owned(),
            discount,
        }),
        _ => Err(errors),
    }
}

// =============================================================================
// Contact message
// =============================================================================

/// Raw values from the public contact form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContactMessage {
    pub name: String,
    pub email: Email,
    pub message: String,
}

pub const CONTACT_NAME_MAX: usize = 100;
pub const MESSAGE_MIN: usize = 10;
pub const MESSAGE_MAX: usize = 1000;

/// Validate a contact message.
///
/// # Errors
///
/// Returns the per-field errors when any field is invalid.
pub fn validate_contact(input: &ContactInput) -> Result<NewContactMessage, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = input.name.trim();
    check_length(&mut errors, "name", "Name", name, 1, CONTACT_NAME_MAX);

    let email = match Email::parse(&input.email) {
        Ok(email) => Some(email),
        Err(EmailError::Empty) => {
            errors.add("email", "Email is required");
            None
        }
        Err(_) => {
            errors.add("email", "Please enter a valid email address");
            None
        }
    };

    let message = input.message.trim();
    check_length(
        &mut errors,
        "message",
        "Message",
        message,
        MESSAGE_MIN,
        MESSAGE_MAX,
    );

    match email {
        Some(email) if errors.is_empty() => Ok(NewContactMessage {
            name: name.to_owned(),
            email,
            message: message.to_owned(),
        }),
        _ => Err(errors),
    }
}

// =============================================================================
// Provider (admin)
// =============================================================================

/// Provider fields as edited in the admin form.
///
/// Unchecked checkboxes are absent from a form post, so every field defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderInput {
    pub name: String,
    pub category: String,
    /// Comma-separated.
    pub tags: String,
    pub website: String,
    pub summary: String,
    pub details: String,
    pub discount_label: String,
    pub discount_details: String,
    pub logo_url: String,
    pub is_active: bool,
    pub is_featured: bool,
    /// `YYYY-MM-DD`, blank for no expiry.
    pub featured_until: String,
    pub tier: String,
}

/// A validated provider, used for both inserts and updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProvider {
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

pub const PROVIDER_NAME_MAX: usize = 100;
pub const SUMMARY_MAX: usize = 300;

/// Split a comma-separated tag list into trimmed, de-duplicated tags.
#[must_use]
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            tags.push(tag.to_owned());
        }
    }
    tags
}

/// Validate a provider from the admin form.
///
/// # Errors
///
/// Returns the per-field errors when any field is invalid.
pub fn validate_provider(
    input: &ProviderInput,
    categories: &[Category],
) -> Result<NewProvider, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = input.name.trim();
    check_length(&mut errors, "name", "Provider name", name, 1, PROVIDER_NAME_MAX);

    let category = resolve_category(&mut errors, "category", &input.category, categories);

    let website = optional(&input.website);
    if website.as_deref().is_some_and(|w| !is_web_url(w)) {
        errors.add("website", "Invalid URL format");
    }

    let logo_url = optional(&input.logo_url);
    if logo_url.as_deref().is_some_and(|l| !is_web_url(l)) {
        errors.add("logo_url", "Invalid logo URL");
    }

    let summary = input.summary.trim();
    if char_len(summary) > SUMMARY_MAX {
        errors.add(
            "summary",
            format!("Summary must be at most {SUMMARY_MAX} characters"),
        );
    }

    let discount = match (
        optional(&input.discount_label),
        optional(&input.discount_details),
    ) {
        (Some(label), details) => {
            if char_len(&label) > DISCOUNT_MAX {
                errors.add(
                    "discount_label",
                    format!("Discount label must be at most {DISCOUNT_MAX} characters"),
                );
            }
            Some(Discount { label, details })
        }
        (None, Some(_)) => {
            errors.add("discount_label", "Discount details need a label");
            None
        }
        (None, None) => None,
    };

    let featured_until = match optional(&input.featured_until) {
        None => None,
        Some(raw) => match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => date.and_hms_opt(23, 59, 59).map(|dt| dt.and_utc()),
            Err(_) => {
                errors.add("featured_until", "Use the format YYYY-MM-DD");
                None
            }
        },
    };

    let tier = match input.tier.trim() {
        "" => ProviderTier::default(),
        raw => raw.parse().unwrap_or_else(|_| {
            errors.add("tier", "Choose free, featured or sponsor");
            ProviderTier::default()
        }),
    };

    match category {
        Some(category) if errors.is_empty() => Ok(NewProvider {
            name: name.to_owned(),
            category,
            tags: parse_tags(&input.tags),
            website,
            summary: summary.to_owned(),
            details: input.details.trim().to_owned(),
            discount,
            logo_url,
            is_active: input.is_active,
            is_featured: input.is_featured,
            featured_until,
            tier,
        }),
        _ => Err(errors),
    }
}

// =============================================================================
// Category (admin)
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CategoryInput {
    pub id: String,
    pub label: String,
    pub sort_order: String,
}

pub const CATEGORY_LABEL_MAX: usize = 100;

/// Validate a category.
///
/// # Errors
///
/// Returns the per-field errors when any field is invalid.
pub fn validate_category(input: &CategoryInput) -> Result<Category, FieldErrors> {
    let mut errors = FieldErrors::new();

    let id = CategorySlug::parse(&input.id)
        .map_err(|e| errors.add("id", e.to_string()))
        .ok();

    let label = input.label.trim();
    if label.is_empty() {
        errors.add("label", "Category label is required");
    } else if char_len(label) > CATEGORY_LABEL_MAX {
        errors.add(
            "label",
            format!("Category label must be at most {CATEGORY_LABEL_MAX} characters"),
        );
    }

    let sort_order = match input.sort_order.trim() {
        "" => 0,
        raw => raw.parse::<i32>().unwrap_or_else(|_| {
            errors.add("sort_order", "Sort order must be a whole number");
            0
        }),
    };

    match id {
        Some(id) if errors.is_empty() => Ok(Category {
            id,
            label: label.to_owned(),
            sort_order,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::seed;

    fn submission(name: &str, description: &str) -> SubmissionInput {
        SubmissionInput {
            company_name: name.to_owned(),
            category: "software".to_owned(),
            website: String::new(),
            description: description.to_owned(),
            discount: String::new(),
        }
    }

    #[test]
    fn test_company_name_boundaries() {
        let cats = seed::categories();
        let desc = "Removals CRM";

        let err = validate_submission(&submission("M", desc), &cats).unwrap_err();
        assert!(err.has("company_name"));
        assert!(validate_submission(&submission("Mo", desc), &cats).is_ok());
        assert!(validate_submission(&submission(&"x".repeat(100), desc), &cats).is_ok());
        let err = validate_submission(&submission(&"x".repeat(101), desc), &cats).unwrap_err();
        assert!(err.has("company_name"));
    }

    #[test]
    fn test_description_boundaries() {
        let cats = seed::categories();

        let err = validate_submission(&submission("MoveMan", "123456789"), &cats).unwrap_err();
        assert_eq!(
            err.get("description"),
            Some("Description must be at least 10 characters")
        );
        assert!(validate_submission(&submission("MoveMan", "1234567890"), &cats).is_ok());
        assert!(validate_submission(&submission("MoveMan", &"d".repeat(500)), &cats).is_ok());
        let err = validate_submission(&submission("MoveMan", &"d".repeat(501)), &cats).unwrap_err();
        assert!(err.has("description"));
    }

    #[test]
    fn test_submission_optional_fields() {
        let cats = seed::categories();
        let mut input = submission("MoveMan", "Removals CRM for quoting");
        input.website = "movemanpro.com".to_owned();
        input.discount = "d".repeat(101);
        let err = validate_submission(&input, &cats).unwrap_err();
        assert!(err.has("website"));
        assert!(err.has("discount"));

        input.website = "https://www.movemanpro.com".to_owned();
        input.discount = "10% off".to_owned();
        let ok = validate_submission(&input, &cats).unwrap();
        assert_eq!(ok.website.as_deref(), Some("https://www.movemanpro.com"));
        assert_eq!(ok.discount.as_deref(), Some("10% off"));
    }

    #[test]
    fn test_submission_unknown_category() {
        let mut input = submission("MoveMan", "Removals CRM for quoting");
        input.category = "pets".to_owned();
        let err = validate_submission(&input, &seed::categories()).unwrap_err();
        assert!(err.has("category"));
    }

    #[test]
    fn test_required_fields_reported_together() {
        let err = validate_submission(&SubmissionInput::default(), &seed::categories()).unwrap_err();
        assert_eq!(err.get("company_name"), Some("Company name is required"));
        assert_eq!(err.get("description"), Some("Description is required"));
        assert_eq!(err.get("category"), Some("Category is required"));
    }

    #[test]
    fn test_contact() {
        let input = ContactInput {
            name: "Sam".to_owned(),
            email: "sam@removals.co.uk".to_owned(),
            message: "Hello there!".to_owned(),
        };
        assert!(validate_contact(&input).is_ok());

        let bad = ContactInput {
            name: "n".repeat(101),
            email: "sam@removals".to_owned(),
            message: "short".to_owned(),
        };
        let err = validate_contact(&bad).unwrap_err();
        assert_eq!(err.len(), 3);
        assert_eq!(err.get("email"), Some("Please enter a valid email address"));
    }

    #[test]
    fn test_contact_message_upper_bound() {
        let mut input = ContactInput {
            name: "Sam".to_owned(),
            email: "sam@removals.co.uk".to_owned(),
            message: "m".repeat(1000),
        };
        assert!(validate_contact(&input).is_ok());
        input.message.push('m');
        assert!(validate_contact(&input).unwrap_err().has("message"));
    }

    #[test]
    fn test_provider() {
        let cats = seed::categories();
        let input = ProviderInput {
            name: "Basil Fry & Company".to_owned(),
            category: "insurance".to_owned(),
            tags: "insurance, storage, Insurance, ".to_owned(),
            website: "https://basilfry.co.uk".to_owned(),
            discount_label: "5% off".to_owned(),
            featured_until: "2030-01-31".to_owned(),
            tier: "sponsor".to_owned(),
            is_active: true,
            ..ProviderInput::default()
        };
        let provider = validate_provider(&input, &cats).unwrap();
        assert_eq!(provider.tags, vec!["insurance", "storage"]);
        assert_eq!(provider.tier, ProviderTier::Sponsor);
        assert_eq!(
            provider.discount,
            Some(Discount {
                label: "5% off".to_owned(),
                details: None
            })
        );
        assert!(provider.featured_until.is_some());
    }

    #[test]
    fn test_provider_errors() {
        let input = ProviderInput {
            category: "nope".to_owned(),
            website: "ftp://x.y".to_owned(),
            logo_url: "logo.png".to_owned(),
            featured_until: "31/01/2030".to_owned(),
            tier: "gold".to_owned(),
            discount_details: "details only".to_owned(),
            ..ProviderInput::default()
        };
        let err = validate_provider(&input, &seed::categories()).unwrap_err();
        for field in [
            "name",
            "category",
            "website",
            "logo_url",
            "featured_until",
            "tier",
            "discount_label",
        ] {
            assert!(err.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_category() {
        let ok = validate_category(&CategoryInput {
            id: "vehicle_hire".to_owned(),
            label: "Vehicle Hire".to_owned(),
            sort_order: "4".to_owned(),
        })
        .unwrap();
        assert_eq!(ok.sort_order, 4);

        let err = validate_category(&CategoryInput {
            id: "Vehicle Hire".to_owned(),
            label: String::new(),
            sort_order: "x".to_owned(),
        })
        .unwrap_err();
        assert!(err.has("id"));
        assert!(err.has("label"));
        assert!(err.has("sort_order"));
    }
}

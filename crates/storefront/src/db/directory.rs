//! Directory repository: public listings and the two public forms.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use appy_link_core::catalog::{Category, Discount, Provider};
use appy_link_core::validation::{NewContactMessage, NewSubmission};
use appy_link_core::{CategorySlug, ContactMessageId, ProviderId, ProviderTier, SubmissionId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: String,
    label: String,
    sort_order: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct ProviderRow {
    id: i32,
    name: String,
    category_id: String,
    tags: Vec<String>,
    website: Option<String>,
    summary: String,
    details: String,
    discount_label: Option<String>,
    discount_details: Option<String>,
    logo_url: Option<String>,
    is_active: bool,
    is_featured: bool,
    featured_until: Option<DateTime<Utc>>,
    tier: ProviderTier,
}

fn parse_slug(raw: &str) -> Result<CategorySlug, RepositoryError> {
    CategorySlug::parse(raw).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid category id {raw:?} in database: {e}"))
    })
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_slug(&row.id)?,
            label: row.label,
            sort_order: row.sort_order,
        })
    }
}

impl TryFrom<ProviderRow> for Provider {
    type Error = RepositoryError;

    fn try_from(row: ProviderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProviderId::new(row.id),
            name: row.name,
            category: parse_slug(&row.category_id)?,
            tags: row.tags,
            website: row.website,
            summary: row.summary,
            details: row.details,
            discount: row.discount_label.map(|label| Discount {
                label,
                details: row.discount_details,
            }),
            logo_url: row.logo_url,
            is_active: row.is_active,
            is_featured: row.is_featured,
            featured_until: row.featured_until,
            tier: row.tier,
        })
    }
}

/// Repository for the public side of the `directory` schema.
pub struct DirectoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DirectoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored id is not a valid slug.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, label, sort_order
            FROM directory.categories
            ORDER BY sort_order, label
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Category::try_from).collect()
    }

    /// Active providers in insertion order. Featured-first ordering is
    /// applied later so the stable sort keeps this order among equals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored category id is invalid.
    pub async fn list_active_providers(&self) -> Result<Vec<Provider>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProviderRow>(
            r"
            SELECT id, name, category_id, tags, website, summary, details,
                   discount_label, discount_details, logo_url,
                   is_active, is_featured, featured_until, tier
            FROM directory.providers
            WHERE is_active
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Provider::try_from).collect()
    }

    /// Store a validated listing submission with status `new`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_submission(
        &self,
        submission: &NewSubmission,
    ) -> Result<SubmissionId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO directory.listing_submissions
                (company_name, category_id, website, description, discount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(&submission.company_name)
        .bind(submission.category.as_str())
        .bind(submission.website.as_deref())
        .bind(&submission.description)
        .bind(submission.discount.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(SubmissionId::new(id))
    }

    /// Store a validated contact message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_contact_message(
        &self,
        message: &NewContactMessage,
    ) -> Result<ContactMessageId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO directory.contact_messages (name, email, message)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(&message.name)
        .bind(message.email.as_str())
        .bind(&message.message)
        .fetch_one(self.pool)
        .await?;

        Ok(ContactMessageId::new(id))
    }
}

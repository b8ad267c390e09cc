//! Catalog repository: categories and providers, including hidden ones.
//!
//! Functions taking an executor are shared with the moderation service so
//! they can run inside its transactions.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use appy_link_core::catalog::{Category, Discount, Provider};
use appy_link_core::validation::NewProvider;
use appy_link_core::{CategorySlug, ProviderId, ProviderTier};

use super::{RepositoryError, parse_slug};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: String,
    label: String,
    sort_order: i32,
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

const PROVIDER_COLUMNS: &str = "id, name, category_id, tags, website, summary, details, \
     discount_label, discount_details, logo_url, is_active, is_featured, featured_until, tier";

/// A category with the number of providers filed under it.
#[derive(Debug, Clone)]
pub struct CategoryUsage {
    pub category: Category,
    pub provider_count: i64,
}

/// Insert a provider.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the category does not exist.
pub async fn insert_provider<'e>(
    executor: impl PgExecutor<'e>,
    provider: &NewProvider,
) -> Result<ProviderId, RepositoryError> {
    let (id,): (i32,) = sqlx::query_as(
        r"
        INSERT INTO directory.providers
            (name, category_id, tags, website, summary, details,
             discount_label, discount_details, logo_url,
             is_active, is_featured, featured_until, tier)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING id
        ",
    )
    .bind(&provider.name)
    .bind(provider.category.as_str())
    .bind(&provider.tags)
    .bind(provider.website.as_deref())
    .bind(&provider.summary)
    .bind(&provider.details)
    .bind(provider.discount.as_ref().map(|d| d.label.as_str()))
    .bind(provider.discount.as_ref().and_then(|d| d.details.as_deref()))
    .bind(provider.logo_url.as_deref())
    .bind(provider.is_active)
    .bind(provider.is_featured)
    .bind(provider.featured_until)
    .bind(provider.tier)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::from_write(e, "provider"))?;

    Ok(ProviderId::new(id))
}

/// Whether a category with `id` exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn category_exists<'e>(
    executor: impl PgExecutor<'e>,
    id: &CategorySlug,
) -> Result<bool, RepositoryError> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM directory.categories WHERE id = $1)")
            .bind(id.as_str())
            .fetch_one(executor)
            .await?;
    Ok(exists)
}

/// Number of providers (active or hidden) filed under `id`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn count_providers_in<'e>(
    executor: impl PgExecutor<'e>,
    id: &CategorySlug,
) -> Result<i64, RepositoryError> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM directory.providers WHERE category_id = $1")
            .bind(id.as_str())
            .fetch_one(executor)
            .await?;
    Ok(count)
}

/// Insert a category.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the id is taken.
pub async fn insert_category<'e>(
    executor: impl PgExecutor<'e>,
    category: &Category,
) -> Result<(), RepositoryError> {
    sqlx::query("INSERT INTO directory.categories (id, label, sort_order) VALUES ($1, $2, $3)")
        .bind(category.id.as_str())
        .bind(&category.label)
        .bind(category.sort_order)
        .execute(executor)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category"))?;
    Ok(())
}

/// Update the label and sort order of a category in place.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if there is no such category.
pub async fn update_category_fields<'e>(
    executor: impl PgExecutor<'e>,
    category: &Category,
) -> Result<(), RepositoryError> {
    let result =
        sqlx::query("UPDATE directory.categories SET label = $2, sort_order = $3 WHERE id = $1")
            .bind(category.id.as_str())
            .bind(&category.label)
            .bind(category.sort_order)
            .execute(executor)
            .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Move every provider filed under `from` to `to`. Returns how many moved.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if `to` does not exist.
pub async fn repoint_providers<'e>(
    executor: impl PgExecutor<'e>,
    from: &CategorySlug,
    to: &CategorySlug,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        "UPDATE directory.providers SET category_id = $2, updated_at = NOW() WHERE category_id = $1",
    )
    .bind(from.as_str())
    .bind(to.as_str())
    .execute(executor)
    .await
    .map_err(|e| RepositoryError::from_write(e, "provider category"))?;
    Ok(result.rows_affected())
}

/// Move submissions still awaiting review from `from` to `to`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn repoint_pending_submissions<'e>(
    executor: impl PgExecutor<'e>,
    from: &CategorySlug,
    to: &CategorySlug,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE directory.listing_submissions
        SET category_id = $2
        WHERE category_id = $1 AND status = 'new'
        ",
    )
    .bind(from.as_str())
    .bind(to.as_str())
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Delete a category row.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if there is no such category.
/// Returns `RepositoryError::Conflict` if a provider still references it.
pub async fn delete_category<'e>(
    executor: impl PgExecutor<'e>,
    id: &CategorySlug,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM directory.categories WHERE id = $1")
        .bind(id.as_str())
        .execute(executor)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category"))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Repository for catalog reads and single-statement writes.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, label, sort_order FROM directory.categories ORDER BY sort_order, label",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Category::try_from).collect()
    }

    /// All categories with their provider counts, in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_category_usage(&self) -> Result<Vec<CategoryUsage>, RepositoryError> {
        let rows: Vec<(String, String, i32, i64)> = sqlx::query_as(
            r"
            SELECT c.id, c.label, c.sort_order, COUNT(p.id)
            FROM directory.categories c
            LEFT JOIN directory.providers p ON p.category_id = c.id
            GROUP BY c.id, c.label, c.sort_order
            ORDER BY c.sort_order, c.label
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, label, sort_order, provider_count)| {
                Ok(CategoryUsage {
                    category: Category::try_from(CategoryRow {
                        id,
                        label,
                        sort_order,
                    })?,
                    provider_count,
                })
            })
            .collect()
    }

    /// Get a category by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such category.
    pub async fn get_category(&self, id: &CategorySlug) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, CategoryRow>(
            "SELECT id, label, sort_order FROM directory.categories WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id is taken.
    pub async fn create_category(&self, category: &Category) -> Result<(), RepositoryError> {
        insert_category(self.pool, category).await
    }

    // =========================================================================
    // Providers
    // =========================================================================

    /// Every provider, hidden ones included, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_providers(&self) -> Result<Vec<Provider>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProviderRow>(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM directory.providers ORDER BY lower(name), id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Provider::try_from).collect()
    }

    /// Get a provider by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such provider.
    pub async fn get_provider(&self, id: ProviderId) -> Result<Provider, RepositoryError> {
        sqlx::query_as::<_, ProviderRow>(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM directory.providers WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }

    /// Create a provider.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category does not exist.
    pub async fn create_provider(&self, provider: &NewProvider) -> Result<ProviderId, RepositoryError> {
        insert_provider(self.pool, provider).await
    }

    /// Overwrite every editable field of a provider.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such provider.
    /// Returns `RepositoryError::Conflict` if the category does not exist.
    pub async fn update_provider(
        &self,
        id: ProviderId,
        provider: &NewProvider,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE directory.providers
            SET name = $2, category_id = $3, tags = $4, website = $5,
                summary = $6, details = $7, discount_label = $8,
                discount_details = $9, logo_url = $10, is_active = $11,
                is_featured = $12, featured_until = $13, tier = $14,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(&provider.name)
        .bind(provider.category.as_str())
        .bind(&provider.tags)
        .bind(provider.website.as_deref())
        .bind(&provider.summary)
        .bind(&provider.details)
        .bind(provider.discount.as_ref().map(|d| d.label.as_str()))
        .bind(provider.discount.as_ref().and_then(|d| d.details.as_deref()))
        .bind(provider.logo_url.as_deref())
        .bind(provider.is_active)
        .bind(provider.is_featured)
        .bind(provider.featured_until)
        .bind(provider.tier)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "provider"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Hide (`false`) or show (`true`) a provider in the public directory.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such provider.
    pub async fn set_active(&self, id: ProviderId, active: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE directory.providers SET is_active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(active)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a provider. Submissions approved into it keep their history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such provider.
    pub async fn delete_provider(&self, id: ProviderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM directory.providers WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Provider counts for the dashboard: `(active, hidden)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn provider_counts(&self) -> Result<(i64, i64), RepositoryError> {
        let counts: (i64, i64) = sqlx::query_as(
            r"
            SELECT COUNT(*) FILTER (WHERE is_active),
                   COUNT(*) FILTER (WHERE NOT is_active)
            FROM directory.providers
            ",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(counts)
    }
}

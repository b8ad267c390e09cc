//! Seed a fresh database with the built-in directory.
//!
//! # Usage
//!
//! ```bash
//! appy-cli seed
//! ```
//!
//! Categories that already exist are left alone. Providers are only
//! inserted while the provider table is empty, so running the command twice
//! does not duplicate listings.

use appy_link_admin::db::catalog::{category_exists, insert_category, insert_provider};
use appy_link_core::catalog::Provider;
use appy_link_core::seed;
use appy_link_core::validation::NewProvider;

use super::{CliError, connect};

/// Counts of rows written by [`run`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub providers: usize,
}

/// Insertable form of a seed provider. The database assigns the id.
fn new_provider(provider: Provider) -> NewProvider {
    NewProvider {
        name: provider.name,
        category: provider.category,
        tags: provider.tags,
        website: provider.website,
        summary: provider.summary,
        details: provider.details,
        discount: provider.discount,
        logo_url: provider.logo_url,
        is_active: provider.is_active,
        is_featured: provider.is_featured,
        featured_until: provider.featured_until,
        tier: provider.tier,
    }
}

/// Insert the seed categories and providers in one transaction.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<SeedSummary, CliError> {
    let pool = connect().await?;
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for category in seed::categories() {
        if category_exists(&mut *tx, &category.id).await? {
            tracing::debug!(category = %category.id, "Category exists, skipping");
            continue;
        }
        insert_category(&mut *tx, &category).await?;
        summary.categories += 1;
    }

    let (has_providers,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM directory.providers)")
            .fetch_one(&mut *tx)
            .await?;

    if has_providers {
        tracing::info!("Providers already present, skipping provider seed");
    } else {
        for provider in seed::providers() {
            insert_provider(&mut *tx, &new_provider(provider)).await?;
            summary.providers += 1;
        }
    }

    tx.commit().await?;

    tracing::info!(
        categories = summary.categories,
        providers = summary.providers,
        "Seed complete"
    );
    Ok(summary)
}

//! Database tests for submission review and category integrity.
//!
//! Each test gets a fresh database with the workspace migrations applied.

#![allow(clippy::unwrap_used)]

use sqlx::PgPool;

use appy_link_admin::db::catalog::{count_providers_in, insert_category, insert_provider};
use appy_link_admin::db::submissions::lock_for_review;
use appy_link_admin::db::{AccountRepository, CatalogRepository};
use appy_link_admin::services::{ModerationError, ModerationService};
use appy_link_core::catalog::Category;
use appy_link_core::moderation::RuleViolation;
use appy_link_core::validation::NewProvider;
use appy_link_core::{AccountId, AdminRole, CategorySlug, Email, SubmissionId, SubmissionStatus};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn slug(id: &str) -> CategorySlug {
    CategorySlug::parse(id).unwrap()
}

async fn add_category(pool: &PgPool, id: &str, label: &str) {
    let category = Category {
        id: slug(id),
        label: label.to_string(),
        sort_order: 0,
    };
    insert_category(pool, &category).await.unwrap();
}

async fn add_provider(pool: &PgPool, name: &str, category: &str) {
    let provider = NewProvider {
        name: name.to_string(),
        category: slug(category),
        tags: vec!["uk".to_string()],
        website: None,
        summary: format!("{name} summary"),
        details: String::new(),
        discount: None,
        logo_url: None,
        is_active: true,
        is_featured: false,
        featured_until: None,
        tier: Default::default(),
    };
    insert_provider(pool, &provider).await.unwrap();
}

async fn add_submission(pool: &PgPool, company: &str, category: &str) -> SubmissionId {
    let (id,): (i32,) = sqlx::query_as(
        r"
        INSERT INTO directory.listing_submissions (company_name, category_id, description)
        VALUES ($1, $2, 'Removals across the south east')
        RETURNING id
        ",
    )
    .bind(company)
    .bind(category)
    .fetch_one(pool)
    .await
    .unwrap();
    SubmissionId::new(id)
}

async fn reviewer(pool: &PgPool) -> AccountId {
    let email = Email::parse("editor@appylink.co.uk").unwrap();
    AccountRepository::new(pool)
        .create(&email, None, Some(AdminRole::Editor))
        .await
        .unwrap()
        .id
}

async fn provider_names(pool: &PgPool) -> Vec<String> {
    let mut names: Vec<String> = CatalogRepository::new(pool)
        .list_providers()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    names.sort();
    names
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_approve_creates_provider_and_marks_submission(pool: PgPool) {
    add_category(&pool, "removals", "Removals").await;
    let id = add_submission(&pool, "MoveMan Ltd", "removals").await;
    let reviewer = reviewer(&pool).await;

    let provider_id = ModerationService::new(&pool)
        .approve(id, reviewer)
        .await
        .unwrap();

    let submission = lock_for_review(&pool, id).await.unwrap();
    assert_eq!(submission.status, SubmissionStatus::Approved);
    assert_eq!(submission.provider_id, Some(provider_id));
    assert_eq!(submission.reviewed_by, Some(reviewer));

    let provider = CatalogRepository::new(&pool)
        .get_provider(provider_id)
        .await
        .unwrap();
    assert_eq!(provider.name, "MoveMan Ltd");
    assert_eq!(provider.category, slug("removals"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_second_review_is_refused(pool: PgPool) {
    add_category(&pool, "removals", "Removals").await;
    let id = add_submission(&pool, "MoveMan Ltd", "removals").await;
    let reviewer = reviewer(&pool).await;
    let moderation = ModerationService::new(&pool);

    moderation.approve(id, reviewer).await.unwrap();

    let err = moderation.approve(id, reviewer).await.unwrap_err();
    assert_eq!(err.to_string(), "This submission was already approved.");
    let err = moderation.reject(id, reviewer, "spam").await.unwrap_err();
    assert!(matches!(
        err,
        ModerationError::Rule(RuleViolation::AlreadyReviewed(SubmissionStatus::Approved))
    ));

    assert_eq!(provider_names(&pool).await, vec!["MoveMan Ltd"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_approve_with_deleted_category_changes_nothing(pool: PgPool) {
    add_category(&pool, "removals", "Removals").await;
    let id = add_submission(&pool, "MoveMan Ltd", "vans").await;
    let reviewer = reviewer(&pool).await;

    let err = ModerationService::new(&pool)
        .approve(id, reviewer)
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::UnknownCategory(ref c) if c == "vans"));

    let submission = lock_for_review(&pool, id).await.unwrap();
    assert_eq!(submission.status, SubmissionStatus::New);
    assert_eq!(submission.provider_id, None);
    assert!(provider_names(&pool).await.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_reject_records_reason_without_creating_provider(pool: PgPool) {
    add_category(&pool, "removals", "Removals").await;
    let id = add_submission(&pool, "MoveMan Ltd", "removals").await;
    let reviewer = reviewer(&pool).await;

    ModerationService::new(&pool)
        .reject(id, reviewer, "  Duplicate listing ")
        .await
        .unwrap();

    let submission = lock_for_review(&pool, id).await.unwrap();
    assert_eq!(submission.status, SubmissionStatus::Rejected);
    assert_eq!(submission.rejection_reason.as_deref(), Some("Duplicate listing"));
    assert!(provider_names(&pool).await.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_unknown_submission_is_not_found(pool: PgPool) {
    let reviewer = reviewer(&pool).await;
    let err = ModerationService::new(&pool)
        .approve(SubmissionId::new(4040), reviewer)
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::NotFound));
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_category_in_use_cannot_be_deleted(pool: PgPool) {
    add_category(&pool, "software", "Software").await;
    add_provider(&pool, "Ledgerly", "software").await;
    add_provider(&pool, "Rotaful", "software").await;

    let err = ModerationService::new(&pool)
        .delete_category(&slug("software"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot delete: 2 provider(s) still use this category. Reassign them first."
    );

    let catalog = CatalogRepository::new(&pool);
    assert_eq!(catalog.get_category(&slug("software")).await.unwrap().label, "Software");
    assert_eq!(provider_names(&pool).await, vec!["Ledgerly", "Rotaful"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_unused_category_is_deleted(pool: PgPool) {
    add_category(&pool, "insurance", "Insurance").await;

    ModerationService::new(&pool)
        .delete_category(&slug("insurance"))
        .await
        .unwrap();

    assert!(
        CatalogRepository::new(&pool)
            .list_categories()
            .await
            .unwrap()
            .is_empty()
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_rename_moves_providers_and_pending_submissions(pool: PgPool) {
    add_category(&pool, "software", "Software").await;
    add_provider(&pool, "Ledgerly", "software").await;
    add_provider(&pool, "Rotaful", "software").await;
    let pending = add_submission(&pool, "Payslipper", "software").await;

    let renamed = Category {
        id: slug("business_software"),
        label: "Business software".to_string(),
        sort_order: 2,
    };
    let moved = ModerationService::new(&pool)
        .update_category(&slug("software"), &renamed)
        .await
        .unwrap();
    assert_eq!(moved, 2);

    let catalog = CatalogRepository::new(&pool);
    assert!(matches!(
        catalog.get_category(&slug("software")).await,
        Err(appy_link_admin::db::RepositoryError::NotFound)
    ));
    assert_eq!(count_providers_in(&pool, &slug("business_software")).await.unwrap(), 2);
    assert_eq!(count_providers_in(&pool, &slug("software")).await.unwrap(), 0);

    let submission = lock_for_review(&pool, pending).await.unwrap();
    assert_eq!(submission.category, slug("business_software"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_rename_onto_existing_id_is_a_conflict(pool: PgPool) {
    add_category(&pool, "software", "Software").await;
    add_category(&pool, "insurance", "Insurance").await;
    add_provider(&pool, "Ledgerly", "software").await;

    let clash = Category {
        id: slug("insurance"),
        label: "Insurance".to_string(),
        sort_order: 0,
    };
    let err = ModerationService::new(&pool)
        .update_category(&slug("software"), &clash)
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::Conflict(_)));

    assert_eq!(count_providers_in(&pool, &slug("software")).await.unwrap(), 1);
}

//! Provider management handlers.
//!
//! One form serves create and edit. Failed saves re-render it with the
//! submitted values and inline errors; successful ones redirect to the list
//! with a flash notice.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use appy_link_core::catalog::{Category, Provider};
use appy_link_core::validation::{FieldErrors, ProviderInput, validate_provider};
use appy_link_core::{ProviderId, ProviderTier};

use super::views::{PageChrome, format_date_input};
use crate::db::{CatalogRepository, RepositoryError};
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireCatalogManager, RequireEditor, RequireView, set_flash};
use crate::models::Flash;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct ProviderRow {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub tier: &'static str,
    pub is_active: bool,
    pub is_featured: bool,
    pub has_discount: bool,
    pub website: String,
}

impl ProviderRow {
    fn new(provider: &Provider, categories: &[Category]) -> Self {
        Self {
            id: provider.id.as_i32(),
            name: provider.name.clone(),
            category: category_label(categories, provider.category.as_str()),
            tier: provider.tier.label(),
            is_active: provider.is_active,
            is_featured: provider.is_featured,
            has_discount: provider.has_discount(),
            website: provider.website.clone().unwrap_or_default(),
        }
    }
}

/// Select option for the category or tier dropdown.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

fn category_label(categories: &[Category], id: &str) -> String {
    categories
        .iter()
        .find(|c| c.id.as_str() == id)
        .map_or_else(|| id.to_string(), |c| c.label.clone())
}

fn category_options(categories: &[Category], selected: &str) -> Vec<SelectOption> {
    categories
        .iter()
        .map(|c| SelectOption {
            value: c.id.as_str().to_string(),
            label: c.label.clone(),
            selected: c.id.as_str() == selected,
        })
        .collect()
}

fn tier_options(selected: &str) -> Vec<SelectOption> {
    let selected = if selected.is_empty() {
        ProviderTier::default().as_str()
    } else {
        selected
    };
    ProviderTier::ALL
        .iter()
        .map(|tier| SelectOption {
            value: tier.as_str().to_string(),
            label: tier.label().to_string(),
            selected: tier.as_str() == selected,
        })
        .collect()
}

/// Form values for an existing provider.
fn input_from(provider: &Provider) -> ProviderInput {
    ProviderInput {
        name: provider.name.clone(),
        category: provider.category.as_str().to_string(),
        tags: provider.tags.join(", "),
        website: provider.website.clone().unwrap_or_default(),
        summary: provider.summary.clone(),
        details: provider.details.clone(),
        discount_label: provider
            .discount
            .as_ref()
            .map(|d| d.label.clone())
            .unwrap_or_default(),
        discount_details: provider
            .discount
            .as_ref()
            .and_then(|d| d.details.clone())
            .unwrap_or_default(),
        logo_url: provider.logo_url.clone().unwrap_or_default(),
        is_active: provider.is_active,
        is_featured: provider.is_featured,
        featured_until: provider
            .featured_until
            .as_ref()
            .map(format_date_input)
            .unwrap_or_default(),
        tier: provider.tier.as_str().to_string(),
    }
}

// =============================================================================
// List
// =============================================================================

/// Provider list template.
#[derive(Template, WebTemplate)]
#[template(path = "providers/index.html")]
pub struct ProvidersIndexTemplate {
    pub chrome: PageChrome,
    pub providers: Vec<ProviderRow>,
    pub active_count: usize,
}

/// All providers, hidden ones included, by name.
///
/// GET /providers
#[instrument(skip_all)]
pub async fn index(
    RequireView(admin): RequireView,
    State(state): State<AppState>,
    session: Session,
) -> Result<ProvidersIndexTemplate> {
    let repo = CatalogRepository::new(state.pool());
    let categories = repo.list_categories().await?;
    let providers: Vec<ProviderRow> = repo
        .list_providers()
        .await?
        .iter()
        .map(|p| ProviderRow::new(p, &categories))
        .collect();

    Ok(ProvidersIndexTemplate {
        chrome: PageChrome::load(&session, &admin, "/providers").await,
        active_count: providers.iter().filter(|p| p.is_active).count(),
        providers,
    })
}

// =============================================================================
// Create and edit
// =============================================================================

/// Provider form template, for both create and edit.
#[derive(Template, WebTemplate)]
#[template(path = "providers/form.html")]
pub struct ProviderFormTemplate {
    pub chrome: PageChrome,
    /// `None` when creating.
    pub provider_id: Option<i32>,
    pub values: ProviderInput,
    pub categories: Vec<SelectOption>,
    pub tiers: Vec<SelectOption>,
    pub errors: FieldErrors,
    /// Form-level error, empty when none.
    pub error: String,
}

impl ProviderFormTemplate {
    fn action(&self) -> String {
        self.provider_id
            .map_or_else(|| "/providers".to_string(), |id| format!("/providers/{id}"))
    }
}

struct FormContext<'a> {
    chrome: PageChrome,
    categories: &'a [Category],
    provider_id: Option<i32>,
}

impl FormContext<'_> {
    fn render(self, values: ProviderInput, errors: FieldErrors, error: String) -> ProviderFormTemplate {
        ProviderFormTemplate {
            chrome: self.chrome,
            provider_id: self.provider_id,
            categories: category_options(self.categories, &values.category),
            tiers: tier_options(&values.tier),
            values,
            errors,
            error,
        }
    }
}

/// Message for a refused provider write, or the fault to propagate.
fn save_failure(err: RepositoryError) -> Result<String> {
    match err {
        RepositoryError::Conflict(message) => Ok(message),
        other => Err(other.into()),
    }
}

/// Blank provider form.
///
/// GET /providers/new
#[instrument(skip_all)]
pub async fn new_page(
    RequireCatalogManager(admin): RequireCatalogManager,
    State(state): State<AppState>,
    session: Session,
) -> Result<ProviderFormTemplate> {
    let categories = CatalogRepository::new(state.pool()).list_categories().await?;
    let values = ProviderInput {
        is_active: true,
        ..ProviderInput::default()
    };

    Ok(FormContext {
        chrome: PageChrome::load(&session, &admin, "/providers").await,
        categories: &categories,
        provider_id: None,
    }
    .render(values, FieldErrors::new(), String::new()))
}

/// Create a provider.
///
/// POST /providers
#[instrument(skip_all)]
pub async fn create(
    RequireCatalogManager(admin): RequireCatalogManager,
    State(state): State<AppState>,
    session: Session,
    Form(values): Form<ProviderInput>,
) -> Result<Response> {
    let repo = CatalogRepository::new(state.pool());
    let categories = repo.list_categories().await?;

    let (errors, error) = match validate_provider(&values, &categories) {
        Ok(provider) => match repo.create_provider(&provider).await {
            Ok(id) => {
                tracing::info!(provider_id = %id, name = %provider.name, "Provider created");
                set_flash(&session, Flash::success(format!("Added {}.", provider.name))).await?;
                return Ok(Redirect::to("/providers").into_response());
            }
            Err(err) => (FieldErrors::new(), save_failure(err)?),
        },
        Err(errors) => (errors, "Please fix the errors below.".to_string()),
    };

    Ok(FormContext {
        chrome: PageChrome::load(&session, &admin, "/providers").await,
        categories: &categories,
        provider_id: None,
    }
    .render(values, errors, error)
    .into_response())
}

/// Edit form for an existing provider.
///
/// GET /providers/{id}/edit
#[instrument(skip(admin, state, session))]
pub async fn edit_page(
    RequireEditor(admin): RequireEditor,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<ProviderFormTemplate> {
    let repo = CatalogRepository::new(state.pool());
    let provider = repo.get_provider(ProviderId::new(id)).await?;
    let categories = repo.list_categories().await?;

    Ok(FormContext {
        chrome: PageChrome::load(&session, &admin, "/providers").await,
        categories: &categories,
        provider_id: Some(id),
    }
    .render(input_from(&provider), FieldErrors::new(), String::new()))
}

/// Save an edited provider. Last write wins.
///
/// POST /providers/{id}
#[instrument(skip(admin, state, session, values))]
pub async fn update(
    RequireEditor(admin): RequireEditor,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(values): Form<ProviderInput>,
) -> Result<Response> {
    let repo = CatalogRepository::new(state.pool());
    let categories = repo.list_categories().await?;

    let (errors, error) = match validate_provider(&values, &categories) {
        Ok(provider) => match repo.update_provider(ProviderId::new(id), &provider).await {
            Ok(()) => {
                tracing::info!(provider_id = id, "Provider updated");
                set_flash(&session, Flash::success(format!("Saved {}.", provider.name))).await?;
                return Ok(Redirect::to("/providers").into_response());
            }
            Err(err) => (FieldErrors::new(), save_failure(err)?),
        },
        Err(errors) => (errors, "Please fix the errors below.".to_string()),
    };

    Ok(FormContext {
        chrome: PageChrome::load(&session, &admin, "/providers").await,
        categories: &categories,
        provider_id: Some(id),
    }
    .render(values, errors, error)
    .into_response())
}

// =============================================================================
// Visibility
// =============================================================================

async fn set_visibility(
    state: &AppState,
    session: &Session,
    id: i32,
    active: bool,
) -> Result<Redirect> {
    let repo = CatalogRepository::new(state.pool());
    let provider_id = ProviderId::new(id);
    repo.set_active(provider_id, active).await?;
    let provider = repo.get_provider(provider_id).await?;

    tracing::info!(provider_id = id, active, "Provider visibility changed");
    let text = if active {
        format!("{} is visible in the directory.", provider.name)
    } else {
        format!("{} is hidden from the directory.", provider.name)
    };
    set_flash(session, Flash::success(text)).await?;
    Ok(Redirect::to("/providers"))
}

/// Hide a provider from the public directory.
///
/// POST /providers/{id}/hide
#[instrument(skip(_admin, state, session))]
pub async fn hide(
    RequireEditor(_admin): RequireEditor,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    set_visibility(&state, &session, id, false).await
}

/// Show a hidden provider again.
///
/// POST /providers/{id}/show
#[instrument(skip(_admin, state, session))]
pub async fn show(
    RequireEditor(_admin): RequireEditor,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    set_visibility(&state, &session, id, true).await
}

// =============================================================================
// Delete
// =============================================================================

/// Delete confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "providers/delete.html")]
pub struct ProviderDeleteTemplate {
    pub chrome: PageChrome,
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmForm {
    pub confirm: String,
}

/// Ask before deleting.
///
/// GET /providers/{id}/delete
#[instrument(skip(admin, state, session))]
pub async fn delete_page(
    RequireCatalogManager(admin): RequireCatalogManager,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<ProviderDeleteTemplate> {
    let provider = CatalogRepository::new(state.pool())
        .get_provider(ProviderId::new(id))
        .await?;

    Ok(ProviderDeleteTemplate {
        chrome: PageChrome::load(&session, &admin, "/providers").await,
        id,
        name: provider.name,
    })
}

/// Delete a provider. Without the confirmation field this goes back to the
/// confirmation page.
///
/// POST /providers/{id}/delete
#[instrument(skip(_admin, state, session, form))]
pub async fn delete(
    RequireCatalogManager(_admin): RequireCatalogManager,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<ConfirmForm>,
) -> Result<Redirect> {
    if form.confirm != "yes" {
        return Ok(Redirect::to(&format!("/providers/{id}/delete")));
    }

    let repo = CatalogRepository::new(state.pool());
    let provider_id = ProviderId::new(id);
    let provider = repo.get_provider(provider_id).await?;
    repo.delete_provider(provider_id).await?;

    tracing::info!(provider_id = id, name = %provider.name, "Provider deleted");
    set_flash(&session, Flash::success(format!("Deleted {}.", provider.name))).await?;
    Ok(Redirect::to("/providers"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use appy_link_core::CategorySlug;
    use appy_link_core::catalog::Discount;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn categories() -> Vec<Category> {
        vec![Category {
            id: CategorySlug::parse("software").unwrap(),
            label: "Software & CRM".to_string(),
            sort_order: 1,
        }]
    }

    #[test]
    fn test_edit_form_round_trips_through_validation() {
        let provider = Provider {
            id: ProviderId::new(7),
            name: "MoveMan".to_string(),
            category: CategorySlug::parse("software").unwrap(),
            tags: vec!["crm".to_string(), "quotes".to_string()],
            website: Some("https://www.movemanpro.com".to_string()),
            summary: "UK removals CRM".to_string(),
            details: String::new(),
            discount: Some(Discount {
                label: "10% off".to_string(),
                details: None,
            }),
            logo_url: None,
            is_active: false,
            is_featured: true,
            featured_until: Some(Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap()),
            tier: ProviderTier::Sponsor,
        };

        let input = input_from(&provider);
        assert_eq!(input.tags, "crm, quotes");
        assert_eq!(input.featured_until, "2026-12-31");

        let saved = validate_provider(&input, &categories()).unwrap();
        assert_eq!(saved.tags, provider.tags);
        assert_eq!(saved.discount, provider.discount);
        assert_eq!(saved.featured_until, provider.featured_until);
        assert_eq!(saved.tier, ProviderTier::Sponsor);
        assert!(!saved.is_active);
    }

    #[test]
    fn test_options_mark_selection() {
        let options = category_options(&categories(), "software");
        assert!(options[0].selected);

        let tiers = tier_options("");
        let selected: Vec<&str> = tiers
            .iter()
            .filter(|t| t.selected)
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(selected, [ProviderTier::default().as_str()]);
    }

    #[test]
    fn test_unknown_category_label_falls_back_to_id() {
        assert_eq!(category_label(&categories(), "software"), "Software & CRM");
        assert_eq!(category_label(&categories(), "vans"), "vans");
    }
}

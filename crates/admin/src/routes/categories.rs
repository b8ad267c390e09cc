//! Category management handlers.
//!
//! Viewers see the list. Creating, renaming and deleting need the catalog
//! capability. Renaming an id moves its providers along with it; deleting
//! is refused while any provider still uses the category.

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

use appy_link_core::CategorySlug;
use appy_link_core::validation::{CategoryInput, FieldErrors, validate_category};

use super::views::PageChrome;
use crate::db::{CatalogRepository, CategoryUsage, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireCatalogManager, RequireView, set_flash};
use crate::models::{CurrentAdmin, Flash};
use crate::services::ModerationError;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: String,
    pub label: String,
    pub sort_order: i32,
    pub provider_count: i64,
}

impl From<CategoryUsage> for CategoryRow {
    fn from(usage: CategoryUsage) -> Self {
        Self {
            id: usage.category.id.as_str().to_string(),
            label: usage.category.label,
            sort_order: usage.category.sort_order,
            provider_count: usage.provider_count,
        }
    }
}

fn parse_id(raw: &str) -> Result<CategorySlug> {
    CategorySlug::parse(raw).map_err(|_| AppError::NotFound(format!("category {raw}")))
}

/// Category list template, with the create form underneath.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesTemplate {
    pub chrome: PageChrome,
    pub categories: Vec<CategoryRow>,
    pub values: CategoryInput,
    pub errors: FieldErrors,
    pub error: String,
}

async fn render_index(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    values: CategoryInput,
    errors: FieldErrors,
    error: String,
) -> Result<CategoriesTemplate> {
    let categories = CatalogRepository::new(state.pool())
        .list_category_usage()
        .await?
        .into_iter()
        .map(CategoryRow::from)
        .collect();

    Ok(CategoriesTemplate {
        chrome: PageChrome::load(session, admin, "/categories").await,
        categories,
        values,
        errors,
        error,
    })
}

/// GET /categories
#[instrument(skip_all)]
pub async fn index(
    RequireView(admin): RequireView,
    State(state): State<AppState>,
    session: Session,
) -> Result<CategoriesTemplate> {
    render_index(
        &state,
        &session,
        &admin,
        CategoryInput::default(),
        FieldErrors::new(),
        String::new(),
    )
    .await
}

/// Create a category.
///
/// POST /categories
#[instrument(skip_all)]
pub async fn create(
    RequireCatalogManager(admin): RequireCatalogManager,
    State(state): State<AppState>,
    session: Session,
    Form(values): Form<CategoryInput>,
) -> Result<Response> {
    let (errors, error) = match validate_category(&values) {
        Ok(category) => match CatalogRepository::new(state.pool())
            .create_category(&category)
            .await
        {
            Ok(()) => {
                tracing::info!(category = %category.id, "Category created");
                set_flash(&session, Flash::success(format!("Added {}.", category.label))).await?;
                return Ok(Redirect::to("/categories").into_response());
            }
            Err(RepositoryError::Conflict(message)) => (FieldErrors::new(), message),
            Err(err) => return Err(err.into()),
        },
        Err(errors) => (errors, "Please fix the errors below.".to_string()),
    };

    Ok(render_index(&state, &session, &admin, values, errors, error)
        .await?
        .into_response())
}

/// Category edit template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/edit.html")]
pub struct CategoryEditTemplate {
    pub chrome: PageChrome,
    /// Id the category has now; the form may change it.
    pub current_id: String,
    pub values: CategoryInput,
    pub errors: FieldErrors,
    pub error: String,
}

/// GET /categories/{id}/edit
#[instrument(skip(admin, state, session))]
pub async fn edit_page(
    RequireCatalogManager(admin): RequireCatalogManager,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<CategoryEditTemplate> {
    let category = CatalogRepository::new(state.pool())
        .get_category(&parse_id(&id)?)
        .await?;

    Ok(CategoryEditTemplate {
        chrome: PageChrome::load(&session, &admin, "/categories").await,
        current_id: id,
        values: CategoryInput {
            id: category.id.as_str().to_string(),
            label: category.label,
            sort_order: category.sort_order.to_string(),
        },
        errors: FieldErrors::new(),
        error: String::new(),
    })
}

/// Save an edited category, moving its providers if the id changed.
///
/// POST /categories/{id}
#[instrument(skip(admin, state, session, values))]
pub async fn update(
    RequireCatalogManager(admin): RequireCatalogManager,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(values): Form<CategoryInput>,
) -> Result<Response> {
    let current = parse_id(&id)?;

    let (errors, error) = match validate_category(&values) {
        Ok(category) => match state.moderation().update_category(&current, &category).await {
            Ok(moved) => {
                let text = if category.id == current {
                    format!("Saved {}.", category.label)
                } else {
                    format!(
                        "Renamed {current} to {}. {moved} provider(s) moved.",
                        category.id
                    )
                };
                set_flash(&session, Flash::success(text)).await?;
                return Ok(Redirect::to("/categories").into_response());
            }
            Err(ModerationError::Conflict(message)) => (FieldErrors::new(), message),
            Err(err) => return Err(err.into()),
        },
        Err(errors) => (errors, "Please fix the errors below.".to_string()),
    };

    Ok(CategoryEditTemplate {
        chrome: PageChrome::load(&session, &admin, "/categories").await,
        current_id: id,
        values,
        errors,
        error,
    }
    .into_response())
}

/// Delete confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/delete.html")]
pub struct CategoryDeleteTemplate {
    pub chrome: PageChrome,
    pub category: CategoryRow,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmForm {
    pub confirm: String,
}

/// Ask before deleting. The page warns up front when providers still use it.
///
/// GET /categories/{id}/delete
#[instrument(skip(admin, state, session))]
pub async fn delete_page(
    RequireCatalogManager(admin): RequireCatalogManager,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<CategoryDeleteTemplate> {
    let slug = parse_id(&id)?;
    let category = CatalogRepository::new(state.pool())
        .list_category_usage()
        .await?
        .into_iter()
        .find(|usage| usage.category.id == slug)
        .map(CategoryRow::from)
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;

    Ok(CategoryDeleteTemplate {
        chrome: PageChrome::load(&session, &admin, "/categories").await,
        category,
    })
}

/// Delete a category. While providers use it the delete is refused and the
/// advisory is shown as a flash.
///
/// POST /categories/{id}/delete
#[instrument(skip(_admin, state, session, form))]
pub async fn delete(
    RequireCatalogManager(_admin): RequireCatalogManager,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ConfirmForm>,
) -> Result<Redirect> {
    if form.confirm != "yes" {
        return Ok(Redirect::to(&format!("/categories/{id}/delete")));
    }

    let flash = match state.moderation().delete_category(&parse_id(&id)?).await {
        Ok(()) => Flash::success(format!("Deleted {id}.")),
        Err(ModerationError::Rule(violation)) => Flash::error(violation.to_string()),
        Err(err) => return Err(err.into()),
    };

    set_flash(&session, flash).await?;
    Ok(Redirect::to("/categories"))
}

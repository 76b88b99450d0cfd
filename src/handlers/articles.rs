use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use garde::Validate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    listing::{ListQuery, ListQueryState},
    models::article::ArticleStatus,
    models::profile::Role,
    models::session::CurrentUser,
    permissions,
    repositories::article as article_repo,
    state::AppState,
    validation::content::valid_slug,
};

/// Listing parameters accepted by the admin article endpoints.
#[derive(Deserialize, Default)]
pub struct ArticleListParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

impl ArticleListParams {
    fn into_state(self) -> ListQueryState {
        let mut state = ListQueryState::new();
        if let Some(search) = self.search {
            state.set_search(search);
        }
        if let Some(status) = self.status {
            state.set_filter("status", status);
        }
        if let Some(category) = self.category {
            state.set_filter("category", category);
        }
        if let Some(sort) = self.sort {
            state.set_sort(sort, self.order.as_deref() != Some("desc"));
        }
        state.set_page(self.page);
        state
    }
}

/// The article payload for create and update.
#[derive(Deserialize, Validate)]
pub struct ArticlePayload {
    #[garde(length(min = 1, max = 300))]
    pub title: String,
    #[garde(custom(valid_slug))]
    pub slug: String,
    #[garde(length(max = 500))]
    pub excerpt: Option<String>,
    #[garde(length(min = 1))]
    pub content: String,
    #[garde(skip)]
    pub cover_image: Option<String>,
    #[garde(length(max = 100))]
    pub category: Option<String>,
    #[garde(skip)]
    #[serde(default)]
    pub tags: Vec<String>,
    #[garde(skip)]
    pub status: ArticleStatus,
}

/// The admin listing configuration. Kontributor sees only their own rows.
fn admin_query(current: &CurrentUser) -> ListQuery {
    let restricted = permissions::check_permission(current.profile.as_ref(), &[Role::Kontributor]);
    ListQuery::new("articles", article_repo::ARTICLE_COLUMNS)
        .search_columns(&["title", "excerpt"])
        .filter_columns(&["status", "category"])
        .sortable_columns(&["title", "status", "created_at", "published_at"])
        .default_sort("created_at", false)
        .owner_column("author_id")
        .owned_by(restricted.then_some(current.user_id))
}

fn require_panel_access(current: &CurrentUser) -> Result<()> {
    permissions::require(
        current.profile.as_ref(),
        &[Role::SuperAdmin, Role::Admin, Role::Kontributor],
    )
}

/// Lists articles for the admin panel.
#[axum::debug_handler]
pub async fn list_articles(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ArticleListParams>,
) -> Result<Response> {
    require_panel_access(&current)?;

    let list_state = params.into_state();
    let page = admin_query(&current)
        .fetch(&state.db, &list_state, article_repo::map_row)
        .await?;

    let body = sonic_rs::to_string(&page)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Fetches one article for the admin edit form.
#[axum::debug_handler]
pub async fn get_article(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    require_panel_access(&current)?;

    let article = article_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !permissions::can_modify_content(&current, article.author_id) {
        return Err(AppError::Unauthorized);
    }

    let body = sonic_rs::to_string(&article)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Creates an article.
#[axum::debug_handler]
pub async fn create_article(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<ArticlePayload>,
) -> Result<Response> {
    require_panel_access(&current)?;
    payload.validate()?;

    if payload.status == ArticleStatus::Published
        && !permissions::can_publish_articles(current.profile.as_ref())
    {
        return Err(AppError::Unauthorized);
    }

    let published_at = (payload.status == ArticleStatus::Published).then(Utc::now);
    let article = article_repo::create_article(
        &state.db,
        &payload.title,
        &payload.slug,
        payload.excerpt.as_deref(),
        &payload.content,
        payload.cover_image.as_deref(),
        current.user_id,
        payload.category.as_deref(),
        &payload.tags,
        payload.status,
        published_at,
    )
    .await?;

    tracing::info!("✅ Article created: {} ({})", article.slug, article.id);

    let body = sonic_rs::to_string(&article)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::CREATED, body).into_response())
}

/// Updates an article.
#[axum::debug_handler]
pub async fn update_article(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ArticlePayload>,
) -> Result<Response> {
    require_panel_access(&current)?;
    payload.validate()?;

    let existing = article_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !permissions::can_modify_content(&current, existing.author_id) {
        return Err(AppError::Unauthorized);
    }

    if payload.status == ArticleStatus::Published
        && existing.status != ArticleStatus::Published
        && !permissions::can_publish_articles(current.profile.as_ref())
    {
        return Err(AppError::Unauthorized);
    }

    let published_at = match payload.status {
        ArticleStatus::Published => existing.published_at.or_else(|| Some(Utc::now())),
        ArticleStatus::Draft => None,
    };

    let article = article_repo::update_article(
        &state.db,
        id,
        &payload.title,
        &payload.slug,
        payload.excerpt.as_deref(),
        &payload.content,
        payload.cover_image.as_deref(),
        payload.category.as_deref(),
        &payload.tags,
        payload.status,
        published_at,
    )
    .await?;

    tracing::info!("✅ Article updated: {} ({})", article.slug, article.id);

    let body = sonic_rs::to_string(&article)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Deletes an article and returns the refreshed listing page the caller was
/// on. The page clamp steps back automatically when the deletion emptied
/// the last page.
#[axum::debug_handler]
pub async fn delete_article(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Query(params): Query<ArticleListParams>,
) -> Result<Response> {
    require_panel_access(&current)?;

    let existing = article_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !permissions::can_modify_content(&current, existing.author_id) {
        return Err(AppError::Unauthorized);
    }

    article_repo::delete_article(&state.db, id).await?;
    tracing::info!("✅ Article deleted: {} ({})", existing.slug, id);

    let list_state = params.into_state();
    let page = admin_query(&current)
        .fetch(&state.db, &list_state, article_repo::map_row)
        .await?;

    let body = sonic_rs::to_string(&page)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

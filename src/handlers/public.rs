use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    listing::{ListQuery, ListQueryState},
    repositories::{
        article as article_repo, event as event_repo, leadership as leadership_repo,
        member as member_repo,
    },
    state::AppState,
};

/// Listing parameters accepted by the public endpoints.
#[derive(Deserialize, Default)]
pub struct PublicListParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

impl PublicListParams {
    fn into_state(self) -> ListQueryState {
        let mut state = ListQueryState::new();
        if let Some(search) = self.search {
            state.set_search(search);
        }
        if let Some(category) = self.category {
            state.set_filter("category", category);
        }
        if let Some(status) = self.status {
            state.set_filter("status", status);
        }
        if let Some(batch) = self.batch {
            state.set_filter("batch", batch);
        }
        state.set_page(self.page);
        state
    }
}

fn serialize<T: serde::Serialize>(value: &T) -> Result<String> {
    sonic_rs::to_string(value)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))
}

/// Lists published articles.
#[axum::debug_handler]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(params): Query<PublicListParams>,
) -> Result<Response> {
    let list_state = params.into_state();
    let page = ListQuery::new("articles", article_repo::ARTICLE_COLUMNS)
        .search_columns(&["title", "excerpt"])
        .filter_columns(&["category"])
        .default_sort("published_at", false)
        .condition("status = 'published'")
        .fetch(&state.db, &list_state, article_repo::map_row)
        .await?;

    Ok((StatusCode::OK, serialize(&page)?).into_response())
}

/// Fetches one published article by slug.
#[axum::debug_handler]
pub async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response> {
    let article = article_repo::find_published_by_slug(&state.db, &slug)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok((StatusCode::OK, serialize(&article)?).into_response())
}

/// Lists events, newest first.
#[axum::debug_handler]
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<PublicListParams>,
) -> Result<Response> {
    let list_state = params.into_state();
    let page = ListQuery::new("events", event_repo::EVENT_COLUMNS)
        .search_columns(&["title", "location"])
        .filter_columns(&["status", "category"])
        .default_sort("event_date", false)
        .fetch(&state.db, &list_state, event_repo::map_row)
        .await?;

    Ok((StatusCode::OK, serialize(&page)?).into_response())
}

/// Fetches one event by slug.
#[axum::debug_handler]
pub async fn get_event(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response> {
    let event = event_repo::find_by_slug(&state.db, &slug)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok((StatusCode::OK, serialize(&event)?).into_response())
}

/// Lists members for the public roster.
#[axum::debug_handler]
pub async fn list_members(
    State(state): State<AppState>,
    Query(params): Query<PublicListParams>,
) -> Result<Response> {
    let list_state = params.into_state();
    let page = ListQuery::new("members", member_repo::MEMBER_COLUMNS)
        .search_columns(&["name"])
        .filter_columns(&["status", "batch"])
        .default_sort("name", true)
        .fetch(&state.db, &list_state, member_repo::map_row)
        .await?;

    Ok((StatusCode::OK, serialize(&page)?).into_response())
}

/// Lists the leadership roster in display order.
#[axum::debug_handler]
pub async fn list_leadership(
    State(state): State<AppState>,
    Query(params): Query<PublicListParams>,
) -> Result<Response> {
    let list_state = params.into_state();
    let page = ListQuery::new("leadership", leadership_repo::LEADERSHIP_COLUMNS)
        .search_columns(&["name", "position"])
        .default_sort("display_order", true)
        .per_page(50)
        .fetch(&state.db, &list_state, leadership_repo::map_row)
        .await?;

    Ok((StatusCode::OK, serialize(&page)?).into_response())
}

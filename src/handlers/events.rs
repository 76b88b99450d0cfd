use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{NaiveDate, NaiveTime};
use garde::Validate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    listing::{ListQuery, ListQueryState},
    models::event::EventStatus,
    models::profile::Role,
    models::session::CurrentUser,
    permissions,
    repositories::event as event_repo,
    state::AppState,
    validation::content::valid_slug,
};

/// Listing parameters accepted by the admin event endpoints.
#[derive(Deserialize, Default)]
pub struct EventListParams {
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

impl EventListParams {
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

/// The event payload for create and update.
#[derive(Deserialize, Validate)]
pub struct EventPayload {
    #[garde(length(min = 1, max = 300))]
    pub title: String,
    #[garde(custom(valid_slug))]
    pub slug: String,
    #[garde(length(min = 1))]
    pub description: String,
    #[garde(skip)]
    pub cover_image: Option<String>,
    #[garde(length(min = 1, max = 300))]
    pub location: String,
    #[garde(length(max = 100))]
    pub category: Option<String>,
    #[garde(skip)]
    pub event_date: NaiveDate,
    #[garde(skip)]
    pub start_time: Option<NaiveTime>,
    #[garde(skip)]
    pub end_time: Option<NaiveTime>,
    #[garde(skip)]
    pub registration_link: Option<String>,
    #[garde(skip)]
    pub status: EventStatus,
    #[garde(range(min = 1))]
    pub max_participants: Option<i32>,
    #[garde(skip)]
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The admin listing configuration. Kontributor sees only their own rows.
fn admin_query(current: &CurrentUser) -> ListQuery {
    let restricted = permissions::check_permission(current.profile.as_ref(), &[Role::Kontributor]);
    ListQuery::new("events", event_repo::EVENT_COLUMNS)
        .search_columns(&["title", "location"])
        .filter_columns(&["status", "category"])
        .sortable_columns(&["title", "status", "event_date", "created_at"])
        .default_sort("event_date", false)
        .owner_column("created_by")
        .owned_by(restricted.then_some(current.user_id))
}

fn require_panel_access(current: &CurrentUser) -> Result<()> {
    permissions::require(
        current.profile.as_ref(),
        &[Role::SuperAdmin, Role::Admin, Role::Kontributor],
    )
}

/// Lists events for the admin panel.
#[axum::debug_handler]
pub async fn list_events(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<EventListParams>,
) -> Result<Response> {
    require_panel_access(&current)?;

    let list_state = params.into_state();
    let page = admin_query(&current)
        .fetch(&state.db, &list_state, event_repo::map_row)
        .await?;

    let body = sonic_rs::to_string(&page)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Fetches one event for the admin edit form.
#[axum::debug_handler]
pub async fn get_event(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    require_panel_access(&current)?;

    let event = event_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !permissions::can_modify_content(&current, event.created_by) {
        return Err(AppError::Unauthorized);
    }

    let body = sonic_rs::to_string(&event)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Creates an event.
#[axum::debug_handler]
pub async fn create_event(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<EventPayload>,
) -> Result<Response> {
    require_panel_access(&current)?;
    payload.validate()?;

    let event = event_repo::create_event(
        &state.db,
        &payload.title,
        &payload.slug,
        &payload.description,
        payload.cover_image.as_deref(),
        &payload.location,
        payload.category.as_deref(),
        payload.event_date,
        payload.start_time,
        payload.end_time,
        payload.registration_link.as_deref(),
        payload.status,
        payload.max_participants,
        &payload.tags,
        current.user_id,
    )
    .await?;

    tracing::info!("✅ Event created: {} ({})", event.slug, event.id);

    let body = sonic_rs::to_string(&event)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::CREATED, body).into_response())
}

/// Updates an event.
#[axum::debug_handler]
pub async fn update_event(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EventPayload>,
) -> Result<Response> {
    require_panel_access(&current)?;
    payload.validate()?;

    let existing = event_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !permissions::can_modify_content(&current, existing.created_by) {
        return Err(AppError::Unauthorized);
    }

    let event = event_repo::update_event(
        &state.db,
        id,
        &payload.title,
        &payload.slug,
        &payload.description,
        payload.cover_image.as_deref(),
        &payload.location,
        payload.category.as_deref(),
        payload.event_date,
        payload.start_time,
        payload.end_time,
        payload.registration_link.as_deref(),
        payload.status,
        payload.max_participants,
        &payload.tags,
    )
    .await?;

    tracing::info!("✅ Event updated: {} ({})", event.slug, event.id);

    let body = sonic_rs::to_string(&event)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Deletes an event and returns the refreshed listing page the caller was
/// on.
#[axum::debug_handler]
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Query(params): Query<EventListParams>,
) -> Result<Response> {
    require_panel_access(&current)?;

    let existing = event_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !permissions::can_modify_content(&current, existing.created_by) {
        return Err(AppError::Unauthorized);
    }

    event_repo::delete_event(&state.db, id).await?;
    tracing::info!("✅ Event deleted: {} ({})", existing.slug, id);

    let list_state = params.into_state();
    let page = admin_query(&current)
        .fetch(&state.db, &list_state, event_repo::map_row)
        .await?;

    let body = sonic_rs::to_string(&page)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

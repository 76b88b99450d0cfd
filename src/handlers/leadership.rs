use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::NaiveDate;
use garde::Validate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    listing::{ListQuery, ListQueryState},
    models::session::CurrentUser,
    permissions,
    repositories::leadership as leadership_repo,
    state::AppState,
};

/// Listing parameters accepted by the admin leadership endpoints.
#[derive(Deserialize, Default)]
pub struct LeadershipListParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
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

impl LeadershipListParams {
    fn into_state(self) -> ListQueryState {
        let mut state = ListQueryState::new();
        if let Some(search) = self.search {
            state.set_search(search);
        }
        if let Some(division) = self.division {
            state.set_filter("division", division);
        }
        if let Some(sort) = self.sort {
            state.set_sort(sort, self.order.as_deref() != Some("desc"));
        }
        state.set_page(self.page);
        state
    }
}

/// The leadership payload for create and update.
#[derive(Deserialize, Validate)]
pub struct LeadershipPayload {
    #[garde(length(min = 1, max = 200))]
    pub name: String,
    #[garde(length(min = 1, max = 200))]
    pub position: String,
    #[garde(length(min = 1, max = 200))]
    pub division: String,
    #[garde(skip)]
    pub photo: Option<String>,
    #[garde(email)]
    pub email: Option<String>,
    #[garde(length(max = 30))]
    pub phone: Option<String>,
    #[garde(length(max = 30))]
    pub nim: Option<String>,
    #[garde(length(max = 10))]
    pub batch: Option<String>,
    #[garde(length(max = 1000))]
    pub bio: Option<String>,
    #[garde(skip)]
    pub social_media: Option<serde_json::Value>,
    #[garde(skip)]
    pub period_start: NaiveDate,
    #[garde(skip)]
    pub period_end: NaiveDate,
    #[garde(range(min = 0))]
    #[serde(default)]
    pub display_order: i32,
}

fn leadership_query() -> ListQuery {
    ListQuery::new("leadership", leadership_repo::LEADERSHIP_COLUMNS)
        .search_columns(&["name", "position"])
        .filter_columns(&["division"])
        .sortable_columns(&["name", "position", "division", "display_order", "period_start"])
        .default_sort("display_order", true)
}

/// Lists leadership records for the admin panel.
#[axum::debug_handler]
pub async fn list_leadership(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<LeadershipListParams>,
) -> Result<Response> {
    if !permissions::can_manage_members(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }

    let list_state = params.into_state();
    let page = leadership_query()
        .fetch(&state.db, &list_state, leadership_repo::map_row)
        .await?;

    let body = sonic_rs::to_string(&page)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Fetches one leadership record for the admin edit form.
#[axum::debug_handler]
pub async fn get_leadership(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    if !permissions::can_manage_members(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }

    let record = leadership_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;

    let body = sonic_rs::to_string(&record)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Creates a leadership record.
#[axum::debug_handler]
pub async fn create_leadership(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<LeadershipPayload>,
) -> Result<Response> {
    if !permissions::can_manage_members(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }
    payload.validate()?;

    if payload.period_end < payload.period_start {
        return Err(AppError::Validation(
            "Period end must not precede period start".to_string(),
        ));
    }

    let record = leadership_repo::create_leadership(
        &state.db,
        &payload.name,
        &payload.position,
        &payload.division,
        payload.photo.as_deref(),
        payload.email.as_deref(),
        payload.phone.as_deref(),
        payload.nim.as_deref(),
        payload.batch.as_deref(),
        payload.bio.as_deref(),
        payload.social_media.as_ref(),
        payload.period_start,
        payload.period_end,
        payload.display_order,
    )
    .await?;

    tracing::info!("✅ Leadership record created: {} ({})", record.position, record.id);

    let body = sonic_rs::to_string(&record)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::CREATED, body).into_response())
}

/// Updates a leadership record.
#[axum::debug_handler]
pub async fn update_leadership(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LeadershipPayload>,
) -> Result<Response> {
    if !permissions::can_manage_members(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }
    payload.validate()?;

    if payload.period_end < payload.period_start {
        return Err(AppError::Validation(
            "Period end must not precede period start".to_string(),
        ));
    }

    let record = leadership_repo::update_leadership(
        &state.db,
        id,
        &payload.name,
        &payload.position,
        &payload.division,
        payload.photo.as_deref(),
        payload.email.as_deref(),
        payload.phone.as_deref(),
        payload.nim.as_deref(),
        payload.batch.as_deref(),
        payload.bio.as_deref(),
        payload.social_media.as_ref(),
        payload.period_start,
        payload.period_end,
        payload.display_order,
    )
    .await?;

    tracing::info!("✅ Leadership record updated: {} ({})", record.position, record.id);

    let body = sonic_rs::to_string(&record)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Deletes a leadership record and returns the refreshed listing page the
/// caller was on.
#[axum::debug_handler]
pub async fn delete_leadership(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Query(params): Query<LeadershipListParams>,
) -> Result<Response> {
    if !permissions::can_manage_members(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }

    leadership_repo::delete_leadership(&state.db, id).await?;
    tracing::info!("✅ Leadership record deleted: {}", id);

    let list_state = params.into_state();
    let page = leadership_query()
        .fetch(&state.db, &list_state, leadership_repo::map_row)
        .await?;

    let body = sonic_rs::to_string(&page)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

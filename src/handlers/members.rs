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
    models::member::MemberStatus,
    models::session::CurrentUser,
    permissions,
    repositories::member as member_repo,
    state::AppState,
};

/// Listing parameters accepted by the admin member endpoints.
#[derive(Deserialize, Default)]
pub struct MemberListParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub batch: Option<String>,
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

impl MemberListParams {
    fn into_state(self) -> ListQueryState {
        let mut state = ListQueryState::new();
        if let Some(search) = self.search {
            state.set_search(search);
        }
        if let Some(status) = self.status {
            state.set_filter("status", status);
        }
        if let Some(batch) = self.batch {
            state.set_filter("batch", batch);
        }
        if let Some(sort) = self.sort {
            state.set_sort(sort, self.order.as_deref() != Some("desc"));
        }
        state.set_page(self.page);
        state
    }
}

/// The member payload for create and update.
#[derive(Deserialize, Validate)]
pub struct MemberPayload {
    #[garde(length(min = 1, max = 200))]
    pub name: String,
    #[garde(length(min = 1, max = 30))]
    pub nim: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(max = 30))]
    pub phone: Option<String>,
    #[garde(length(min = 1, max = 10))]
    pub batch: String,
    #[garde(length(max = 100))]
    pub major: Option<String>,
    #[garde(skip)]
    pub photo: Option<String>,
    #[garde(length(max = 1000))]
    pub bio: Option<String>,
    #[garde(skip)]
    pub join_date: NaiveDate,
    #[garde(skip)]
    pub status: MemberStatus,
    #[garde(skip)]
    pub social_media: Option<serde_json::Value>,
}

fn member_query() -> ListQuery {
    ListQuery::new("members", member_repo::MEMBER_COLUMNS)
        .search_columns(&["name", "nim"])
        .filter_columns(&["status", "batch"])
        .sortable_columns(&["name", "nim", "batch", "join_date", "created_at"])
        .default_sort("name", true)
}

/// Lists members for the admin panel.
#[axum::debug_handler]
pub async fn list_members(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<MemberListParams>,
) -> Result<Response> {
    if !permissions::can_manage_members(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }

    let list_state = params.into_state();
    let page = member_query()
        .fetch(&state.db, &list_state, member_repo::map_row)
        .await?;

    let body = sonic_rs::to_string(&page)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Fetches one member for the admin edit form.
#[axum::debug_handler]
pub async fn get_member(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    if !permissions::can_manage_members(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }

    let member = member_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;

    let body = sonic_rs::to_string(&member)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Creates a member.
#[axum::debug_handler]
pub async fn create_member(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<MemberPayload>,
) -> Result<Response> {
    if !permissions::can_manage_members(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }
    payload.validate()?;

    let member = member_repo::create_member(
        &state.db,
        &payload.name,
        &payload.nim,
        &payload.email,
        payload.phone.as_deref(),
        &payload.batch,
        payload.major.as_deref(),
        payload.photo.as_deref(),
        payload.bio.as_deref(),
        payload.join_date,
        payload.status,
        payload.social_media.as_ref(),
    )
    .await?;

    tracing::info!("✅ Member created: {} ({})", member.nim, member.id);

    let body = sonic_rs::to_string(&member)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::CREATED, body).into_response())
}

/// Updates a member.
#[axum::debug_handler]
pub async fn update_member(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MemberPayload>,
) -> Result<Response> {
    if !permissions::can_manage_members(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }
    payload.validate()?;

    let member = member_repo::update_member(
        &state.db,
        id,
        &payload.name,
        &payload.nim,
        &payload.email,
        payload.phone.as_deref(),
        &payload.batch,
        payload.major.as_deref(),
        payload.photo.as_deref(),
        payload.bio.as_deref(),
        payload.join_date,
        payload.status,
        payload.social_media.as_ref(),
    )
    .await?;

    tracing::info!("✅ Member updated: {} ({})", member.nim, member.id);

    let body = sonic_rs::to_string(&member)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Deletes a member and returns the refreshed listing page the caller was
/// on.
#[axum::debug_handler]
pub async fn delete_member(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Query(params): Query<MemberListParams>,
) -> Result<Response> {
    if !permissions::can_manage_members(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }

    member_repo::delete_member(&state.db, id).await?;
    tracing::info!("✅ Member deleted: {}", id);

    let list_state = params.into_state();
    let page = member_query()
        .fetch(&state.db, &list_state, member_repo::map_row)
        .await?;

    let body = sonic_rs::to_string(&page)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

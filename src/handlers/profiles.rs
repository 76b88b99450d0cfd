use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use garde::Validate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    listing::{ListQuery, ListQueryState},
    models::profile::Role,
    models::session::CurrentUser,
    permissions,
    repositories::profile as profile_repo,
    services::auth as auth_service,
    state::AppState,
    validation::auth::validate_password,
};

/// Listing parameters accepted by the admin user-management endpoints.
#[derive(Deserialize, Default)]
pub struct ProfileListParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
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

impl ProfileListParams {
    fn into_state(self) -> ListQueryState {
        let mut state = ListQueryState::new();
        if let Some(search) = self.search {
            state.set_search(search);
        }
        if let Some(role) = self.role {
            state.set_filter("role", role);
        }
        if let Some(sort) = self.sort {
            state.set_sort(sort, self.order.as_deref() != Some("desc"));
        }
        state.set_page(self.page);
        state
    }
}

/// The payload for creating an account with its profile.
#[derive(Deserialize, Validate)]
pub struct CreateUserPayload {
    #[garde(email)]
    pub email: String,
    #[garde(skip)]
    pub password: String,
    #[garde(length(max = 200))]
    pub full_name: Option<String>,
    #[garde(skip)]
    pub role: Role,
}

/// The payload for updating a profile.
#[derive(Deserialize, Validate)]
pub struct UpdateUserPayload {
    #[garde(length(max = 200))]
    pub full_name: Option<String>,
    #[garde(skip)]
    pub role: Role,
    #[garde(skip)]
    pub avatar_url: Option<String>,
}

fn profile_query() -> ListQuery {
    ListQuery::new("profiles", profile_repo::PROFILE_COLUMNS)
        .search_columns(&["email", "full_name"])
        .filter_columns(&["role"])
        .sortable_columns(&["email", "full_name", "role", "created_at"])
        .default_sort("created_at", false)
}

/// Lists user profiles. Super admin only.
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ProfileListParams>,
) -> Result<Response> {
    if !permissions::can_manage_users(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }

    let list_state = params.into_state();
    let page = profile_query()
        .fetch(&state.db, &list_state, profile_repo::map_row)
        .await?;

    let body = sonic_rs::to_string(&page)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Creates an account and applies the requested profile. Super admin only.
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<Response> {
    if !permissions::can_manage_users(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }
    payload.validate()?;
    validate_password(&payload.password)?;

    let profile = auth_service::create_account(
        &state.db,
        &payload.email,
        &payload.password,
        payload.full_name.as_deref(),
        payload.role,
    )
    .await?;

    let body = sonic_rs::to_string(&profile)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::CREATED, body).into_response())
}

/// Updates a profile's display fields and role. Super admin only.
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Response> {
    if !permissions::can_manage_users(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }
    payload.validate()?;

    let profile = profile_repo::update_profile(
        &state.db,
        &id,
        payload.full_name.as_deref(),
        payload.role,
        payload.avatar_url.as_deref(),
    )
    .await?;

    // the cached profile is stale the moment the role changes
    state.profiles.invalidate(id).await;

    tracing::info!("✅ Profile updated: {} -> {}", id, profile.role.as_str());

    let body = sonic_rs::to_string(&profile)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Deletes an account and its profile. Super admin only.
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Query(params): Query<ProfileListParams>,
) -> Result<Response> {
    if !permissions::can_manage_users(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }

    if id == current.user_id {
        return Err(AppError::Validation(
            "You cannot delete your own account".to_string(),
        ));
    }

    profile_repo::delete_account(&state.db, &id).await?;
    state.profiles.invalidate(id).await;
    tracing::info!("✅ Account deleted: {}", id);

    let list_state = params.into_state();
    let page = profile_query()
        .fetch(&state.db, &list_state, profile_repo::map_row)
        .await?;

    let body = sonic_rs::to_string(&page)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::OK, body).into_response())
}

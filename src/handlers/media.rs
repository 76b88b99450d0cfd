use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::session::CurrentUser,
    permissions,
    state::AppState,
};

/// The request payload for deleting a stored file.
#[derive(Deserialize)]
pub struct DeleteMediaRequest {
    pub url: String,
}

/// Handles an image upload. Expects a multipart form with a `file` part and
/// an optional `folder` part naming the destination bucket folder.
#[axum::debug_handler]
pub async fn upload(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Response> {
    permissions::require(
        current.profile.as_ref(),
        &[
            crate::models::profile::Role::SuperAdmin,
            crate::models::profile::Role::Admin,
            crate::models::profile::Role::Kontributor,
        ],
    )?;

    let mut folder = "general".to_string();
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Multipart(e.to_string()))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("folder") => {
                folder = field
                    .text()
                    .await
                    .map_err(|e| AppError::Multipart(e.to_string()))?;
            }
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Multipart(e.to_string()))?;
                data = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| AppError::Multipart("Missing file part".to_string()))?;

    tracing::info!(
        "📤 Upload by {}: {} bytes into {}",
        current.user_id,
        data.len(),
        folder,
    );

    let url = state.media.store(data, &folder).await?;

    let body = sonic_rs::to_string(&sonic_rs::json!({ "url": url }))
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    Ok((StatusCode::CREATED, body).into_response())
}

/// Deletes a stored file by its public URL.
#[axum::debug_handler]
pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<DeleteMediaRequest>,
) -> Result<Response> {
    if !permissions::can_manage_members(current.profile.as_ref()) {
        return Err(AppError::Unauthorized);
    }

    state.media.delete_by_url(&payload.url).await?;

    Ok((
        StatusCode::OK,
        r#"{"message":"File deleted successfully"}"#,
    )
        .into_response())
}

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    auth_events::AuthEvent,
    error::{AppError, Result},
    models::session::{CurrentUser, Session},
    services::auth as auth_service,
    state::AppState,
    validation::auth::*,
};

use redis::AsyncCommands;

/// The request payload for signing in.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The request payload for changing a password.
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// The response payload for authentication-related requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
}

/// Creates a secure cookie with the given name, value, and max age.
fn create_secure_cookie(name: String, value: String, max_age_days: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(name.clone(), value);

    let is_production =
        std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()) == "production";

    // the CSRF cookie must stay readable for the double-submit header
    if name != "csrf_token" {
        cookie.set_http_only(true);
    }

    if is_production {
        cookie.set_secure(true);
    }

    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_days * 86400));
    cookie.set_path("/");

    cookie
}

/// Handles sign-in.
#[axum::debug_handler]
pub async fn login(
    State(mut state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Sign-in attempt: {}", payload.email);
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    let account = auth_service::authenticate(&state.db, &payload.email, &payload.password).await?;

    let session_id = Uuid::new_v4();
    let session = Session {
        user_id: account.id,
        created_at: Utc::now(),
        expires_at: Utc::now() + chrono::Duration::days(state.config.session_duration_days),
    };

    let session_json = sonic_rs::to_string(&session)
        .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;

    let expiration_seconds = (state.config.session_duration_days * 86400) as u64;
    let _: () = state
        .redis
        .set_ex(
            format!("session:{}", session_id),
            &session_json,
            expiration_seconds,
        )
        .await
        .map_err(|e| {
            tracing::error!("❌ Redis set_ex failed: {}", e);
            AppError::Redis(e)
        })?;

    cookies.add(create_secure_cookie(
        "session_id".to_string(),
        session_id.to_string(),
        state.config.session_duration_days,
    ));

    let csrf_token = crate::crypto::csrf::generate_csrf_token()?;
    let _: () = state
        .redis
        .set_ex(format!("csrf:{}", csrf_token), "valid", expiration_seconds)
        .await
        .map_err(|e| {
            tracing::error!("❌ Redis set_ex failed for CSRF: {}", e);
            AppError::Redis(e)
        })?;

    cookies.add(create_secure_cookie(
        "csrf_token".to_string(),
        csrf_token,
        state.config.session_duration_days,
    ));

    state
        .auth_events
        .publish(AuthEvent::SignedIn { user_id: account.id });

    tracing::info!("✅ User signed in: {}", account.id);

    let response = AuthResponse {
        success: true,
        message: "Sign-in successful".to_string(),
    };
    let body = sonic_rs::to_string(&response)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;

    Ok((StatusCode::OK, body).into_response())
}

/// Handles sign-out.
#[axum::debug_handler]
pub async fn logout(
    State(mut state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
) -> Result<Response> {
    tracing::info!("👋 Sign-out for user: {}", session.user_id);

    let session_id = cookies
        .get("session_id")
        .map(|c| c.value().to_string())
        .ok_or(AppError::Unauthorized)?;

    let _: () = state.redis.del(format!("session:{}", session_id)).await?;

    if let Some(csrf_cookie) = cookies.get("csrf_token") {
        let csrf_token = csrf_cookie.value();
        let _: () = state
            .redis
            .del(format!("csrf:{}", csrf_token))
            .await
            .unwrap_or(());
    }

    // drop the cached profile before answering so no further request can
    // observe the signed-out identity
    state.profiles.invalidate(session.user_id).await;
    state.auth_events.publish(AuthEvent::SignedOut {
        user_id: session.user_id,
    });

    let mut session_cookie = Cookie::new("session_id", "");
    session_cookie.set_max_age(Duration::seconds(0));
    session_cookie.set_path("/");
    cookies.remove(session_cookie);

    let mut csrf_cookie = Cookie::new("csrf_token", "");
    csrf_cookie.set_max_age(Duration::seconds(0));
    csrf_cookie.set_path("/");
    cookies.remove(csrf_cookie);

    tracing::info!("✅ User signed out: {}", session.user_id);

    let response = AuthResponse {
        success: true,
        message: "Sign-out successful".to_string(),
    };
    let body = sonic_rs::to_string(&response)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;

    Ok((StatusCode::OK, body).into_response())
}

/// The response payload for the current-identity endpoint.
#[derive(Serialize)]
struct MeResponse<'a> {
    user_id: Uuid,
    profile: Option<&'a crate::models::profile::Profile>,
}

/// Returns the authenticated identity and its profile.
#[axum::debug_handler]
pub async fn me(Extension(current): Extension<CurrentUser>) -> Result<Response> {
    let body = sonic_rs::to_string(&MeResponse {
        user_id: current.user_id,
        profile: current.profile.as_ref(),
    })
    .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;

    Ok((StatusCode::OK, body).into_response())
}

/// Handles changing the caller's password.
#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Response> {
    validate_password(&payload.new_password)?;

    auth_service::change_password(
        &state.db,
        session.user_id,
        &payload.old_password,
        &payload.new_password,
    )
    .await?;

    let response = AuthResponse {
        success: true,
        message: "Password changed successfully".to_string(),
    };
    let body = sonic_rs::to_string(&response)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;

    Ok((StatusCode::OK, body).into_response())
}

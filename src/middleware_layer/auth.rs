use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    auth_events::AuthEvent,
    error::AppError,
    models::session::{CurrentUser, Session},
    profile_cache::RESOLVE_TIMEOUT,
    state::AppState,
};

use redis::AsyncCommands;

/// Extracts the session token from the request cookies.
fn extract_session_token(cookies: &Cookies) -> Option<Uuid> {
    cookies
        .get("session_id")
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// A middleware that requires a valid session to be present.
///
/// On success the request carries a `Session` and a `CurrentUser` extension.
/// The profile half of `CurrentUser` stays `None` when the profile cannot be
/// resolved; permission checks then deny everything instead of the request
/// hanging or failing outright.
pub async fn require_auth(
    State(mut state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let session_id = extract_session_token(&cookies).ok_or_else(|| {
        tracing::debug!("❌ No session_id cookie found");
        StatusCode::FORBIDDEN
    })?;

    let session_key = format!("session:{}", session_id);
    let session_json: String = state.redis.get(&session_key).await.map_err(|e| {
        tracing::warn!("❌ Redis error or session not found: {}", e);
        StatusCode::FORBIDDEN
    })?;

    let mut session: Session = sonic_rs::from_str(&session_json).map_err(|e| {
        tracing::warn!("❌ Invalid session JSON: {}", e);
        StatusCode::FORBIDDEN
    })?;

    let now = Utc::now();
    if now > session.expires_at {
        tracing::warn!("❌ Session expired for user: {}", session.user_id);

        let _: () = state.redis.del(&session_key).await.unwrap_or(());
        return Err(StatusCode::FORBIDDEN);
    }

    // Slide the session: once past the halfway point, extend it and
    // announce the refresh.
    let duration_secs = state.config.session_duration_days * 86400;
    if (session.expires_at - now).num_seconds() < duration_secs / 2 {
        session.expires_at = now + chrono::Duration::days(state.config.session_duration_days);
        if let Ok(renewed) = sonic_rs::to_string(&session) {
            let _: () = state
                .redis
                .set_ex(&session_key, renewed, duration_secs as u64)
                .await
                .unwrap_or(());
            state.auth_events.publish(AuthEvent::TokenRefreshed {
                user_id: session.user_id,
            });
            tracing::debug!("🔄 Session extended for user: {}", session.user_id);
        }
    }

    let profile = match tokio::time::timeout(RESOLVE_TIMEOUT, state.profiles.get(session.user_id))
        .await
    {
        Ok(Ok(profile)) => Some(profile),
        Ok(Err(AppError::NotFound)) => {
            tracing::warn!("⚠️ No profile for authenticated user {}", session.user_id);
            None
        }
        Ok(Err(e)) => {
            tracing::warn!("⚠️ Profile resolution failed for {}: {}", session.user_id, e);
            None
        }
        Err(_) => {
            tracing::error!("⚠️ Profile resolution timed out for {}", session.user_id);
            None
        }
    };

    tracing::debug!("✅ User authenticated: {}", session.user_id);

    request.extensions_mut().insert(CurrentUser {
        user_id: session.user_id,
        profile,
    });
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

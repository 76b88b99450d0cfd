use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use http::{header, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_cookies::CookieManagerLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    cors::CorsLayer,
};

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth_events;
mod config;
mod db;
mod error;
mod listing;
mod permissions;
mod profile_cache;
mod state;

mod crypto {
    pub mod csrf;
}

mod models {
    pub mod article;
    pub mod event;
    pub mod leadership;
    pub mod member;
    pub mod profile;
    pub mod session;
}

mod repositories {
    pub mod article;
    pub mod event;
    pub mod leadership;
    pub mod member;
    pub mod profile;
}

mod services {
    pub mod auth;
    pub mod media;
}

mod handlers {
    pub mod articles;
    pub mod auth;
    pub mod events;
    pub mod leadership;
    pub mod media;
    pub mod members;
    pub mod profiles;
    pub mod public;
}

mod middleware_layer {
    pub mod auth;
    pub mod csrf;
    pub mod rate_limit;
}

mod validation {
    pub mod auth;
    pub mod content;
}

use config::Config;
use profile_cache::ProfileListener;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config).await?;
    tracing::info!("✅ AppState initialized");

    let profile_listener = ProfileListener::spawn(state.profiles.clone(), &state.auth_events);
    tracing::info!("✅ Profile cache subscribed to auth events");

    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse().unwrap(),
            "http://127.0.0.1:3000".parse().unwrap(),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::COOKIE,
            "x-csrf-token".parse().unwrap(),
        ])
        .allow_credentials(true)
        .expose_headers(["x-csrf-token".parse().unwrap()])
        .max_age(Duration::from_secs(86400));

    let admin_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(50)
            .burst_size(200)
            .use_headers()
            .finish()
            .unwrap(),
    );

    let public_routes = Router::new()
        .route("/api/articles", get(handlers::public::list_articles))
        .route("/api/articles/{slug}", get(handlers::public::get_article))
        .route("/api/events", get(handlers::public::list_events))
        .route("/api/events/{slug}", get(handlers::public::get_event))
        .route("/api/members", get(handlers::public::list_members))
        .route("/api/leadership", get(handlers::public::list_leadership))
        .with_state(state.clone());

    let login_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::rate_limit::rate_limit_login,
        ))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/auth/change-password",
            post(handlers::auth::change_password),
        )
        .route(
            "/api/admin/articles",
            get(handlers::articles::list_articles).post(handlers::articles::create_article),
        )
        .route(
            "/api/admin/articles/{id}",
            get(handlers::articles::get_article)
                .put(handlers::articles::update_article)
                .delete(handlers::articles::delete_article),
        )
        .route(
            "/api/admin/events",
            get(handlers::events::list_events).post(handlers::events::create_event),
        )
        .route(
            "/api/admin/events/{id}",
            get(handlers::events::get_event)
                .put(handlers::events::update_event)
                .delete(handlers::events::delete_event),
        )
        .route(
            "/api/admin/members",
            get(handlers::members::list_members).post(handlers::members::create_member),
        )
        .route(
            "/api/admin/members/{id}",
            get(handlers::members::get_member)
                .put(handlers::members::update_member)
                .delete(handlers::members::delete_member),
        )
        .route(
            "/api/admin/leadership",
            get(handlers::leadership::list_leadership).post(handlers::leadership::create_leadership),
        )
        .route(
            "/api/admin/leadership/{id}",
            get(handlers::leadership::get_leadership)
                .put(handlers::leadership::update_leadership)
                .delete(handlers::leadership::delete_leadership),
        )
        .route(
            "/api/admin/users",
            get(handlers::profiles::list_users).post(handlers::profiles::create_user),
        )
        .route(
            "/api/admin/users/{id}",
            put(handlers::profiles::update_user).delete(handlers::profiles::delete_user),
        )
        .route("/api/media/upload", post(handlers::media::upload))
        .route("/api/media/delete", post(handlers::media::delete))
        .layer(tower_governor::GovernorLayer::new(admin_governor_conf.clone()))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::csrf::verify_csrf,
        ))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state.clone());

    let app = Router::new()
        .merge(public_routes)
        .merge(login_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes + 1024 * 1024))
        .layer(cors)
        .fallback_service(ServeDir::new(&state.config.media_root));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    profile_listener.shutdown();

    Ok(())
}

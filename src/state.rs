use std::sync::Arc;

use deadpool_postgres::Pool;
use redis::aio::ConnectionManager;

use crate::auth_events::AuthEvents;
use crate::config::Config;
use crate::error::Result;
use crate::profile_cache::{PgProfiles, ProfileCache};
use crate::services::media::MediaStorage;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The Redis connection manager.
    pub redis: ConnectionManager,
    /// The application's configuration.
    pub config: Config,
    /// The per-identity profile cache.
    pub profiles: Arc<ProfileCache<PgProfiles>>,
    /// The session lifecycle event stream.
    pub auth_events: AuthEvents,
    /// The media store for uploads.
    pub media: Arc<MediaStorage>,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized");

        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis = ConnectionManager::new(redis_client).await?;
        tracing::info!("✅ Redis connection manager initialized");

        let profiles = Arc::new(ProfileCache::new(PgProfiles::new(db.clone())));
        tracing::info!("✅ Profile cache initialized");

        let media = Arc::new(MediaStorage::new(
            config.media_root.clone(),
            config.public_base_url.clone(),
            config.max_upload_bytes,
        ));
        tracing::info!("✅ Media storage initialized at {:?}", config.media_root);

        Ok(AppState {
            db,
            redis,
            config: config.clone(),
            profiles,
            auth_events: AuthEvents::new(64),
            media,
        })
    }
}

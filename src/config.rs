use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// The duration of a session in days.
    pub session_duration_days: i64,
    /// The TCP port the server binds to.
    pub port: u16,
    /// The directory media uploads are written to.
    pub media_root: PathBuf,
    /// The base URL under which stored media is publicly reachable.
    pub public_base_url: String,
    /// The maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let max_upload_mb: usize = env::var("MAX_UPLOAD_MB")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .context("Invalid MAX_UPLOAD_MB")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            session_duration_days: env::var("SESSION_DURATION_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .context("Invalid SESSION_DURATION_DAYS")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,
            media_root: PathBuf::from(
                env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()),
            ),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}

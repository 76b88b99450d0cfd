use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::profile::Profile;

/// A server-side session record, stored in Redis keyed by the session id
/// that lives in the `session_id` cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The ID of the user this session belongs to.
    pub user_id: Uuid,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

/// The authenticated identity attached to a request by the auth middleware.
///
/// The profile is `None` when the identity exists but its profile row could
/// not be resolved; permission checks then deny everything.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// The resolved profile, if any.
    pub profile: Option<Profile>,
}

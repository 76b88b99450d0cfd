use chrono::{DateTime, NaiveDate, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// The membership state of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "member_status")]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    #[postgres(name = "active")]
    Active,
    #[postgres(name = "inactive")]
    Inactive,
    #[postgres(name = "alumni")]
    Alumni,
}

/// A registered member of the organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// The unique identifier for the member.
    pub id: Uuid,
    /// The member's full name.
    pub name: String,
    /// The member's student identification number, unique across members.
    pub nim: String,
    /// The member's email address.
    pub email: String,
    /// The member's phone number.
    pub phone: Option<String>,
    /// The enrollment batch (year).
    pub batch: String,
    /// The member's study program.
    pub major: Option<String>,
    /// The member's photo URL.
    pub photo: Option<String>,
    /// A short biography.
    pub bio: Option<String>,
    /// The day the member joined.
    pub join_date: NaiveDate,
    /// The membership state.
    pub status: MemberStatus,
    /// Social media handles, keyed by platform.
    pub social_media: Option<serde_json::Value>,
    /// The timestamp when the member was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the member was last updated.
    pub updated_at: DateTime<Utc>,
}

impl From<&Row> for Member {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            name: row.get("name"),
            nim: row.get("nim"),
            email: row.get("email"),
            phone: row.get("phone"),
            batch: row.get("batch"),
            major: row.get("major"),
            photo: row.get("photo"),
            bio: row.get("bio"),
            join_date: row.get("join_date"),
            status: row.get("status"),
            social_media: row.get("social_media"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

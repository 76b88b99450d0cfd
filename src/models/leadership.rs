use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// A leadership record for one organizational period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leadership {
    /// The unique identifier for the record.
    pub id: Uuid,
    /// The office holder's name.
    pub name: String,
    /// The position held (chairperson, secretary, ...).
    pub position: String,
    /// The division the position belongs to.
    pub division: String,
    /// The office holder's photo URL.
    pub photo: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// The office holder's student identification number.
    pub nim: Option<String>,
    /// The enrollment batch (year).
    pub batch: Option<String>,
    /// A short biography.
    pub bio: Option<String>,
    /// Social media handles, keyed by platform.
    pub social_media: Option<serde_json::Value>,
    /// The first day of the period.
    pub period_start: NaiveDate,
    /// The last day of the period.
    pub period_end: NaiveDate,
    /// Position in the public roster, ascending.
    pub display_order: i32,
    /// The timestamp when the record was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl From<&Row> for Leadership {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            name: row.get("name"),
            position: row.get("position"),
            division: row.get("division"),
            photo: row.get("photo"),
            email: row.get("email"),
            phone: row.get("phone"),
            nim: row.get("nim"),
            batch: row.get("batch"),
            bio: row.get("bio"),
            social_media: row.get("social_media"),
            period_start: row.get("period_start"),
            period_end: row.get("period_end"),
            display_order: row.get("display_order"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

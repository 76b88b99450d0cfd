use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The lifecycle state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "event_status")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[postgres(name = "upcoming")]
    Upcoming,
    #[postgres(name = "ongoing")]
    Ongoing,
    #[postgres(name = "completed")]
    Completed,
    #[postgres(name = "cancelled")]
    Cancelled,
}

/// An organization event or activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// The unique identifier for the event.
    pub id: Uuid,
    /// The event's title.
    pub title: String,
    /// The event's URL slug, unique across events.
    pub slug: String,
    /// The event description, in Markdown.
    pub description: String,
    /// The cover image URL.
    pub cover_image: Option<String>,
    /// Where the event takes place.
    pub location: String,
    /// The event's category (seminar, workshop, ...).
    pub category: Option<String>,
    /// The day the event takes place.
    pub event_date: NaiveDate,
    /// The start time, if scheduled.
    pub start_time: Option<NaiveTime>,
    /// The end time, if scheduled.
    pub end_time: Option<NaiveTime>,
    /// An external registration link.
    pub registration_link: Option<String>,
    /// The lifecycle state.
    pub status: EventStatus,
    /// The participant cap, if any.
    pub max_participants: Option<i32>,
    /// The number of registered participants.
    pub current_participants: i32,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// The ID of the creating profile.
    pub created_by: Uuid,
    /// The timestamp when the event was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the event was last updated.
    pub updated_at: DateTime<Utc>,
}

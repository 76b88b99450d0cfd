use chrono::{NaiveDate, NaiveTime};
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::event::{Event, EventStatus},
};

/// Columns selected for event listings and lookups.
pub const EVENT_COLUMNS: &str = "id, title, slug, description, cover_image, location, \
     category, event_date, start_time, end_time, registration_link, status, \
     max_participants, current_participants, tags, created_by, created_at, updated_at";

/// A helper function to map a `tokio_postgres::Row` to an `Event`.
pub fn map_row(row: &Row) -> Result<Event> {
    Ok(Event {
        id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
        title: row.try_get("title").map_err(|_| AppError::MissingData("title".to_string()))?,
        slug: row.try_get("slug").map_err(|_| AppError::MissingData("slug".to_string()))?,
        description: row.try_get("description").map_err(|_| AppError::MissingData("description".to_string()))?,
        cover_image: row.try_get("cover_image").map_err(|_| AppError::MissingData("cover_image".to_string()))?,
        location: row.try_get("location").map_err(|_| AppError::MissingData("location".to_string()))?,
        category: row.try_get("category").map_err(|_| AppError::MissingData("category".to_string()))?,
        event_date: row.try_get("event_date").map_err(|_| AppError::MissingData("event_date".to_string()))?,
        start_time: row.try_get("start_time").map_err(|_| AppError::MissingData("start_time".to_string()))?,
        end_time: row.try_get("end_time").map_err(|_| AppError::MissingData("end_time".to_string()))?,
        registration_link: row.try_get("registration_link").map_err(|_| AppError::MissingData("registration_link".to_string()))?,
        status: row.try_get("status").map_err(|_| AppError::MissingData("status".to_string()))?,
        max_participants: row.try_get("max_participants").map_err(|_| AppError::MissingData("max_participants".to_string()))?,
        current_participants: row.try_get("current_participants").map_err(|_| AppError::MissingData("current_participants".to_string()))?,
        tags: row.try_get("tags").map_err(|_| AppError::MissingData("tags".to_string()))?,
        created_by: row.try_get("created_by").map_err(|_| AppError::MissingData("created_by".to_string()))?,
        created_at: row.try_get("created_at").map_err(|_| AppError::MissingData("created_at".to_string()))?,
        updated_at: row.try_get("updated_at").map_err(|_| AppError::MissingData("updated_at".to_string()))?,
    })
}

/// Creates a new event.
#[allow(clippy::too_many_arguments)]
pub async fn create_event(
    pool: &Pool,
    title: &str,
    slug: &str,
    description: &str,
    cover_image: Option<&str>,
    location: &str,
    category: Option<&str>,
    event_date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    registration_link: Option<&str>,
    status: EventStatus,
    max_participants: Option<i32>,
    tags: &[String],
    created_by: Uuid,
) -> Result<Event> {
    let client = pool.get().await?;
    let sql = format!(
        r#"
        INSERT INTO events
            (title, slug, description, cover_image, location, category,
             event_date, start_time, end_time, registration_link, status,
             max_participants, tags, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING {EVENT_COLUMNS}
        "#
    );
    let row = client
        .query_one(
            sql.as_str(),
            &[
                &title,
                &slug,
                &description,
                &cover_image,
                &location,
                &category,
                &event_date,
                &start_time,
                &end_time,
                &registration_link,
                &status,
                &max_participants,
                &tags,
                &created_by,
            ],
        )
        .await?;
    map_row(&row)
}

/// Updates an event.
#[allow(clippy::too_many_arguments)]
pub async fn update_event(
    pool: &Pool,
    id: Uuid,
    title: &str,
    slug: &str,
    description: &str,
    cover_image: Option<&str>,
    location: &str,
    category: Option<&str>,
    event_date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    registration_link: Option<&str>,
    status: EventStatus,
    max_participants: Option<i32>,
    tags: &[String],
) -> Result<Event> {
    let client = pool.get().await?;
    let sql = format!(
        r#"
        UPDATE events
        SET title = $1, slug = $2, description = $3, cover_image = $4,
            location = $5, category = $6, event_date = $7, start_time = $8,
            end_time = $9, registration_link = $10, status = $11,
            max_participants = $12, tags = $13
        WHERE id = $14
        RETURNING {EVENT_COLUMNS}
        "#
    );
    let row = client
        .query_opt(
            sql.as_str(),
            &[
                &title,
                &slug,
                &description,
                &cover_image,
                &location,
                &category,
                &event_date,
                &start_time,
                &end_time,
                &registration_link,
                &status,
                &max_participants,
                &tags,
                &id,
            ],
        )
        .await?
        .ok_or(AppError::NotFound)?;
    map_row(&row)
}

/// Finds an event by its ID.
pub async fn find_by_id(pool: &Pool, id: Uuid) -> Result<Option<Event>> {
    let client = pool.get().await?;
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
    let row = client.query_opt(sql.as_str(), &[&id]).await?;
    row.map(|r| map_row(&r)).transpose()
}

/// Finds an event by its slug.
pub async fn find_by_slug(pool: &Pool, slug: &str) -> Result<Option<Event>> {
    let client = pool.get().await?;
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE slug = $1");
    let row = client.query_opt(sql.as_str(), &[&slug]).await?;
    row.map(|r| map_row(&r)).transpose()
}

/// Deletes an event.
pub async fn delete_event(pool: &Pool, id: Uuid) -> Result<()> {
    let client = pool.get().await?;
    let deleted = client
        .execute("DELETE FROM events WHERE id = $1", &[&id])
        .await?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

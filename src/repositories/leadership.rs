use chrono::NaiveDate;
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::leadership::Leadership,
};

/// Columns selected for leadership listings and lookups.
pub const LEADERSHIP_COLUMNS: &str = "id, name, position, division, photo, email, phone, \
     nim, batch, bio, social_media, period_start, period_end, display_order, \
     created_at, updated_at";

/// Maps a listing row onto a `Leadership` record.
pub fn map_row(row: &Row) -> Result<Leadership> {
    Ok(Leadership::from(row))
}

/// Creates a new leadership record.
#[allow(clippy::too_many_arguments)]
pub async fn create_leadership(
    pool: &Pool,
    name: &str,
    position: &str,
    division: &str,
    photo: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
    nim: Option<&str>,
    batch: Option<&str>,
    bio: Option<&str>,
    social_media: Option<&serde_json::Value>,
    period_start: NaiveDate,
    period_end: NaiveDate,
    display_order: i32,
) -> Result<Leadership> {
    let client = pool.get().await?;
    let sql = format!(
        r#"
        INSERT INTO leadership
            (name, position, division, photo, email, phone, nim, batch, bio,
             social_media, period_start, period_end, display_order)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {LEADERSHIP_COLUMNS}
        "#
    );
    let row = client
        .query_one(
            sql.as_str(),
            &[
                &name,
                &position,
                &division,
                &photo,
                &email,
                &phone,
                &nim,
                &batch,
                &bio,
                &social_media,
                &period_start,
                &period_end,
                &display_order,
            ],
        )
        .await?;
    Ok(Leadership::from(&row))
}

/// Updates a leadership record.
#[allow(clippy::too_many_arguments)]
pub async fn update_leadership(
    pool: &Pool,
    id: Uuid,
    name: &str,
    position: &str,
    division: &str,
    photo: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
    nim: Option<&str>,
    batch: Option<&str>,
    bio: Option<&str>,
    social_media: Option<&serde_json::Value>,
    period_start: NaiveDate,
    period_end: NaiveDate,
    display_order: i32,
) -> Result<Leadership> {
    let client = pool.get().await?;
    let sql = format!(
        r#"
        UPDATE leadership
        SET name = $1, position = $2, division = $3, photo = $4, email = $5,
            phone = $6, nim = $7, batch = $8, bio = $9, social_media = $10,
            period_start = $11, period_end = $12, display_order = $13
        WHERE id = $14
        RETURNING {LEADERSHIP_COLUMNS}
        "#
    );
    let row = client
        .query_opt(
            sql.as_str(),
            &[
                &name,
                &position,
                &division,
                &photo,
                &email,
                &phone,
                &nim,
                &batch,
                &bio,
                &social_media,
                &period_start,
                &period_end,
                &display_order,
                &id,
            ],
        )
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Leadership::from(&row))
}

/// Finds a leadership record by its ID.
pub async fn find_by_id(pool: &Pool, id: Uuid) -> Result<Option<Leadership>> {
    let client = pool.get().await?;
    let sql = format!("SELECT {LEADERSHIP_COLUMNS} FROM leadership WHERE id = $1");
    let row = client.query_opt(sql.as_str(), &[&id]).await?;
    Ok(row.map(|r| Leadership::from(&r)))
}

/// Deletes a leadership record.
pub async fn delete_leadership(pool: &Pool, id: Uuid) -> Result<()> {
    let client = pool.get().await?;
    let deleted = client
        .execute("DELETE FROM leadership WHERE id = $1", &[&id])
        .await?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

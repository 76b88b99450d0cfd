use chrono::NaiveDate;
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::member::{Member, MemberStatus},
};

/// Columns selected for member listings and lookups.
pub const MEMBER_COLUMNS: &str = "id, name, nim, email, phone, batch, major, photo, bio, \
     join_date, status, social_media, created_at, updated_at";

/// Maps a listing row onto a `Member`.
pub fn map_row(row: &Row) -> Result<Member> {
    Ok(Member::from(row))
}

/// Creates a new member.
#[allow(clippy::too_many_arguments)]
pub async fn create_member(
    pool: &Pool,
    name: &str,
    nim: &str,
    email: &str,
    phone: Option<&str>,
    batch: &str,
    major: Option<&str>,
    photo: Option<&str>,
    bio: Option<&str>,
    join_date: NaiveDate,
    status: MemberStatus,
    social_media: Option<&serde_json::Value>,
) -> Result<Member> {
    let client = pool.get().await?;
    let sql = format!(
        r#"
        INSERT INTO members
            (name, nim, email, phone, batch, major, photo, bio, join_date,
             status, social_media)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {MEMBER_COLUMNS}
        "#
    );
    let row = client
        .query_one(
            sql.as_str(),
            &[
                &name,
                &nim,
                &email,
                &phone,
                &batch,
                &major,
                &photo,
                &bio,
                &join_date,
                &status,
                &social_media,
            ],
        )
        .await?;
    Ok(Member::from(&row))
}

/// Updates a member.
#[allow(clippy::too_many_arguments)]
pub async fn update_member(
    pool: &Pool,
    id: Uuid,
    name: &str,
    nim: &str,
    email: &str,
    phone: Option<&str>,
    batch: &str,
    major: Option<&str>,
    photo: Option<&str>,
    bio: Option<&str>,
    join_date: NaiveDate,
    status: MemberStatus,
    social_media: Option<&serde_json::Value>,
) -> Result<Member> {
    let client = pool.get().await?;
    let sql = format!(
        r#"
        UPDATE members
        SET name = $1, nim = $2, email = $3, phone = $4, batch = $5,
            major = $6, photo = $7, bio = $8, join_date = $9, status = $10,
            social_media = $11
        WHERE id = $12
        RETURNING {MEMBER_COLUMNS}
        "#
    );
    let row = client
        .query_opt(
            sql.as_str(),
            &[
                &name,
                &nim,
                &email,
                &phone,
                &batch,
                &major,
                &photo,
                &bio,
                &join_date,
                &status,
                &social_media,
                &id,
            ],
        )
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Member::from(&row))
}

/// Finds a member by its ID.
pub async fn find_by_id(pool: &Pool, id: Uuid) -> Result<Option<Member>> {
    let client = pool.get().await?;
    let sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1");
    let row = client.query_opt(sql.as_str(), &[&id]).await?;
    Ok(row.map(|r| Member::from(&r)))
}

/// Deletes a member.
pub async fn delete_member(pool: &Pool, id: Uuid) -> Result<()> {
    let client = pool.get().await?;
    let deleted = client
        .execute("DELETE FROM members WHERE id = $1", &[&id])
        .await?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

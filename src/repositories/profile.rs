use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::profile::{Account, Profile, Role},
};

/// A helper function to map a `tokio_postgres::Row` to a `Profile`.
fn row_to_profile(row: &Row) -> Result<Profile> {
    Ok(Profile {
        id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
        email: row.try_get("email").map_err(|_| AppError::MissingData("email".to_string()))?,
        full_name: row.try_get("full_name").map_err(|_| AppError::MissingData("full_name".to_string()))?,
        role: row.try_get("role").map_err(|_| AppError::MissingData("role".to_string()))?,
        avatar_url: row.try_get("avatar_url").map_err(|_| AppError::MissingData("avatar_url".to_string()))?,
        created_at: row.try_get("created_at").map_err(|_| AppError::MissingData("created_at".to_string()))?,
        updated_at: row.try_get("updated_at").map_err(|_| AppError::MissingData("updated_at".to_string()))?,
    })
}

fn row_to_account(row: &Row) -> Result<Account> {
    Ok(Account {
        id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
        email: row.try_get("email").map_err(|_| AppError::MissingData("email".to_string()))?,
        password: row.try_get("password").map_err(|_| AppError::MissingData("password".to_string()))?,
        is_active: row.try_get("is_active").map_err(|_| AppError::MissingData("is_active".to_string()))?,
        created_at: row.try_get("created_at").map_err(|_| AppError::MissingData("created_at".to_string()))?,
    })
}

/// Columns selected for profile listings and lookups.
pub const PROFILE_COLUMNS: &str =
    "id, email, full_name, role, avatar_url, created_at, updated_at";

/// Maps a listing row onto a `Profile`.
pub fn map_row(row: &Row) -> Result<Profile> {
    row_to_profile(row)
}

/// Finds a profile by its ID.
pub async fn find_by_id(pool: &Pool, user_id: &Uuid) -> Result<Option<Profile>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, email, full_name, role, avatar_url, created_at, updated_at
            FROM profiles
            WHERE id = $1
            "#,
            &[user_id],
        )
        .await?;
    row.map(|r| row_to_profile(&r)).transpose()
}

/// Finds an active account by its email address.
pub async fn find_account_by_email(pool: &Pool, email: &str) -> Result<Option<Account>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, email, password, is_active, created_at
            FROM accounts
            WHERE email = $1 AND is_active = true
            "#,
            &[&email],
        )
        .await?;
    row.map(|r| row_to_account(&r)).transpose()
}

/// Finds an account by its ID.
pub async fn find_account_by_id(pool: &Pool, user_id: &Uuid) -> Result<Option<Account>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, email, password, is_active, created_at
            FROM accounts
            WHERE id = $1
            "#,
            &[user_id],
        )
        .await?;
    row.map(|r| row_to_account(&r)).transpose()
}

/// Creates a new account. The matching profile row is created by the
/// `account_profile` trigger.
pub async fn create_account(pool: &Pool, email: &str, password_hash: &str) -> Result<Uuid> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            INSERT INTO accounts (email, password)
            VALUES ($1, $2)
            RETURNING id
            "#,
            &[&email, &password_hash],
        )
        .await?;
    row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))
}

/// Updates an account's password hash.
pub async fn update_password(pool: &Pool, user_id: &Uuid, password_hash: &str) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            UPDATE accounts
            SET password = $1
            WHERE id = $2
            "#,
            &[&password_hash, user_id],
        )
        .await?;
    Ok(())
}

/// Updates a profile's display fields and role.
pub async fn update_profile(
    pool: &Pool,
    user_id: &Uuid,
    full_name: Option<&str>,
    role: Role,
    avatar_url: Option<&str>,
) -> Result<Profile> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            UPDATE profiles
            SET full_name = $1, role = $2, avatar_url = $3
            WHERE id = $4
            RETURNING id, email, full_name, role, avatar_url, created_at, updated_at
            "#,
            &[&full_name, &role, &avatar_url, user_id],
        )
        .await?
        .ok_or(AppError::NotFound)?;
    row_to_profile(&row)
}

/// Deletes an account; the profile row follows via `ON DELETE CASCADE`.
pub async fn delete_account(pool: &Pool, user_id: &Uuid) -> Result<()> {
    let client = pool.get().await?;
    let deleted = client
        .execute("DELETE FROM accounts WHERE id = $1", &[user_id])
        .await?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

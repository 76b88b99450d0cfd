use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::article::{Article, ArticleStatus},
};

/// Columns selected for article listings and lookups.
pub const ARTICLE_COLUMNS: &str = "id, title, slug, excerpt, content, cover_image, \
     author_id, category, tags, status, published_at, created_at, updated_at";

/// A helper function to map a `tokio_postgres::Row` to an `Article`.
pub fn map_row(row: &Row) -> Result<Article> {
    Ok(Article {
        id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
        title: row.try_get("title").map_err(|_| AppError::MissingData("title".to_string()))?,
        slug: row.try_get("slug").map_err(|_| AppError::MissingData("slug".to_string()))?,
        excerpt: row.try_get("excerpt").map_err(|_| AppError::MissingData("excerpt".to_string()))?,
        content: row.try_get("content").map_err(|_| AppError::MissingData("content".to_string()))?,
        cover_image: row.try_get("cover_image").map_err(|_| AppError::MissingData("cover_image".to_string()))?,
        author_id: row.try_get("author_id").map_err(|_| AppError::MissingData("author_id".to_string()))?,
        category: row.try_get("category").map_err(|_| AppError::MissingData("category".to_string()))?,
        tags: row.try_get("tags").map_err(|_| AppError::MissingData("tags".to_string()))?,
        status: row.try_get("status").map_err(|_| AppError::MissingData("status".to_string()))?,
        published_at: row.try_get("published_at").map_err(|_| AppError::MissingData("published_at".to_string()))?,
        created_at: row.try_get("created_at").map_err(|_| AppError::MissingData("created_at".to_string()))?,
        updated_at: row.try_get("updated_at").map_err(|_| AppError::MissingData("updated_at".to_string()))?,
    })
}

/// Creates a new article.
#[allow(clippy::too_many_arguments)]
pub async fn create_article(
    pool: &Pool,
    title: &str,
    slug: &str,
    excerpt: Option<&str>,
    content: &str,
    cover_image: Option<&str>,
    author_id: Uuid,
    category: Option<&str>,
    tags: &[String],
    status: ArticleStatus,
    published_at: Option<DateTime<Utc>>,
) -> Result<Article> {
    let client = pool.get().await?;
    let sql = format!(
        r#"
        INSERT INTO articles
            (title, slug, excerpt, content, cover_image, author_id,
             category, tags, status, published_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {ARTICLE_COLUMNS}
        "#
    );
    let row = client
        .query_one(
            sql.as_str(),
            &[
                &title,
                &slug,
                &excerpt,
                &content,
                &cover_image,
                &author_id,
                &category,
                &tags,
                &status,
                &published_at,
            ],
        )
        .await?;
    map_row(&row)
}

/// Updates an article.
#[allow(clippy::too_many_arguments)]
pub async fn update_article(
    pool: &Pool,
    id: Uuid,
    title: &str,
    slug: &str,
    excerpt: Option<&str>,
    content: &str,
    cover_image: Option<&str>,
    category: Option<&str>,
    tags: &[String],
    status: ArticleStatus,
    published_at: Option<DateTime<Utc>>,
) -> Result<Article> {
    let client = pool.get().await?;
    let sql = format!(
        r#"
        UPDATE articles
        SET title = $1, slug = $2, excerpt = $3, content = $4,
            cover_image = $5, category = $6, tags = $7, status = $8,
            published_at = $9
        WHERE id = $10
        RETURNING {ARTICLE_COLUMNS}
        "#
    );
    let row = client
        .query_opt(
            sql.as_str(),
            &[
                &title,
                &slug,
                &excerpt,
                &content,
                &cover_image,
                &category,
                &tags,
                &status,
                &published_at,
                &id,
            ],
        )
        .await?
        .ok_or(AppError::NotFound)?;
    map_row(&row)
}

/// Finds an article by its ID.
pub async fn find_by_id(pool: &Pool, id: Uuid) -> Result<Option<Article>> {
    let client = pool.get().await?;
    let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
    let row = client.query_opt(sql.as_str(), &[&id]).await?;
    row.map(|r| map_row(&r)).transpose()
}

/// Finds a published article by its slug.
pub async fn find_published_by_slug(pool: &Pool, slug: &str) -> Result<Option<Article>> {
    let client = pool.get().await?;
    let sql = format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles \
         WHERE slug = $1 AND status = 'published'"
    );
    let row = client.query_opt(sql.as_str(), &[&slug]).await?;
    row.map(|r| map_row(&r)).transpose()
}

/// Deletes an article.
pub async fn delete_article(pool: &Pool, id: Uuid) -> Result<()> {
    let client = pool.get().await?;
    let deleted = client
        .execute("DELETE FROM articles WHERE id = $1", &[&id])
        .await?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

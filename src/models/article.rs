use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The publication state of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "article_status")]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    #[postgres(name = "draft")]
    Draft,
    #[postgres(name = "published")]
    Published,
}

/// An article, shown on the public site when published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// The unique identifier for the article.
    pub id: Uuid,
    /// The article's title.
    pub title: String,
    /// The article's URL slug, unique across articles.
    pub slug: String,
    /// A short plain-text preview.
    pub excerpt: Option<String>,
    /// The article body, in Markdown.
    pub content: String,
    /// The cover image URL.
    pub cover_image: Option<String>,
    /// The ID of the authoring profile.
    pub author_id: Uuid,
    /// The article's category.
    pub category: Option<String>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// The publication state.
    pub status: ArticleStatus,
    /// When the article was published, if it ever was.
    pub published_at: Option<DateTime<Utc>>,
    /// The timestamp when the article was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the article was last updated.
    pub updated_at: DateTime<Utc>,
}

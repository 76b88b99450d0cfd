//! Scrapes articles from the organization's legacy WordPress blog and emits
//! idempotent SQL insert statements for the articles table.
//!
//! Usage: `scrape-articles [output.sql]` (default `db/seed-articles.sql`).

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use regex::Regex;
use scraper::{Html, Selector};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Category listing pages to crawl.
const CATEGORY_URLS: &[&str] = &[
    "https://kemafar.org/category/news/",
    "https://kemafar.org/category/uncategorized/",
];

/// Pagination stops after this many listing pages per category.
const MAX_PAGES: u32 = 10;
/// Delay between listing page fetches.
const PAGE_DELAY: Duration = Duration::from_millis(500);
/// Delay between article fetches.
const ARTICLE_DELAY: Duration = Duration::from_secs(1);
/// Content shorter than this is considered a selector miss.
const MIN_CONTENT_LEN: usize = 200;
/// Excerpts are truncated to this many characters of plain text.
const EXCERPT_LEN: usize = 200;

/// Cover image used when an article has none.
const DEFAULT_COVER_IMAGE: &str =
    "https://images.unsplash.com/photo-1576091160399-112ba8d25d1d?w=800";

/// Content selectors tried in order of specificity.
const CONTENT_SELECTORS: &[&str] = &[
    ".bs-blog-post .entry-content",
    ".entry-content",
    ".post-content",
    ".bs-blog-post",
    "article.post",
    "article",
];

#[derive(Debug)]
struct ArticleLink {
    title: String,
    url: String,
}

#[derive(Debug)]
struct ScrapedArticle {
    title: String,
    slug: String,
    excerpt: String,
    content: String,
    category: &'static str,
    published_at: String,
    cover_image: String,
    tags: &'static [&'static str],
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {url}"))?;
    if !response.status().is_success() {
        bail!("Failed to fetch {}: {}", url, response.status());
    }
    response.text().await.context("Failed to read response body")
}

/// Derives a URL slug from a title.
fn create_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_was_hyphen = false;
        } else if c.is_whitespace() || c == '-' {
            if !last_was_hyphen {
                slug.push('-');
                last_was_hyphen = true;
            }
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Maps a WordPress category path onto the site's category set.
fn map_category(category_url: &str) -> &'static str {
    if category_url.contains("/news/") {
        "info"
    } else if category_url.contains("/esai/") {
        "opinion"
    } else if category_url.contains("/publication/") {
        "publication"
    } else {
        "post"
    }
}

/// Extracts article links from a category listing page.
fn scrape_article_list(html: &str) -> Vec<ArticleLink> {
    let doc = Html::parse_document(html);
    let link_sel = selector(r#"h4 a[href*="kemafar.org"]"#);

    let mut articles = Vec::new();
    for link in doc.select(&link_sel) {
        let title = link.text().collect::<String>().trim().to_string();
        let url = link.value().attr("href").unwrap_or("").to_string();

        // only dated article permalinks, not category or tag pages
        if !title.is_empty() && url.contains("kemafar.org/20") {
            articles.push(ArticleLink { title, url });
        }
    }
    articles
}

/// Strips script/style/navigation chrome from an HTML fragment before the
/// Markdown conversion.
fn strip_chrome(html: &str) -> String {
    let blocks = Regex::new(
        r"(?is)<(script|style|iframe|header|footer|nav|form)\b.*?</(script|style|iframe|header|footer|nav|form)>",
    )
    .expect("static regex");
    let comments = Regex::new(r"(?s)<!--.*?-->").expect("static regex");
    let cleaned = blocks.replace_all(html, "");
    comments.replace_all(&cleaned, "").into_owned()
}

/// Derives a plain-text excerpt from Markdown content.
fn excerpt_from_markdown(markdown: &str) -> String {
    let plain: String = markdown
        .chars()
        .filter(|c| !matches!(c, '#' | '*' | '`' | '[' | ']'))
        .collect();
    let plain = plain.split_whitespace().collect::<Vec<_>>().join(" ");

    if plain.is_empty() {
        return "No excerpt available...".to_string();
    }
    if plain.chars().count() > EXCERPT_LEN {
        let cut: String = plain.chars().take(EXCERPT_LEN).collect();
        format!("{}...", cut.trim_end())
    } else {
        plain
    }
}

/// Extracts content (as Markdown), an excerpt, and a cover image from an
/// article page.
fn scrape_article_content(html: &str) -> (String, String, String) {
    let doc = Html::parse_document(html);

    let mut content_html = String::new();
    for css in CONTENT_SELECTORS {
        if let Some(element) = doc.select(&selector(css)).next() {
            let cleaned = strip_chrome(&element.inner_html());
            if cleaned.len() > MIN_CONTENT_LEN {
                tracing::debug!("Found content using selector: {}", css);
                content_html = cleaned;
                break;
            }
        }
    }

    // fall back to concatenating paragraphs when no selector matched
    if content_html.len() < MIN_CONTENT_LEN {
        let paragraph_sel = selector("article p, .post p, .entry p");
        let paragraphs: Vec<String> = doc
            .select(&paragraph_sel)
            .map(|p| format!("<p>{}</p>", p.inner_html()))
            .collect();
        if !paragraphs.is_empty() {
            tracing::debug!("Fallback: extracted {} paragraphs", paragraphs.len());
            content_html = strip_chrome(&paragraphs.join(""));
        }
    }

    let newlines = Regex::new(r"\n{3,}").expect("static regex");
    let content = if content_html.is_empty() {
        String::new()
    } else {
        newlines
            .replace_all(html2md::parse_html(&content_html).trim(), "\n\n")
            .into_owned()
    };

    let excerpt = excerpt_from_markdown(&content);

    let image = doc
        .select(&selector(r#"meta[property="og:image"]"#))
        .next()
        .and_then(|m| m.value().attr("content"))
        .or_else(|| {
            doc.select(&selector(".wp-post-image"))
                .next()
                .and_then(|img| img.value().attr("src"))
        })
        .or_else(|| {
            doc.select(&selector(".entry-content img, .post-thumbnail img"))
                .next()
                .and_then(|img| img.value().attr("src"))
        })
        .unwrap_or(DEFAULT_COVER_IMAGE)
        .to_string();

    (content, excerpt, image)
}

/// Derives the publish date from the `/YYYY/MM/DD/` permalink segment.
fn date_from_url(url: &str) -> Option<String> {
    let re = Regex::new(r"/(\d{4})/(\d{2})/(\d{2})/").expect("static regex");
    let caps = re.captures(url)?;
    let date = chrono::NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().to_rfc3339())
}

async fn scrape_category(
    client: &reqwest::Client,
    category_url: &str,
) -> Result<Vec<ScrapedArticle>> {
    let mut links: Vec<ArticleLink> = Vec::new();

    let mut page = 1;
    while page <= MAX_PAGES {
        let page_url = if page == 1 {
            category_url.to_string()
        } else {
            format!("{category_url}page/{page}/")
        };
        tracing::info!("Scraping page {}: {}", page, page_url);

        match fetch_page(client, &page_url).await {
            Ok(html) => {
                let found = scrape_article_list(&html);
                if found.is_empty() {
                    break;
                }
                tracing::info!("Found {} articles", found.len());
                links.extend(found);
                page += 1;
                tokio::time::sleep(PAGE_DELAY).await;
            }
            Err(e) => {
                // a 404 means no more pages
                tracing::info!("Page {} not available, stopping pagination: {}", page, e);
                break;
            }
        }
    }

    tracing::info!("Total found in {}: {} articles", category_url, links.len());

    let mut articles = Vec::new();
    for link in links {
        match fetch_page(client, &link.url).await {
            Ok(html) => {
                let (content, excerpt, cover_image) = scrape_article_content(&html);
                let published_at =
                    date_from_url(&link.url).unwrap_or_else(|| Utc::now().to_rfc3339());

                tracing::info!("✓ Scraped: {}", link.title);
                articles.push(ScrapedArticle {
                    slug: create_slug(&link.title),
                    title: link.title,
                    excerpt,
                    content,
                    category: map_category(category_url),
                    published_at,
                    cover_image,
                    tags: &["KEMAFAR", "Farmasi", "UIN Alauddin"],
                });
            }
            Err(e) => {
                tracing::error!("Failed to scrape {}: {}", link.url, e);
            }
        }
        tokio::time::sleep(ARTICLE_DELAY).await;
    }

    Ok(articles)
}

/// Doubles single quotes for SQL string literals.
fn escape_sql(value: &str) -> String {
    value.replace('\'', "''")
}

/// Renders one idempotent insert statement per article.
fn generate_sql_inserts(articles: &[ScrapedArticle]) -> String {
    let mut sql = format!(
        "-- =============================================\n\
         -- ARTICLES FROM KEMAFAR.ORG\n\
         -- Auto-generated seed data\n\
         -- Total: {} articles\n\
         -- =============================================\n\n",
        articles.len(),
    );

    for (index, article) in articles.iter().enumerate() {
        let tags = article
            .tags
            .iter()
            .map(|t| format!("'{}'", escape_sql(t)))
            .collect::<Vec<_>>()
            .join(", ");

        sql.push_str(&format!(
            "-- Article {}: {}\n\
             INSERT INTO articles (title, slug, excerpt, content, category, status, cover_image, published_at, author_id, tags)\n\
             VALUES (\n  '{}',\n  '{}',\n  '{}',\n  '{}',\n  '{}',\n  'published',\n  '{}',\n  '{}',\n  (SELECT id FROM profiles WHERE role = 'super_admin' ORDER BY created_at LIMIT 1),\n  ARRAY[{}]\n)\n\
             ON CONFLICT (slug) DO NOTHING;\n\n",
            index + 1,
            article.title,
            escape_sql(&article.title),
            article.slug,
            escape_sql(&article.excerpt),
            escape_sql(&article.content),
            article.category,
            escape_sql(&article.cover_image),
            article.published_at,
            tags,
        ));
    }

    sql
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "db/seed-articles.sql".to_string());

    tracing::info!("🚀 Starting article scraper...");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("atrium-scraper/0.1")
        .build()
        .context("Failed to build HTTP client")?;

    let mut articles = Vec::new();
    for category_url in CATEGORY_URLS {
        match scrape_category(&client, category_url).await {
            Ok(found) => articles.extend(found),
            Err(e) => tracing::error!("Failed to scrape category {}: {}", category_url, e),
        }
    }

    tracing::info!("✅ Successfully scraped {} articles", articles.len());

    let sql = generate_sql_inserts(&articles);
    tokio::fs::write(&output_path, sql)
        .await
        .with_context(|| format!("Failed to write {output_path}"))?;

    tracing::info!("📝 SQL seed file saved to: {}", output_path);
    tracing::info!(
        "📊 Summary: {} articles across {} categories",
        articles.len(),
        CATEGORY_URLS.len(),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_lowercase_hyphenated() {
        assert_eq!(
            create_slug("Pengabdian Masyarakat 2026!"),
            "pengabdian-masyarakat-2026"
        );
        assert_eq!(create_slug("  Multiple   Spaces  "), "multiple-spaces");
        assert_eq!(create_slug("Already-Hyphenated"), "already-hyphenated");
    }

    #[test]
    fn categories_map_onto_site_set() {
        assert_eq!(map_category("https://kemafar.org/category/news/"), "info");
        assert_eq!(map_category("https://kemafar.org/category/esai/"), "opinion");
        assert_eq!(
            map_category("https://kemafar.org/category/uncategorized/"),
            "post"
        );
    }

    #[test]
    fn excerpt_is_truncated_plain_text() {
        let markdown = format!("# Title\n\n{}", "word ".repeat(100));
        let excerpt = excerpt_from_markdown(&markdown);
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.chars().count() <= EXCERPT_LEN + 3);
        assert!(!excerpt.contains('#'));

        assert_eq!(excerpt_from_markdown("short text"), "short text");
        assert_eq!(excerpt_from_markdown(""), "No excerpt available...");
    }

    #[test]
    fn permalink_dates_are_extracted() {
        assert_eq!(
            date_from_url("https://kemafar.org/2024/03/15/some-article/"),
            Some("2024-03-15T00:00:00+00:00".to_string()),
        );
        assert_eq!(date_from_url("https://kemafar.org/about/"), None);
    }

    #[test]
    fn article_links_are_filtered_to_dated_permalinks() {
        let html = r#"
            <div class="post">
              <h4><a href="https://kemafar.org/2024/03/15/seminar-nasional/">Seminar Nasional</a></h4>
            </div>
            <div class="post">
              <h4><a href="https://kemafar.org/category/news/">News</a></h4>
            </div>
        "#;
        let links = scrape_article_list(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].title, "Seminar Nasional");
    }

    #[test]
    fn content_extraction_prefers_entry_content() {
        let body = "x".repeat(300);
        let html = format!(
            r#"<html><head><meta property="og:image" content="https://kemafar.org/cover.jpg"></head>
               <body><article class="post"><div class="entry-content">
               <script>var tracked = true;</script><p>{body}</p>
               </div></article></body></html>"#
        );
        let (content, excerpt, image) = scrape_article_content(&html);
        assert!(content.contains(&body));
        assert!(!content.contains("tracked"));
        assert!(excerpt.ends_with("..."));
        assert_eq!(image, "https://kemafar.org/cover.jpg");
    }

    #[test]
    fn sql_inserts_are_idempotent_and_escaped() {
        let articles = vec![ScrapedArticle {
            title: "It's a test".to_string(),
            slug: "its-a-test".to_string(),
            excerpt: "An excerpt".to_string(),
            content: "Some 'quoted' content".to_string(),
            category: "post",
            published_at: "2024-03-15T00:00:00+00:00".to_string(),
            cover_image: DEFAULT_COVER_IMAGE.to_string(),
            tags: &["KEMAFAR"],
        }];
        let sql = generate_sql_inserts(&articles);
        assert!(sql.contains("ON CONFLICT (slug) DO NOTHING"));
        assert!(sql.contains("It''s a test"));
        assert!(sql.contains("Some ''quoted'' content"));
        assert!(sql.contains("ARRAY['KEMAFAR']"));
    }
}

/// Slug shape shared by articles and events: lowercase alphanumeric runs
/// separated by single hyphens, as produced by the seeding scraper.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 300
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Garde adapter for [`is_valid_slug`].
pub fn valid_slug(value: &str, _context: &()) -> garde::Result {
    if is_valid_slug(value) {
        Ok(())
    } else {
        Err(garde::Error::new(
            "must be lowercase letters, digits, and single hyphens",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_scraper_style_slugs() {
        assert!(is_valid_slug("pengabdian-masyarakat-2026"));
        assert!(is_valid_slug("a"));
        assert!(is_valid_slug("123-456"));
    }

    #[test]
    fn rejects_malformed_slugs() {
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Hello-World"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("with space"));
        assert!(!is_valid_slug(&"a".repeat(301)));
    }
}

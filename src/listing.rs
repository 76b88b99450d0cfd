//! Generic search/filter/sort/paginate engine for the admin and public
//! listing endpoints.
//!
//! Each entity configures a [`ListQuery`] (table, selectable columns, which
//! columns are searchable, filterable, and sortable) and feeds it a
//! [`ListQueryState`] built from the request. The engine renders one
//! parameterized count query and one page query, clamps the requested page
//! into range, and returns a [`ListPage`] snapshot.

use std::collections::BTreeMap;

use deadpool_postgres::Pool;
use serde::Serialize;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use uuid::Uuid;

use crate::error::Result;

/// The default number of rows per listing page.
pub const ITEMS_PER_PAGE: i64 = 10;

/// The user-observable state of a listing: search text, active filters,
/// sort column and direction, and current page.
///
/// Invariant: changing the search text or any filter value resets the page
/// to 1, so a narrowed result set can never leave the view stranded on a
/// page that no longer exists. Sort changes keep the page.
#[derive(Debug, Clone, Default)]
pub struct ListQueryState {
    search: String,
    filters: BTreeMap<String, String>,
    sort: Option<(String, bool)>,
    page: u32,
}

impl ListQueryState {
    pub fn new() -> Self {
        Self {
            search: String::new(),
            filters: BTreeMap::new(),
            sort: None,
            page: 1,
        }
    }

    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    /// Sets the free-text search term. A changed term resets the page.
    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if search != self.search {
            self.search = search;
            self.page = 1;
        }
    }

    /// Sets or clears a filter. An empty value or the `all` sentinel clears
    /// the filter. A changed value resets the page.
    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let changed = if value.is_empty() || value == "all" {
            self.filters.remove(&key).is_some()
        } else if self.filters.get(&key) != Some(&value) {
            self.filters.insert(key, value);
            true
        } else {
            false
        };
        if changed {
            self.page = 1;
        }
    }

    /// Sets the sort column and direction. Does not reset the page.
    pub fn set_sort(&mut self, column: impl Into<String>, ascending: bool) {
        self.sort = Some((column.into(), ascending));
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }
}

/// One bounded slice of a larger result set, with exact count metadata.
/// Replaced wholesale on each fetch, never mutated in place.
#[derive(Debug, Clone, Serialize)]
pub struct ListPage<T> {
    pub rows: Vec<T>,
    pub total_count: i64,
    pub page_count: i64,
    pub page: u32,
}

/// A parameter bound into a rendered listing query.
enum BoundParam<'a> {
    Text(&'a str),
    Pattern(String),
    Id(Uuid),
}

impl BoundParam<'_> {
    fn as_sql(&self) -> &(dyn ToSql + Sync) {
        match self {
            BoundParam::Text(v) => v,
            BoundParam::Pattern(v) => v,
            BoundParam::Id(v) => v,
        }
    }
}

/// Per-table listing configuration.
pub struct ListQuery {
    table: &'static str,
    columns: &'static str,
    search_columns: &'static [&'static str],
    filter_columns: &'static [&'static str],
    sortable_columns: &'static [&'static str],
    default_sort: (&'static str, bool),
    per_page: i64,
    owner_column: Option<&'static str>,
    owner: Option<Uuid>,
    conditions: Vec<&'static str>,
}

impl ListQuery {
    pub fn new(table: &'static str, columns: &'static str) -> Self {
        Self {
            table,
            columns,
            search_columns: &[],
            filter_columns: &[],
            sortable_columns: &[],
            default_sort: ("created_at", false),
            per_page: ITEMS_PER_PAGE,
            owner_column: None,
            owner: None,
            conditions: Vec::new(),
        }
    }

    /// Columns matched by free-text search (case-insensitive substring,
    /// OR-combined).
    pub fn search_columns(mut self, columns: &'static [&'static str]) -> Self {
        self.search_columns = columns;
        self
    }

    /// Columns that accept equality filters. Filter keys outside this set
    /// are ignored.
    pub fn filter_columns(mut self, columns: &'static [&'static str]) -> Self {
        self.filter_columns = columns;
        self
    }

    /// Columns the caller may sort by. A sort request outside this set falls
    /// back to the default sort.
    pub fn sortable_columns(mut self, columns: &'static [&'static str]) -> Self {
        self.sortable_columns = columns;
        self
    }

    pub fn default_sort(mut self, column: &'static str, ascending: bool) -> Self {
        self.default_sort = (column, ascending);
        self
    }

    pub fn per_page(mut self, per_page: i64) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Declares the column holding the owning profile id.
    pub fn owner_column(mut self, column: &'static str) -> Self {
        self.owner_column = Some(column);
        self
    }

    /// Restricts results to records owned by the given identity. Only
    /// effective together with [`ListQuery::owner_column`].
    pub fn owned_by(mut self, owner: Option<Uuid>) -> Self {
        self.owner = owner;
        self
    }

    /// Appends a raw condition applied after the built-in filters, e.g.
    /// `status = 'published'` for public listings.
    pub fn condition(mut self, condition: &'static str) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Renders the page query, the count query, and their shared parameters.
    fn render<'a>(&'a self, state: &'a ListQueryState) -> (String, String, Vec<BoundParam<'a>>) {
        let mut where_parts: Vec<String> = Vec::new();
        let mut params: Vec<BoundParam<'a>> = Vec::new();

        for condition in &self.conditions {
            where_parts.push(format!("({})", condition));
        }

        if let (Some(column), Some(owner)) = (self.owner_column, self.owner) {
            params.push(BoundParam::Id(owner));
            where_parts.push(format!("{} = ${}", column, params.len()));
        }

        for column in self.filter_columns {
            if let Some(value) = state.filters.get(*column) {
                params.push(BoundParam::Text(value));
                // ::text so enum-typed columns compare against text params
                where_parts.push(format!("{}::text = ${}", column, params.len()));
            }
        }

        let search = state.search.trim();
        if !search.is_empty() && !self.search_columns.is_empty() {
            params.push(BoundParam::Pattern(format!("%{}%", search)));
            let idx = params.len();
            let matches: Vec<String> = self
                .search_columns
                .iter()
                .map(|column| format!("{} ILIKE ${}", column, idx))
                .collect();
            where_parts.push(format!("({})", matches.join(" OR ")));
        }

        let where_clause = if where_parts.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", where_parts.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM {}{}", self.table, where_clause);

        let (sort_column, ascending) = state
            .sort
            .as_ref()
            .filter(|(column, _)| self.sortable_columns.contains(&column.as_str()))
            .map(|(column, ascending)| (column.as_str(), *ascending))
            .unwrap_or(self.default_sort);

        let select_sql = format!(
            "SELECT {} FROM {}{} ORDER BY {} {} LIMIT ${} OFFSET ${}",
            self.columns,
            self.table,
            where_clause,
            sort_column,
            if ascending { "ASC" } else { "DESC" },
            params.len() + 1,
            params.len() + 2,
        );

        (select_sql, count_sql, params)
    }

    /// Resolves the effective page, page count, and row offset for a given
    /// total. The requested page is clamped into range, so a result set
    /// shrunk by a delete or a narrowed filter lands on the last real page
    /// instead of an empty one.
    fn resolve_window(&self, requested_page: u32, total: i64) -> (u32, i64, i64) {
        let page_count = if total == 0 {
            0
        } else {
            (total + self.per_page - 1) / self.per_page
        };
        let page = i64::from(requested_page.max(1)).min(page_count.max(1));
        let offset = (page - 1) * self.per_page;
        (page as u32, page_count, offset)
    }

    /// Executes the listing against the database.
    ///
    /// # Arguments
    ///
    /// * `db` - The database connection pool.
    /// * `state` - The listing state derived from the request.
    /// * `map` - Maps one row onto the entity type.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `ListPage`.
    pub async fn fetch<T, F>(&self, db: &Pool, state: &ListQueryState, map: F) -> Result<ListPage<T>>
    where
        F: Fn(&Row) -> Result<T>,
    {
        let (select_sql, count_sql, bound) = self.render(state);
        let client = db.get().await?;

        let params: Vec<&(dyn ToSql + Sync)> = bound.iter().map(BoundParam::as_sql).collect();

        let total: i64 = client
            .query_one(count_sql.as_str(), &params)
            .await?
            .try_get(0)
            .map_err(|_| crate::error::AppError::MissingData("count".to_string()))?;
        let (page, page_count, offset) = self.resolve_window(state.page(), total);

        let limit = self.per_page;
        let mut select_params = params;
        select_params.push(&limit);
        select_params.push(&offset);

        let rows = client.query(select_sql.as_str(), &select_params).await?;
        let rows = rows.iter().map(|row| map(row)).collect::<Result<Vec<T>>>()?;

        tracing::debug!(
            "📄 Listed {}: {} of {} rows (page {}/{})",
            self.table,
            rows.len(),
            total,
            page,
            page_count,
        );

        Ok(ListPage {
            rows,
            total_count: total,
            page_count,
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn articles_query() -> ListQuery {
        ListQuery::new("articles", "id, title, slug")
            .search_columns(&["title", "excerpt"])
            .filter_columns(&["status", "category"])
            .sortable_columns(&["title", "created_at"])
            .default_sort("created_at", false)
            .per_page(10)
    }

    #[test]
    fn search_change_resets_page() {
        let mut state = ListQueryState::new();
        state.set_page(4);
        state.set_search("lestari");
        assert_eq!(state.page(), 1);

        // an unchanged term keeps the page
        state.set_page(3);
        state.set_search("lestari");
        assert_eq!(state.page(), 3);
    }

    #[test]
    fn filter_change_resets_page() {
        let mut state = ListQueryState::new();
        state.set_page(5);
        state.set_filter("status", "published");
        assert_eq!(state.page(), 1);

        state.set_page(5);
        state.set_filter("status", "published");
        assert_eq!(state.page(), 5, "unchanged filter keeps the page");

        state.set_filter("status", "all");
        assert_eq!(state.page(), 1, "clearing a filter resets the page");
        assert_eq!(state.filter("status"), None);
    }

    #[test]
    fn sort_change_keeps_page() {
        let mut state = ListQueryState::new();
        state.set_page(3);
        state.set_sort("title", true);
        assert_eq!(state.page(), 3);
    }

    #[test]
    fn render_combines_filters_and_search() {
        let query = articles_query();
        let mut state = ListQueryState::new();
        state.set_filter("status", "published");
        state.set_search("lestari");

        let (select_sql, count_sql, params) = query.render(&state);
        assert_eq!(
            count_sql,
            "SELECT COUNT(*) FROM articles WHERE status::text = $1 \
             AND (title ILIKE $2 OR excerpt ILIKE $2)"
        );
        assert_eq!(
            select_sql,
            "SELECT id, title, slug FROM articles WHERE status::text = $1 \
             AND (title ILIKE $2 OR excerpt ILIKE $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn render_ignores_unknown_sort_column() {
        let query = articles_query();
        let mut state = ListQueryState::new();
        state.set_sort("password", true);

        let (select_sql, _, _) = query.render(&state);
        assert!(select_sql.contains("ORDER BY created_at DESC"));
    }

    #[test]
    fn render_applies_owner_and_conditions() {
        let query = articles_query()
            .owner_column("author_id")
            .owned_by(Some(Uuid::new_v4()))
            .condition("status = 'published'");
        let state = ListQueryState::new();

        let (_, count_sql, params) = query.render(&state);
        assert_eq!(
            count_sql,
            "SELECT COUNT(*) FROM articles WHERE (status = 'published') AND author_id = $1"
        );
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn window_math_matches_ceil_division() {
        let query = articles_query();
        // 3 matching rows out of 50 -> one page
        assert_eq!(query.resolve_window(1, 3), (1, 1, 0));
        assert_eq!(query.resolve_window(1, 50), (1, 5, 0));
        assert_eq!(query.resolve_window(2, 11), (2, 2, 10));
        assert_eq!(query.resolve_window(1, 0), (1, 0, 0));
    }

    #[test]
    fn deleting_last_row_of_last_page_steps_back() {
        let query = articles_query();
        // 21 rows put one row on page 3; after its deletion the refetch of
        // page 3 must land on page 2, not an empty page.
        assert_eq!(query.resolve_window(3, 21), (3, 3, 20));
        assert_eq!(query.resolve_window(3, 20), (2, 2, 10));
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        let query = articles_query();
        assert_eq!(query.resolve_window(9, 35), (4, 4, 30));
    }
}

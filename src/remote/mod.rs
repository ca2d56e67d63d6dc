//! Hosted table store (Supabase / PostgREST) behind a small port.
//!
//! The facade in [`crate::persistence`] only ever sees [`RemoteStore`]; every call
//! returns a [`RemoteResult`] and nothing here retries.

#[cfg(test)]
pub(crate) mod memory;
mod supabase;

pub use supabase::SupabaseClient;

use async_trait::async_trait;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("remote store not configured")]
    NotConfigured,
    #[error("network error: {0}")]
    Network(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("request failed ({status}): {body}")]
    Http { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Parse(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Table {
    Quizzes,
    Stories,
    Vocabulary,
    UserProgress,
    StudyGuides,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq(String, String),
    /// Case-insensitive match; `*` in the pattern is a wildcard.
    ILike(String, String),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<String>) -> Self {
        Filter::Eq(column.to_string(), value.into())
    }

    pub fn ilike(column: &str, pattern: impl Into<String>) -> Self {
        Filter::ILike(column.to_string(), pattern.into())
    }

    /// PostgREST horizontal filter, e.g. `("level", "eq.A1")`.
    pub(crate) fn to_param(&self) -> (&str, String) {
        match self {
            Filter::Eq(col, v) => (col.as_str(), format!("eq.{v}")),
            Filter::ILike(col, p) => (col.as_str(), format!("ilike.{p}")),
        }
    }
}

/// Make `text` match only itself inside an `ilike` pattern.
///
/// `%`, `_` and `\` are backslash-escaped. PostgREST rewrites every `*` to `%`
/// before escapes apply, so a literal `*` cannot be expressed; it becomes the
/// single-character wildcard `_` and callers re-check hits client-side.
pub(crate) fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            '*' => out.push('_'),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub columns: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn ilike(mut self, column: &str, pattern: impl Into<String>) -> Self {
        self.filters.push(Filter::ilike(column, pattern));
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending: false,
        });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

#[async_trait(?Send)]
pub trait RemoteStore {
    /// Insert one row and return it as stored (server id and timestamps included).
    async fn insert(&self, table: Table, row: Value) -> RemoteResult<Value>;

    async fn insert_many(&self, table: Table, rows: Vec<Value>) -> RemoteResult<()>;

    async fn select(&self, table: Table, query: &Query) -> RemoteResult<Vec<Value>>;

    async fn select_one(&self, table: Table, query: &Query) -> RemoteResult<Option<Value>> {
        let rows = self.select(table, &query.clone().limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> RemoteResult<()>;

    /// Merge `patch` into every row matching `filters`.
    async fn update(&self, table: Table, filters: &[Filter], patch: Value) -> RemoteResult<()>;

    /// Insert, or merge into the row that collides on `on_conflict`.
    async fn upsert(&self, table: Table, row: Value, on_conflict: &[&str]) -> RemoteResult<()>;

    /// Cheap reachability check against a known table.
    async fn ping(&self, table: Table) -> RemoteResult<()>;
}

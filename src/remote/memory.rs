use super::{Filter, Query, RemoteError, RemoteResult, RemoteStore, Table};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    Online,
    Offline,
    NotConfigured,
}

/// In-process table store with PostgREST-like semantics, for tests.
///
/// Server-side ids are `srv-<n>`; `created_at` is an RFC 3339 string that
/// strictly increases with every insert.
pub(crate) struct MemoryRemote {
    tables: Mutex<HashMap<Table, Vec<Value>>>,
    mode: Mutex<Mode>,
    seq: AtomicI64,
}

const BASE_MS: i64 = 1_700_000_000_000;

impl MemoryRemote {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            mode: Mutex::new(Mode::Online),
            seq: AtomicI64::new(0),
        }
    }

    pub fn offline() -> Self {
        let r = Self::new();
        r.set_mode(Mode::Offline);
        r
    }

    pub fn not_configured() -> Self {
        let r = Self::new();
        r.set_mode(Mode::NotConfigured);
        r
    }

    pub fn set_mode(&self, mode: Mode) {
        *self.mode.lock().expect("mode lock") = mode;
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .lock()
            .expect("tables lock")
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    /// Seed a row directly, bypassing the mode switch.
    pub fn seed(&self, table: Table, row: Value) -> Value {
        let row = self.stamp(row);
        self.tables
            .lock()
            .expect("tables lock")
            .entry(table)
            .or_default()
            .push(row.clone());
        row
    }

    fn check(&self) -> RemoteResult<()> {
        match *self.mode.lock().expect("mode lock") {
            Mode::Online => Ok(()),
            Mode::Offline => Err(RemoteError::Network("connection refused".to_string())),
            Mode::NotConfigured => Err(RemoteError::NotConfigured),
        }
    }

    fn stamp(&self, row: Value) -> Value {
        let n = self.seq.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        let mut obj = row.as_object().cloned().unwrap_or_default();
        obj.entry("id").or_insert_with(|| Value::from(format!("srv-{n}")));
        let created = chrono::DateTime::from_timestamp_millis(BASE_MS + n)
            .map(|d| d.to_rfc3339())
            .unwrap_or_default();
        obj.entry("created_at").or_insert(Value::from(created));
        Value::Object(obj)
    }
}

fn cell_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

enum LikeToken {
    Any,
    One,
    Lit(char),
}

fn like_tokens(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '\\' => match chars.next() {
                Some(escaped) => LikeToken::Lit(escaped),
                None => LikeToken::Lit('\\'),
            },
            '*' | '%' => LikeToken::Any,
            '_' => LikeToken::One,
            other => LikeToken::Lit(other),
        });
    }
    tokens
}

/// Case-insensitive SQL `LIKE`: `*`/`%` any run, `_` one char, `\` escapes.
fn ilike_matches(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let n = text.len();
    // reachable[i]: the tokens so far can consume exactly text[..i]
    let mut reachable = vec![false; n + 1];
    reachable[0] = true;
    for token in like_tokens(&pattern.to_lowercase()) {
        let mut next = vec![false; n + 1];
        match token {
            LikeToken::Any => {
                let mut seen = false;
                for i in 0..=n {
                    seen |= reachable[i];
                    next[i] = seen;
                }
            }
            LikeToken::One => {
                for i in 0..n {
                    next[i + 1] = reachable[i];
                }
            }
            LikeToken::Lit(c) => {
                for i in 0..n {
                    next[i + 1] = reachable[i] && text[i] == c;
                }
            }
        }
        reachable = next;
    }
    reachable[n]
}

fn matches(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| match f {
        Filter::Eq(col, v) => cell_text(row.get(col)).as_deref() == Some(v.as_str()),
        Filter::ILike(col, p) => cell_text(row.get(col))
            .map(|t| ilike_matches(&t, p))
            .unwrap_or(false),
    })
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a.and_then(Value::as_f64), b.and_then(Value::as_f64)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => cell_text(a).cmp(&cell_text(b)),
    }
}

fn merge_into(target: &mut Value, patch: &Value) {
    if let (Some(t), Some(p)) = (target.as_object_mut(), patch.as_object()) {
        for (k, v) in p {
            t.insert(k.clone(), v.clone());
        }
    }
}

fn project(row: &Value, columns: Option<&str>) -> Value {
    match columns {
        None | Some("*") => row.clone(),
        Some(cols) => {
            let mut out = Map::new();
            for c in cols.split(',').map(str::trim) {
                if let Some(v) = row.get(c) {
                    out.insert(c.to_string(), v.clone());
                }
            }
            Value::Object(out)
        }
    }
}

#[async_trait(?Send)]
impl RemoteStore for MemoryRemote {
    async fn insert(&self, table: Table, row: Value) -> RemoteResult<Value> {
        self.check()?;
        Ok(self.seed(table, row))
    }

    async fn insert_many(&self, table: Table, rows: Vec<Value>) -> RemoteResult<()> {
        self.check()?;
        for row in rows {
            self.seed(table, row);
        }
        Ok(())
    }

    async fn select(&self, table: Table, query: &Query) -> RemoteResult<Vec<Value>> {
        self.check()?;
        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|r| matches(r, &query.filters))
            .collect();
        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let o = compare(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    o
                } else {
                    o.reverse()
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows
            .iter()
            .map(|r| project(r, query.columns.as_deref()))
            .collect())
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> RemoteResult<()> {
        self.check()?;
        let mut tables = self.tables.lock().expect("tables lock");
        if let Some(rows) = tables.get_mut(&table) {
            rows.retain(|r| !matches(r, filters));
        }
        Ok(())
    }

    async fn update(&self, table: Table, filters: &[Filter], patch: Value) -> RemoteResult<()> {
        self.check()?;
        let mut tables = self.tables.lock().expect("tables lock");
        if let Some(rows) = tables.get_mut(&table) {
            for r in rows.iter_mut().filter(|r| matches(r, filters)) {
                merge_into(r, &patch);
            }
        }
        Ok(())
    }

    async fn upsert(&self, table: Table, row: Value, on_conflict: &[&str]) -> RemoteResult<()> {
        self.check()?;
        let key: Vec<Filter> = on_conflict
            .iter()
            .filter_map(|c| cell_text(row.get(*c)).map(|v| Filter::eq(c, v)))
            .collect();

        {
            let mut tables = self.tables.lock().expect("tables lock");
            let rows = tables.entry(table).or_default();
            if key.len() == on_conflict.len() {
                if let Some(existing) = rows.iter_mut().find(|r| matches(r, &key)) {
                    merge_into(existing, &row);
                    return Ok(());
                }
            }
        }
        self.seed(table, row);
        Ok(())
    }

    async fn ping(&self, _table: Table) -> RemoteResult<()> {
        self.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ilike_matches() {
        assert!(ilike_matches("Manger", "man*"));
        assert!(ilike_matches("Manger", "MANGER"));
        assert!(!ilike_matches("Manger", "mange"));
        assert!(ilike_matches("bonjour", "b*j*r"));
        assert!(!ilike_matches("ami", "ma*"));
        assert!(ilike_matches("lire", "l_re"));
        assert!(!ilike_matches("lire", "l\\_re"));
        assert!(ilike_matches("l_re", "l\\_re"));
        assert!(ilike_matches("100%", "100\\%"));
        assert!(!ilike_matches("1000", "100\\%"));
    }

    #[tokio::test]
    async fn test_upsert_merges_on_conflict() {
        let r = MemoryRemote::new();
        r.upsert(Table::Vocabulary, json!({"word": "chat", "translation": "cat"}), &["word"])
            .await
            .expect("upsert");
        r.upsert(Table::Vocabulary, json!({"word": "chat", "details": {"x": 1}}), &["word"])
            .await
            .expect("upsert");

        let rows = r.rows(Table::Vocabulary);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["translation"], "cat");
        assert_eq!(rows[0]["details"]["x"], 1);
    }

    #[tokio::test]
    async fn test_offline_mode_fails_every_call() {
        let r = MemoryRemote::offline();
        assert!(matches!(
            r.select(Table::Quizzes, &Query::new()).await,
            Err(RemoteError::Network(_))
        ));
        assert!(r.ping(Table::Quizzes).await.is_err());
    }
}

use super::{attempt, decode_rows, to_row, Persistence};
use crate::models::{CefrLevel, VocabularyEntry, WordDetail, WordItem};
use crate::remote::{escape_like, Filter, Query, RemoteStore, Table};
use crate::storage::{vocab_key, LocalStore};
use crate::util::starts_with_ignore_case;
use serde_json::Value;

pub const SEARCH_MIN_CHARS: usize = 2;
pub const SEARCH_LIMIT: usize = 8;

const WORD_CONFLICT: &[&str] = &["word"];

/// Case-insensitive exact match on `word`.
///
/// A `*` has no escaped form in a PostgREST pattern, so such words fall back
/// to a case-sensitive `eq` rather than risk matching other rows.
fn word_filter(word: &str) -> Filter {
    if word.contains('*') {
        Filter::eq("word", word)
    } else {
        Filter::ilike("word", escape_like(word))
    }
}

fn detail_of<'a>(entries: &'a [VocabularyEntry], word: &str) -> Option<&'a WordDetail> {
    entries
        .iter()
        .find(|e| e.same_word(word))
        .and_then(|e| e.details.as_ref())
}

impl<R: RemoteStore, L: LocalStore> Persistence<R, L> {
    /// Remote rows if there are any, otherwise the local partition.
    pub async fn vocabulary_by_level(&self, level: CefrLevel) -> Vec<VocabularyEntry> {
        let query = Query::new().eq("level", level.as_ref());
        if let Some(rows) = attempt("vocabulary by level", self.remote.select(Table::Vocabulary, &query)).await {
            let entries: Vec<VocabularyEntry> = decode_rows(rows);
            if !entries.is_empty() {
                return entries;
            }
        }
        self.local.list(&vocab_key(level))
    }

    /// Store a freshly generated list for `level`. Returns the entries as stored.
    pub async fn save_vocabulary_list(&self, level: CefrLevel, words: Vec<WordItem>) -> Vec<VocabularyEntry> {
        let entries: Vec<VocabularyEntry> = words
            .into_iter()
            .map(|w| VocabularyEntry::from_item(w, level))
            .collect();

        let rows: Option<Vec<Value>> = entries
            .iter()
            .map(|e| to_row(e).map(Value::Object))
            .collect();
        if let Some(rows) = rows {
            if attempt("save vocabulary list", self.remote.insert_many(Table::Vocabulary, rows))
                .await
                .is_some()
            {
                return entries;
            }
        }

        let key = vocab_key(level);
        let existing: Vec<VocabularyEntry> = self.local.list(&key);
        let entries: Vec<VocabularyEntry> = entries
            .into_iter()
            .map(|mut e| {
                e.details = detail_of(&existing, &e.word).cloned();
                e
            })
            .collect();
        self.local.replace(&key, &entries);
        entries
    }

    /// Insert or update one entry keyed by word. Never clears existing details.
    pub async fn save_vocabulary_entry(&self, entry: VocabularyEntry) {
        if let Some(mut row) = to_row(&entry) {
            if entry.details.is_none() {
                row.remove("details");
            }
            let call = self.remote.upsert(Table::Vocabulary, Value::Object(row), WORD_CONFLICT);
            if attempt("save vocabulary entry", call).await.is_some() {
                return;
            }
        }

        let key = vocab_key(entry.level);
        let mut entries: Vec<VocabularyEntry> = self.local.list(&key);
        match entries.iter_mut().find(|e| e.same_word(&entry.word)) {
            Some(existing) => {
                let details = entry.details.clone().or_else(|| existing.details.take());
                *existing = VocabularyEntry { details, ..entry };
            }
            None => entries.push(entry),
        }
        self.local.replace(&key, &entries);
    }

    pub async fn word_details(&self, word: &str) -> Option<WordDetail> {
        let query = Query::new()
            .columns("word,details")
            .filter(word_filter(word))
            .limit(SEARCH_LIMIT);
        let remote = attempt("word details", self.remote.select(Table::Vocabulary, &query)).await;
        let hit = remote.into_iter().flatten().find(|row| {
            let same = row
                .get("word")
                .and_then(Value::as_str)
                .is_some_and(|w| w.to_lowercase() == word.to_lowercase());
            same && row.get("details").is_some_and(|d| !d.is_null())
        });
        if let Some(details) = hit.and_then(|mut row| row.get_mut("details").map(Value::take)) {
            match serde_json::from_value(details) {
                Ok(d) => return Some(d),
                Err(e) => tracing::warn!(word, error = %e, "unreadable word details"),
            }
        }

        CefrLevel::ALL.iter().find_map(|level| {
            let entries: Vec<VocabularyEntry> = self.local.list(&vocab_key(*level));
            detail_of(&entries, word).cloned()
        })
    }

    pub async fn update_word_details(&self, word: &str, details: WordDetail) {
        if let Ok(value) = serde_json::to_value(&details) {
            let patch = serde_json::json!({ "details": value });
            let filters = [word_filter(word)];
            let call = self.remote.update(Table::Vocabulary, &filters, patch);
            if attempt("update word details", call).await.is_some() {
                return;
            }
        }

        for level in CefrLevel::ALL {
            let key = vocab_key(level);
            let mut entries: Vec<VocabularyEntry> = self.local.list(&key);
            if let Some(entry) = entries.iter_mut().find(|e| e.same_word(word)) {
                entry.details = Some(details);
                self.local.replace(&key, &entries);
                return;
            }
        }
        tracing::debug!(word, "no local entry to attach details to");
    }

    /// Case-insensitive prefix search over all levels, at most [`SEARCH_LIMIT`] hits.
    pub async fn search_vocabulary(&self, query: &str) -> Vec<VocabularyEntry> {
        let prefix = query.trim();
        if prefix.chars().count() < SEARCH_MIN_CHARS {
            return Vec::new();
        }

        let remote_query = Query::new()
            .ilike("word", format!("{}*", escape_like(prefix)))
            .limit(SEARCH_LIMIT);
        if let Some(rows) = attempt("search vocabulary", self.remote.select(Table::Vocabulary, &remote_query)).await {
            let hits: Vec<VocabularyEntry> = decode_rows::<VocabularyEntry>(rows)
                .into_iter()
                .filter(|e| starts_with_ignore_case(&e.word, prefix))
                .take(SEARCH_LIMIT)
                .collect();
            if !hits.is_empty() {
                return hits;
            }
        }

        CefrLevel::ALL
            .iter()
            .flat_map(|level| self.local.list::<VocabularyEntry>(&vocab_key(*level)))
            .filter(|e| starts_with_ignore_case(&e.word, prefix))
            .take(SEARCH_LIMIT)
            .collect()
    }
}

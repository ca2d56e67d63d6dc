use super::{attempt, decode_row, Persistence};
use crate::models::{HistoryRecord, QuizData, SavedQuiz, SavedStory, StoryData};
use crate::remote::{Filter, Query, RemoteStore, Table};
use crate::storage::{LocalStore, QUIZ_KEY, STORY_KEY};
use crate::util::{new_local_id, now_ms, timestamp_to_ms};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A kind of generated content kept as append-only history.
pub trait HistoryKind {
    type Data: Serialize + DeserializeOwned + Clone;
    const TABLE: Table;
    const LOCAL_KEY: &'static str;
}

pub struct Quizzes;
pub struct Stories;

impl HistoryKind for Quizzes {
    type Data = QuizData;
    const TABLE: Table = Table::Quizzes;
    const LOCAL_KEY: &'static str = QUIZ_KEY;
}

impl HistoryKind for Stories {
    type Data = StoryData;
    const TABLE: Table = Table::Stories;
    const LOCAL_KEY: &'static str = STORY_KEY;
}

fn id_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `{ id, created_at: ISO-8601, data }` as stored remotely.
fn decode_history_row<T: DeserializeOwned>(row: &Value) -> Option<HistoryRecord<T>> {
    let id = id_text(row.get("id"))?;
    let created_at = row.get("created_at").and_then(timestamp_to_ms)?;
    let data = decode_row(row.get("data")?.clone())?;
    Some(HistoryRecord {
        id,
        created_at,
        data,
    })
}

fn newest_first<T>(items: &mut [HistoryRecord<T>]) {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

impl<R: RemoteStore, L: LocalStore> Persistence<R, L> {
    pub async fn save_history<K: HistoryKind>(&self, data: K::Data) -> HistoryRecord<K::Data> {
        if let Some(row) = self.history_row::<K>(&data) {
            if let Some(inserted) = attempt("save history", self.remote.insert(K::TABLE, row)).await
            {
                let id = id_text(inserted.get("id"));
                let created_at = inserted.get("created_at").and_then(timestamp_to_ms);
                match id {
                    Some(id) => {
                        return HistoryRecord {
                            id,
                            created_at: created_at.unwrap_or_else(now_ms),
                            data,
                        };
                    }
                    None => {
                        let table = K::TABLE;
                        tracing::warn!(%table, "inserted row has no id, keeping a local copy");
                    }
                }
            }
        }

        let record = HistoryRecord {
            id: new_local_id(),
            created_at: now_ms(),
            data,
        };
        let mut items: Vec<HistoryRecord<K::Data>> = self.local.list(K::LOCAL_KEY);
        items.insert(0, record.clone());
        self.local.replace(K::LOCAL_KEY, &items);
        record
    }

    /// Newest first. A reachable store is authoritative even when it has no rows.
    pub async fn list_history<K: HistoryKind>(&self) -> Vec<HistoryRecord<K::Data>> {
        let query = Query::new()
            .eq("user_id", self.device_id())
            .order_desc("created_at");
        if let Some(rows) = attempt("list history", self.remote.select(K::TABLE, &query)).await {
            let mut items: Vec<HistoryRecord<K::Data>> =
                rows.iter().filter_map(decode_history_row).collect();
            newest_first(&mut items);
            return items;
        }

        let mut items: Vec<HistoryRecord<K::Data>> = self.local.list(K::LOCAL_KEY);
        newest_first(&mut items);
        items
    }

    /// Remove `id` from both stores.
    ///
    /// Returns `false` only when the remote delete failed and no local copy
    /// existed, i.e. nothing is known to be gone.
    pub async fn delete_history<K: HistoryKind>(&self, id: &str) -> bool {
        let filters = [Filter::eq("id", id), Filter::eq("user_id", self.device_id())];
        let remote_ok = attempt("delete history", self.remote.delete(K::TABLE, &filters))
            .await
            .is_some();

        // Payloads stay opaque here so one odd record can't block the delete.
        let mut items: Vec<HistoryRecord<Value>> = self.local.list(K::LOCAL_KEY);
        let before = items.len();
        items.retain(|r| r.id != id);
        let local_removed = items.len() != before;
        if local_removed {
            self.local.replace(K::LOCAL_KEY, &items);
        }

        remote_ok || local_removed
    }

    fn history_row<K: HistoryKind>(&self, data: &K::Data) -> Option<Value> {
        let payload = serde_json::to_value(data)
            .map_err(|e| tracing::warn!(error = %e, "payload could not be serialized"))
            .ok()?;
        let mut row = serde_json::Map::new();
        row.insert("user_id".to_string(), Value::String(self.device_id()));
        row.insert("data".to_string(), payload);
        Some(Value::Object(row))
    }

    pub async fn save_quiz(&self, quiz: QuizData) -> SavedQuiz {
        self.save_history::<Quizzes>(quiz).await
    }

    pub async fn saved_quizzes(&self) -> Vec<SavedQuiz> {
        self.list_history::<Quizzes>().await
    }

    pub async fn delete_quiz(&self, id: &str) -> bool {
        self.delete_history::<Quizzes>(id).await
    }

    pub async fn save_story(&self, story: StoryData) -> SavedStory {
        self.save_history::<Stories>(story).await
    }

    pub async fn saved_stories(&self) -> Vec<SavedStory> {
        self.list_history::<Stories>().await
    }

    pub async fn delete_story(&self, id: &str) -> bool {
        self.delete_history::<Stories>(id).await
    }
}

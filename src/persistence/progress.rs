use super::{attempt, decode_row, decode_rows, to_row, Persistence};
use crate::models::{CefrLevel, ProgressCheckpoint};
use crate::remote::{Query, RemoteStore, Table};
use crate::storage::{LocalStore, PROGRESS_KEY};
use serde_json::Value;

const PASS_PERCENT: u64 = 60;
const PROGRESS_CONFLICT: &[&str] = &["user_id", "level_id", "checkpoint_title"];

/// A checkpoint passes at 60% or better.
pub fn is_passing(score: u32, total: u32) -> bool {
    total > 0 && u64::from(score) * 100 >= u64::from(total) * PASS_PERCENT
}

/// Best score wins; a completed checkpoint stays completed.
fn merge(
    existing: Option<ProgressCheckpoint>,
    level_id: &str,
    title: &str,
    score: u32,
    passed: bool,
) -> ProgressCheckpoint {
    match existing {
        Some(old) => ProgressCheckpoint {
            completed: old.completed || passed,
            score: old.score.max(score),
            ..old
        },
        None => ProgressCheckpoint {
            level_id: level_id.to_string(),
            checkpoint_title: title.to_string(),
            completed: passed,
            score,
        },
    }
}

/// Read what can be read from a row that does not decode cleanly.
///
/// The stored score must survive; without a usable score there is nothing
/// safe to merge against.
fn salvage(row: &Value, level_id: &str, title: &str) -> Option<ProgressCheckpoint> {
    let score = row
        .get("score")
        .and_then(Value::as_f64)
        .filter(|s| s.is_finite() && *s >= 0.0)?;
    Some(ProgressCheckpoint {
        level_id: level_id.to_string(),
        checkpoint_title: title.to_string(),
        completed: row.get("completed").and_then(Value::as_bool).unwrap_or(false),
        // `as` saturates at u32::MAX.
        score: score.ceil() as u32,
    })
}

impl<R: RemoteStore, L: LocalStore> Persistence<R, L> {
    pub async fn path_progress(&self, level: CefrLevel) -> Vec<ProgressCheckpoint> {
        let query = Query::new()
            .eq("user_id", self.device_id())
            .eq("level_id", level.as_ref());
        if let Some(rows) = attempt("path progress", self.remote.select(Table::UserProgress, &query)).await {
            return decode_rows(rows);
        }

        self.local
            .list::<ProgressCheckpoint>(PROGRESS_KEY)
            .into_iter()
            .filter(|c| c.level_id == level.as_ref())
            .collect()
    }

    /// Record an attempt at a checkpoint and return the merged record.
    pub async fn mark_checkpoint_complete(
        &self,
        level: CefrLevel,
        title: &str,
        score: u32,
        total: u32,
    ) -> ProgressCheckpoint {
        let passed = is_passing(score, total);
        let level_id = level.as_ref();
        let user_id = self.device_id();

        let query = Query::new()
            .eq("user_id", user_id.as_str())
            .eq("level_id", level_id)
            .eq("checkpoint_title", title);
        let existing = match attempt("read checkpoint", self.remote.select_one(Table::UserProgress, &query)).await {
            None => None,
            Some(None) => Some(None),
            Some(Some(row)) => match decode_row(row.clone()).or_else(|| salvage(&row, level_id, title)) {
                Some(checkpoint) => Some(Some(checkpoint)),
                None => {
                    tracing::warn!(level_id, title, "stored checkpoint has no usable score, keeping it untouched");
                    None
                }
            },
        };
        if let Some(existing) = existing {
            let merged = merge(existing, level_id, title, score, passed);
            if let Some(mut row) = to_row(&merged) {
                row.insert("user_id".to_string(), Value::String(user_id));
                let call = self
                    .remote
                    .upsert(Table::UserProgress, Value::Object(row), PROGRESS_CONFLICT);
                if attempt("save checkpoint", call).await.is_some() {
                    return merged;
                }
            }
        }

        let mut items: Vec<ProgressCheckpoint> = self.local.list(PROGRESS_KEY);
        let pos = items
            .iter()
            .position(|c| c.level_id == level_id && c.checkpoint_title == title);
        let merged = merge(pos.map(|i| items[i].clone()), level_id, title, score, passed);
        match pos {
            Some(i) => items[i] = merged.clone(),
            None => items.push(merged.clone()),
        }
        self.local.replace(PROGRESS_KEY, &items);
        merged
    }
}

//! Remote-first, local-fallback persistence for everything the app keeps.
//!
//! Every public operation tries the table store once and, on any failure
//! (including "not configured"), runs the same operation against localStorage.
//! Nothing here returns an error to the caller: reads degrade to empty/`None`,
//! writes degrade to a local copy, deletes are best-effort.

mod history;
mod progress;
mod study_guide;
mod vocabulary;

pub use history::{HistoryKind, Quizzes, Stories};
pub use progress::is_passing;
pub use vocabulary::{SEARCH_LIMIT, SEARCH_MIN_CHARS};

use crate::identity::IdentityProvider;
use crate::remote::{RemoteError, RemoteResult, RemoteStore, Table};
use crate::storage::LocalStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

pub struct Persistence<R, L> {
    remote: Arc<R>,
    local: Arc<L>,
    identity: Arc<IdentityProvider<L>>,
}

impl<R, L> Clone for Persistence<R, L> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            local: self.local.clone(),
            identity: self.identity.clone(),
        }
    }
}

impl<R: RemoteStore, L: LocalStore> Persistence<R, L> {
    pub fn new(remote: Arc<R>, local: Arc<L>) -> Self {
        let identity = Arc::new(IdentityProvider::new(local.clone()));
        Self {
            remote,
            local,
            identity,
        }
    }

    pub fn device_id(&self) -> String {
        self.identity.device_id()
    }

    #[cfg(test)]
    pub(crate) fn local(&self) -> &L {
        &self.local
    }

    /// `true` when the store answers and the quiz table exists.
    pub async fn check_connection(&self) -> bool {
        match self.remote.ping(Table::Quizzes).await {
            Ok(()) => true,
            Err(RemoteError::NotConfigured) => {
                tracing::info!("remote store not configured, using local storage");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote store unreachable (are the tables created?)");
                false
            }
        }
    }
}

/// Run one remote call; `None` tells the caller to take the local path.
pub(crate) async fn attempt<T>(op: &str, call: impl Future<Output = RemoteResult<T>>) -> Option<T> {
    match call.await {
        Ok(v) => Some(v),
        Err(RemoteError::NotConfigured) => {
            tracing::debug!(op, "remote not configured, falling back to local");
            None
        }
        Err(e) => {
            tracing::warn!(op, error = %e, "remote call failed, falling back to local");
            None
        }
    }
}

/// Decode a table row, accepting numeric ids where the model holds strings.
pub(crate) fn decode_row<T: DeserializeOwned>(mut row: Value) -> Option<T> {
    if let Some(id) = row.get_mut("id") {
        if id.is_number() {
            *id = Value::String(id.to_string());
        }
    }
    match serde_json::from_value(row) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(error = %e, "skipping unreadable remote row");
            None
        }
    }
}

pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Vec<T> {
    rows.into_iter().filter_map(decode_row).collect()
}

/// Serialize a record into a row object; `None` if it cannot be represented.
pub(crate) fn to_row<T: Serialize>(value: &T) -> Option<serde_json::Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            tracing::warn!("record did not serialize to an object");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "record could not be serialized");
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::remote::memory::{MemoryRemote, Mode};
    use serde::Deserialize;

    #[tokio::test]
    async fn test_check_connection() {
        let (p, remote) = online();
        assert!(p.check_connection().await);

        remote.set_mode(Mode::Offline);
        assert!(!p.check_connection().await);

        let (p, _) = with_remote(MemoryRemote::not_configured());
        assert!(!p.check_connection().await);
    }

    #[tokio::test]
    async fn test_attempt_maps_errors_to_none() {
        let ok = attempt("op", async { Ok::<_, RemoteError>(3) }).await;
        assert_eq!(ok, Some(3));
        let failed = attempt("op", async { Err::<u8, _>(RemoteError::Unauthorized) }).await;
        assert_eq!(failed, None);
        let unconfigured = attempt("op", async { Err::<u8, _>(RemoteError::NotConfigured) }).await;
        assert_eq!(unconfigured, None);
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Row {
        id: String,
    }

    #[test]
    fn test_decode_row_stringifies_numeric_id() {
        let row: Option<Row> = decode_row(serde_json::json!({"id": 12, "extra": true}));
        assert_eq!(row, Some(Row { id: "12".to_string() }));

        let bad: Option<Row> = decode_row(serde_json::json!({"nope": 1}));
        assert!(bad.is_none());
    }

    #[test]
    fn test_device_id_is_stable_per_facade() {
        let (p, _) = online();
        assert_eq!(p.device_id(), p.clone().device_id());
    }
}

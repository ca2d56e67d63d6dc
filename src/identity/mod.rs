use crate::storage::{LocalStore, DEVICE_ID_KEY};
use crate::util::new_local_id;
use std::sync::{Arc, OnceLock};

/// Stable anonymous identity for "this browser".
///
/// Remote rows are tagged with it so two browsers never see each other's
/// history. Created once at startup and shared; the id itself is created on
/// first use and persisted for the lifetime of the storage origin.
pub struct IdentityProvider<L> {
    store: Arc<L>,
    cached: OnceLock<String>,
}

impl<L: LocalStore> IdentityProvider<L> {
    pub fn new(store: Arc<L>) -> Self {
        Self {
            store,
            cached: OnceLock::new(),
        }
    }

    pub fn device_id(&self) -> String {
        self.cached.get_or_init(|| self.load_or_create()).clone()
    }

    fn load_or_create(&self) -> String {
        if let Some(id) = self.store.get_item(DEVICE_ID_KEY) {
            if !id.trim().is_empty() {
                return id;
            }
        }

        let id = new_local_id();
        if let Err(e) = self.store.set_item(DEVICE_ID_KEY, &id) {
            // Still usable for this session; a fresh id is minted next launch.
            tracing::warn!(error = %e, "could not persist device id");
        }
        tracing::debug!(device_id = %id, "created device id");
        id
    }
}

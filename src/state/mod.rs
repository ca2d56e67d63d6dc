use crate::config::SupabaseConfig;
use crate::models::{HistoryRecord, SavedQuiz, SavedStory};
use crate::persistence::Persistence;
use crate::remote::SupabaseClient;
use crate::storage::{load_theme, BrowserStorage, Theme};
use leptos::prelude::*;
use std::sync::Arc;

pub(crate) type AppPersistence = Persistence<SupabaseClient, BrowserStorage>;

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub persistence: StoredValue<AppPersistence>,

    /// `None` until the first connection check finishes.
    pub connected: RwSignal<Option<bool>>,

    pub quizzes: RwSignal<Vec<SavedQuiz>>,
    pub stories: RwSignal<Vec<SavedStory>>,
    pub history_loading: RwSignal<bool>,

    /// Last generation failure, shown verbatim.
    pub error: RwSignal<Option<String>>,

    pub theme: RwSignal<Theme>,
}

impl AppState {
    pub fn new(supabase: SupabaseConfig) -> Self {
        let local = Arc::new(BrowserStorage);
        let theme = load_theme(local.as_ref()).unwrap_or(Theme::Light);
        let persistence = Persistence::new(Arc::new(SupabaseClient::new(supabase)), local);

        Self {
            persistence: StoredValue::new(persistence),
            connected: RwSignal::new(None),
            quizzes: RwSignal::new(vec![]),
            stories: RwSignal::new(vec![]),
            history_loading: RwSignal::new(false),
            error: RwSignal::new(None),
            theme: RwSignal::new(theme),
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);

/// A removal already applied to a visible list, undoable until dropped.
#[derive(Debug)]
pub(crate) struct OptimisticDelete<T> {
    snapshot: Vec<T>,
}

impl<T: Clone> OptimisticDelete<T> {
    pub fn apply(list: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> Self {
        let snapshot = list.clone();
        list.retain(|item| !matches(item));
        Self { snapshot }
    }

    pub fn revert(self, list: &mut Vec<T>) {
        *list = self.snapshot;
    }
}

/// Drop history record `id` from `list`.
pub(crate) fn delete_record<D: Clone>(
    list: &mut Vec<HistoryRecord<D>>,
    id: &str,
) -> OptimisticDelete<HistoryRecord<D>> {
    OptimisticDelete::apply(list, |r| r.id == id)
}

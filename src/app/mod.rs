use crate::config::AppConfig;
use crate::models::HistoryRecord;
use crate::state::{delete_record, AppContext, AppState};
use crate::storage::{toggle_theme, BrowserStorage, Theme};
use leptos::prelude::*;
use leptos::task::spawn_local;

fn format_day(created_at: i64) -> String {
    chrono::DateTime::from_timestamp_millis(created_at)
        .map(|d| d.format("%d %b %Y").to_string())
        .unwrap_or_default()
}

fn apply_theme(theme: Theme) {
    if let Some(root) = document().document_element() {
        let _ = root.class_list().toggle_with_force("dark", theme == Theme::Dark);
    }
}

fn load_history(state: AppState) {
    let persistence = state.persistence.get_value();
    state.history_loading.set(true);

    spawn_local(async move {
        state.connected.set(Some(persistence.check_connection().await));
        state.quizzes.set(persistence.saved_quizzes().await);
        state.stories.set(persistence.saved_stories().await);
        state.history_loading.set(false);
    });
}

/// Remove from the visible list now; put it back if the store says nothing was removed.
fn delete_quiz(state: AppState, id: String) {
    let mut undo = None;
    state.quizzes.update(|list| undo = Some(delete_record(list, &id)));

    let persistence = state.persistence.get_value();
    spawn_local(async move {
        if !persistence.delete_quiz(&id).await {
            tracing::warn!(%id, "quiz delete failed, restoring");
            if let Some(undo) = undo {
                state.quizzes.update(|list| undo.revert(list));
            }
        }
    });
}

fn delete_story(state: AppState, id: String) {
    let mut undo = None;
    state.stories.update(|list| undo = Some(delete_record(list, &id)));

    let persistence = state.persistence.get_value();
    spawn_local(async move {
        if !persistence.delete_story(&id).await {
            tracing::warn!(%id, "story delete failed, restoring");
            if let Some(undo) = undo {
                state.stories.update(|list| undo.revert(list));
            }
        }
    });
}

fn history_row<T>(
    record: &HistoryRecord<T>,
    title: String,
    level: String,
    on_delete: impl Fn(String) + 'static,
) -> impl IntoView {
    let id = record.id.clone();
    let day = format_day(record.created_at);

    view! {
        <li class="flex items-center justify-between rounded-md border px-4 py-3">
            <div class="flex flex-col gap-1">
                <span class="text-sm font-medium">{title}</span>
                <span class="text-xs text-muted-foreground">{format!("{level} · {day}")}</span>
            </div>
            <button
                class="text-xs text-destructive hover:underline"
                on:click=move |_| on_delete(id.clone())
            >
                "Delete"
            </button>
        </li>
    }
}

#[component]
pub fn App(config: AppConfig) -> impl IntoView {
    let state = AppState::new(config.supabase);
    provide_context(AppContext(state));

    Effect::new(move |_| apply_theme(state.theme.get()));

    Effect::new(move |_| {
        load_history(state);
    });

    let on_toggle_theme = move |_| state.theme.update(|t| *t = toggle_theme(&BrowserStorage, *t));

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto w-full max-w-[880px] px-4 py-8">
                <div class="mb-4 flex items-center justify-between">
                    <div class="space-y-1">
                        <h1 class="text-xl font-semibold">"Lumière"</h1>
                        <p class="text-xs text-muted-foreground">
                            {move || match state.connected.get() {
                                None => "Checking connection...",
                                Some(true) => "Synced to the cloud",
                                Some(false) => "Offline mode (saved on this device)",
                            }}
                        </p>
                    </div>

                    <button class="rounded-md border px-3 py-1 text-xs" on:click=on_toggle_theme>
                        {move || if state.theme.get() == Theme::Dark { "Light mode" } else { "Dark mode" }}
                    </button>
                </div>

                <Show when=move || state.error.get().is_some() fallback=|| ().into_view()>
                    <div class="mb-4 rounded-md border border-destructive/30 px-4 py-3 text-xs text-destructive">
                        {move || state.error.get().unwrap_or_default()}
                    </div>
                </Show>

                <section class="mb-8">
                    <h2 class="mb-2 text-sm font-semibold">"Quizzes"</h2>
                    <Show
                        when=move || !state.quizzes.get().is_empty()
                        fallback=move || view! {
                            <div class="text-xs text-muted-foreground">
                                {move || if state.history_loading.get() { "Loading..." } else { "No quizzes yet." }}
                            </div>
                        }
                    >
                        <ul class="flex flex-col gap-2">
                            {move || {
                                state
                                    .quizzes
                                    .get()
                                    .iter()
                                    .map(|q| {
                                        history_row(
                                            q,
                                            q.data.title.clone(),
                                            q.data.cefr_level.clone(),
                                            move |id| delete_quiz(state, id),
                                        )
                                    })
                                    .collect_view()
                            }}
                        </ul>
                    </Show>
                </section>

                <section>
                    <h2 class="mb-2 text-sm font-semibold">"Stories"</h2>
                    <Show
                        when=move || !state.stories.get().is_empty()
                        fallback=move || view! {
                            <div class="text-xs text-muted-foreground">
                                {move || if state.history_loading.get() { "Loading..." } else { "No stories yet." }}
                            </div>
                        }
                    >
                        <ul class="flex flex-col gap-2">
                            {move || {
                                state
                                    .stories
                                    .get()
                                    .iter()
                                    .map(|s| {
                                        history_row(
                                            s,
                                            s.data.title.clone(),
                                            s.data.cefr_level.clone(),
                                            move |id| delete_story(state, id),
                                        )
                                    })
                                    .collect_view()
                            }}
                        </ul>
                    </Show>
                </section>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_day() {
        assert_eq!(format_day(1_709_287_200_500), "01 Mar 2024");
        assert_eq!(format_day(i64::MAX), "");
    }
}

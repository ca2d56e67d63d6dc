use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

const PLACEHOLDER_URL: &str = "https://placeholder.supabase.co";

/// Connection settings for the hosted table store.
///
/// Missing values are not an error: an unconfigured store makes every remote call
/// fail fast and the app runs on localStorage alone.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            anon_key: Some(anon_key.into()),
        }
    }

    /// Read `window.ENV`, accepting the same key spellings the JS builds used.
    pub fn from_env() -> Self {
        Self {
            url: env_string(&["SUPABASE_URL", "VITE_SUPABASE_URL", "supabase_url"]),
            anon_key: env_string(&[
                "SUPABASE_ANON_KEY",
                "VITE_SUPABASE_ANON_KEY",
                "supabase_anon_key",
            ]),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }

    /// `(base_url, anon_key)` with the trailing slash trimmed, if both are usable.
    pub(crate) fn credentials(&self) -> Option<(&str, &str)> {
        let url = self.url.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let key = self
            .anon_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        if url == PLACEHOLDER_URL || key == "placeholder" {
            return None;
        }
        Some((url.trim_end_matches('/'), key))
    }
}

/// Everything read from `window.ENV` at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub supabase: SupabaseConfig,
    pub log_level: LevelFilter,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            supabase: SupabaseConfig::from_env(),
            log_level: parse_level(env_string(&["LOG_LEVEL", "log_level"]).as_deref()),
        }
    }
}

/// Unknown or missing values fall back to `info`.
pub(crate) fn parse_level(raw: Option<&str>) -> LevelFilter {
    raw.and_then(|s| s.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO)
}

/// First non-empty string among `window.ENV[keys...]`.
pub(crate) fn env_string(keys: &[&str]) -> Option<String> {
    let env = web_sys::window()?.get("ENV")?;
    if env.is_undefined() || !env.is_object() {
        return None;
    }
    keys.iter().find_map(|k| {
        js_sys::Reflect::get(&env, &(*k).into())
            .ok()
            .and_then(|v| v.as_string())
            .filter(|s| !s.trim().is_empty())
    })
}

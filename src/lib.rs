mod app;
pub mod cache;
pub mod config;
pub mod generate;
pub mod identity;
pub mod logging;
pub mod models;
pub mod persistence;
pub mod remote;
mod state;
pub mod storage;
mod util;

pub use app::App;
pub use cache::ContentCache;
pub use config::{AppConfig, SupabaseConfig};
pub use generate::{ContentGenerator, GenerateError, GenerateResult};
pub use identity::IdentityProvider;
pub use persistence::Persistence;
pub use remote::{RemoteError, RemoteStore, SupabaseClient};
pub use storage::{BrowserStorage, LocalStore, MemoryStorage, StorageError};

use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();

    let config = AppConfig::from_env();
    logging::init(config.log_level);
    if !config.supabase.is_configured() {
        tracing::info!("no Supabase credentials in window.ENV, history stays on this device");
    }

    mount_to_body(move || view! { <App config=config /> });
}

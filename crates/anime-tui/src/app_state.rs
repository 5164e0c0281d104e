//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this but never mutate it; the App event loop is the only
//! writer.

use crate::action::Route;

#[derive(Debug, Clone)]
pub struct AppState {
    pub route: Route,
    /// Home's loading-complete flag. Gates the carousel and popular grid.
    pub home_ready: bool,
    /// Set when the home connectivity probe failed.
    pub home_error: Option<String>,
    pub show_keys_bar: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            route: Route::Home,
            home_ready: false,
            home_error: None,
            show_keys_bar: true,
        }
    }
}

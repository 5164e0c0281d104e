//! Action enum — all user-initiated intents and internal events.

/// The two screens of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Schedule,
}

impl Route {
    /// Logical path, shown in the status bar.
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Schedule => "/schedule",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "HOME",
            Self::Schedule => "SCHEDULE",
        }
    }
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Navigation ───────────────────────────────────────────────────────────
    Navigate(Route),
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollTop,
    ScrollBottom,

    // ── UI toggles ───────────────────────────────────────────────────────────
    ToggleHelp,
    ToggleKeys,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Resize(u16, u16),
    Noop,
}

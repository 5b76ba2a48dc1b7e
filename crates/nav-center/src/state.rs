//! Canonical per-tab navigation state.

use serde::Serialize;
use url::Url;

/// Placeholder shown until the engine reports a document title.
pub const DEFAULT_TITLE: &str = "New Tab";

/// The single source of truth the UI renders a tab from.
///
/// Mutated exclusively by the navigation runtime on the adapter queue;
/// readers observe committed values through the state feed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NavigationState {
    /// Current or last-committed location. `None` for a fresh tab.
    pub url: Option<Url>,
    pub title: String,
    pub is_loading: bool,
    /// Load progress in `[0, 1]`. Pinned to `1.0` after a successful
    /// completion and `0.0` after a failed one.
    pub progress: f64,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    /// Whether the chrome shows the location. Suppressed for the home
    /// location.
    pub display_url_in_chrome: bool,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            url: None,
            title: DEFAULT_TITLE.to_string(),
            is_loading: false,
            progress: 0.0,
            can_go_back: false,
            can_go_forward: false,
            display_url_in_chrome: false,
        }
    }
}

/// Navigation phase of the current attempt.
///
/// `Finished`/`Failed` are momentary: the runtime processes the terminal
/// event and settles back to `Idle` within the same queue step, so the
/// resting phases are the three below. Commit has no distinct engine event;
/// it is entered implicitly once content activity arrives for a provisional
/// load.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavPhase {
    Idle,
    Provisional,
    Committed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tab_state_is_empty_home() {
        let state = NavigationState::default();
        assert_eq!(state.url, None);
        assert_eq!(state.title, DEFAULT_TITLE);
        assert!(!state.is_loading);
        assert_eq!(state.progress, 0.0);
        assert!(!state.display_url_in_chrome);
    }
}

//! Reload-on-return for pages that opt in.

use std::sync::Arc;

use tracing::debug;

/// Page visibility as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// The page is shown.
    Visible,
    /// The page is in a background tab or minimized.
    Hidden,
}

/// Navigation control of the current page.
pub trait Navigator: Send + Sync {
    /// URL of the current document.
    fn current_url(&self) -> String;

    /// Navigates the page to `url`.
    fn assign(&self, url: &str);
}

/// Reloads the page when it becomes visible again.
#[derive(Clone)]
pub struct AutoRefresh {
    navigator: Arc<dyn Navigator>,
    enabled: bool,
}

impl std::fmt::Debug for AutoRefresh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoRefresh")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl AutoRefresh {
    /// Creates the handler. A disabled handler never navigates.
    pub fn new(navigator: Arc<dyn Navigator>, enabled: bool) -> Self {
        Self { navigator, enabled }
    }

    /// Handles a visibility change. Returns `true` when the page was reloaded.
    pub fn on_visibility_change(&self, visibility: Visibility) -> bool {
        if !self.enabled || visibility != Visibility::Visible {
            return false;
        }
        let url = self.navigator.current_url();
        debug!(%url, "page visible again, reloading");
        self.navigator.assign(&url);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNavigator {
        visits: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn current_url(&self) -> String {
            "https://example.org/index?page=2".to_owned()
        }

        fn assign(&self, url: &str) {
            self.visits.lock().unwrap().push(url.to_owned());
        }
    }

    #[test]
    fn reloads_current_url_when_visible() {
        let navigator = Arc::new(RecordingNavigator::default());
        let refresh = AutoRefresh::new(navigator.clone(), true);

        assert!(!refresh.on_visibility_change(Visibility::Hidden));
        assert!(refresh.on_visibility_change(Visibility::Visible));

        assert_eq!(
            *navigator.visits.lock().unwrap(),
            vec!["https://example.org/index?page=2".to_owned()]
        );
    }

    #[test]
    fn disabled_handler_does_nothing() {
        let navigator = Arc::new(RecordingNavigator::default());
        let refresh = AutoRefresh::new(navigator.clone(), false);

        assert!(!refresh.on_visibility_change(Visibility::Visible));
        assert!(navigator.visits.lock().unwrap().is_empty());
    }
}

//! Offline indicator rendering.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::document::Document;
use crate::frame::FrameScheduler;

struct RendererInner {
    document: Arc<dyn Document>,
    frames: Arc<dyn FrameScheduler>,
    indicator_class: String,
    visible_class: String,
    pending: Mutex<Option<bool>>,
}

/// Shows or hides the offline indicator on the next animation frame.
///
/// Updates scheduled before that frame runs are coalesced: only the latest
/// value is applied, and only one frame is requested.
#[derive(Clone)]
pub struct IndicatorRenderer {
    inner: Arc<RendererInner>,
}

impl fmt::Debug for IndicatorRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorRenderer")
            .field("indicator_class", &self.inner.indicator_class)
            .field("visible_class", &self.inner.visible_class)
            .field("pending", &self.pending())
            .finish()
    }
}

impl IndicatorRenderer {
    /// Renders into `document`, toggling `visible_class` on every element
    /// that has `indicator_class`.
    pub fn new(
        document: Arc<dyn Document>,
        frames: Arc<dyn FrameScheduler>,
        indicator_class: impl Into<String>,
        visible_class: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(RendererInner {
                document,
                frames,
                indicator_class: indicator_class.into(),
                visible_class: visible_class.into(),
                pending: Mutex::new(None),
            }),
        }
    }

    /// Value waiting for the next frame, if any.
    pub fn pending(&self) -> Option<bool> {
        *self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedules the indicator to show (`offline == true`) or hide.
    pub fn schedule(&self, offline: bool) {
        let already_requested = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(offline)
            .is_some();
        if already_requested {
            return;
        }
        let renderer = self.clone();
        self.inner
            .frames
            .request_frame(Box::new(move || {
                renderer.flush();
            }));
    }

    /// Applies the pending value now. Returns the number of elements updated.
    pub fn flush(&self) -> usize {
        let pending = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pending {
            Some(offline) => {
                let updated = self.inner.document.toggle_class(
                    &self.inner.indicator_class,
                    &self.inner.visible_class,
                    offline,
                );
                debug!(offline, updated, "offline indicator rendered");
                updated
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::frame::{ManualFrames, TokioFrames};
    use std::time::Duration;

    fn setup() -> (Arc<MemoryDocument>, Arc<ManualFrames>, IndicatorRenderer) {
        let document = Arc::new(MemoryDocument::new());
        let frames = Arc::new(ManualFrames::new());
        let renderer =
            IndicatorRenderer::new(document.clone(), frames.clone(), "offline", "offline_visible");
        (document, frames, renderer)
    }

    #[test]
    fn nothing_changes_before_the_frame() {
        let (document, frames, renderer) = setup();
        let banner = document.add_element(&["offline"]);

        renderer.schedule(true);
        assert!(!document.has_class(banner, "offline_visible"));

        assert_eq!(frames.run_frame(), 1);
        assert!(document.has_class(banner, "offline_visible"));
    }

    #[test]
    fn updates_within_one_frame_coalesce() {
        let (document, frames, renderer) = setup();
        let banner = document.add_element(&["offline"]);

        renderer.schedule(true);
        renderer.schedule(false);
        renderer.schedule(true);
        assert_eq!(frames.pending(), 1);
        assert_eq!(renderer.pending(), Some(true));

        frames.run_frame();
        assert!(document.has_class(banner, "offline_visible"));
        assert_eq!(renderer.pending(), None);
    }

    #[test]
    fn later_update_requests_a_new_frame() {
        let (document, frames, renderer) = setup();
        let banner = document.add_element(&["offline"]);

        renderer.schedule(true);
        frames.run_frame();
        renderer.schedule(false);
        assert_eq!(frames.pending(), 1);

        frames.run_frame();
        assert!(!document.has_class(banner, "offline_visible"));
    }

    #[tokio::test]
    async fn tokio_frames_apply_scheduled_update() {
        let document = Arc::new(MemoryDocument::new());
        let frames = Arc::new(TokioFrames::new(Duration::from_millis(1)));
        let renderer =
            IndicatorRenderer::new(document.clone(), frames, "offline", "offline_visible");
        let banner = document.add_element(&["offline"]);

        renderer.schedule(true);
        tokio::time::timeout(Duration::from_secs(1), async {
            while renderer.pending().is_some() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        assert!(document.has_class(banner, "offline_visible"));
    }

    #[test]
    fn flush_without_pending_is_noop() {
        let (_document, _frames, renderer) = setup();
        assert_eq!(renderer.flush(), 0);
    }
}

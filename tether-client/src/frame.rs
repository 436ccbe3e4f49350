//! Animation frame scheduling.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Work to run on the next frame.
pub type FrameCallback = Box<dyn FnOnce() + Send>;

/// Runs callbacks before the next repaint.
pub trait FrameScheduler: Send + Sync {
    /// Queues `callback` for the next frame.
    fn request_frame(&self, callback: FrameCallback);
}

/// Frames driven by a Tokio timer.
///
/// Must be used from within a Tokio runtime.
#[derive(Debug, Clone, Copy)]
pub struct TokioFrames {
    interval: Duration,
}

impl TokioFrames {
    /// Frames every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for TokioFrames {
    /// Roughly 60 frames per second.
    fn default() -> Self {
        Self::new(Duration::from_millis(16))
    }
}

impl FrameScheduler for TokioFrames {
    fn request_frame(&self, callback: FrameCallback) {
        let interval = self.interval;
        tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            callback();
        });
    }
}

/// Frames advanced by hand, one [`run_frame`](Self::run_frame) at a time.
#[derive(Default)]
pub struct ManualFrames {
    queue: Mutex<Vec<FrameCallback>>,
}

impl ManualFrames {
    /// Creates a scheduler with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Runs every queued callback and returns how many ran.
    ///
    /// Callbacks queued while running wait for the following frame.
    pub fn run_frame(&self) -> usize {
        let callbacks =
            std::mem::take(&mut *self.queue.lock().unwrap_or_else(PoisonError::into_inner));
        let count = callbacks.len();
        for callback in callbacks {
            callback();
        }
        count
    }
}

impl std::fmt::Debug for ManualFrames {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualFrames")
            .field("pending", &self.pending())
            .finish()
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&self, callback: FrameCallback) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }
}

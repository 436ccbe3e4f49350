//! LifecycleManager implementation.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use smol_str::SmolStr;
use tokio::task::JoinHandle;
use tracing::{Instrument, info_span, warn};

use super::policy::LifecycleConfig;

#[cfg(feature = "metrics")]
use crate::metrics::{LIFECYCLE_TASK_DURATION, LIFECYCLE_TASKS_ACTIVE, LIFECYCLE_TASKS_COMPLETED};

/// Identifier of a lifecycle-extending task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId {
    /// Kind of the task (e.g. "activate", "cache_write").
    pub kind: SmolStr,
    /// Unique identifier across all kinds.
    pub id: u64,
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

#[derive(Debug)]
struct LifecycleManagerInner {
    config: LifecycleConfig,
    tasks: DashMap<TaskId, JoinHandle<()>>,
    key_counter: AtomicU64,
}

/// Tracks work that must finish before a worker instance may be recycled.
///
/// Every task is spawned on the ambient Tokio runtime and runs to completion;
/// there is no cancellation. Hosts await [`settled`](Self::settled) before
/// tearing a worker down. Completion order between tasks is unspecified.
///
/// Clones share the same task set.
#[derive(Clone, Debug)]
pub struct LifecycleManager {
    inner: Arc<LifecycleManagerInner>,
}

impl LifecycleManager {
    /// Create a new LifecycleManager with the given configuration.
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            inner: Arc::new(LifecycleManagerInner {
                config,
                tasks: DashMap::new(),
                key_counter: AtomicU64::new(0),
            }),
        }
    }

    fn next_key(&self, kind: impl Into<SmolStr>) -> TaskId {
        let id = self.inner.key_counter.fetch_add(1, Ordering::Relaxed);
        TaskId {
            kind: kind.into(),
            id,
        }
    }

    /// Spawns `task` and extends the worker lifetime until it completes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn extend<F>(&self, kind: impl Into<SmolStr>, task: F) -> TaskId
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = self.next_key(kind);
        let handle = self.spawn_inner(task, key.clone());
        self.inner.tasks.insert(key.clone(), handle);

        #[cfg(feature = "metrics")]
        metrics::gauge!(*LIFECYCLE_TASKS_ACTIVE, "kind" => key.kind.to_string()).increment(1.0);

        key
    }

    /// Number of tasks still running.
    pub fn active_task_count(&self) -> usize {
        self.inner
            .tasks
            .iter()
            .filter(|entry| !entry.is_finished())
            .count()
    }

    /// Whether the given task is still running.
    pub fn is_in_flight(&self, key: &TaskId) -> bool {
        self.inner
            .tasks
            .get(key)
            .is_some_and(|handle| !handle.is_finished())
    }

    fn cleanup_finished(&self) {
        self.inner.tasks.retain(|_, handle| !handle.is_finished());
    }

    /// Waits until every tracked task, including ones spawned while waiting,
    /// has completed.
    pub async fn settled(&self) {
        loop {
            self.cleanup_finished();
            if self.inner.tasks.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Waits for [`settled`](Self::settled) with a deadline.
    ///
    /// Returns `false` if tasks were still running when the deadline passed.
    pub async fn settled_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.settled()).await.is_ok()
    }

    fn spawn_inner<F>(&self, task: F, key: TaskId) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let threshold = self.inner.config.slow_task_threshold;
        let inner = self.inner.clone();
        let span = info_span!("lifecycle_task", kind = %key.kind, id = key.id);

        tokio::spawn(
            async move {
                let start = Instant::now();
                task.await;
                let elapsed = start.elapsed();
                if let Some(threshold) = threshold
                    && elapsed > threshold
                {
                    warn!(
                        task = %key,
                        elapsed_ms = elapsed.as_millis(),
                        threshold_ms = threshold.as_millis(),
                        "lifecycle task exceeded threshold"
                    );
                }
                inner.tasks.remove(&key);
                #[cfg(feature = "metrics")]
                Self::record_completion(elapsed, &key.kind);
            }
            .instrument(span),
        )
    }

    #[cfg(feature = "metrics")]
    fn record_completion(elapsed: Duration, kind: &SmolStr) {
        metrics::counter!(*LIFECYCLE_TASKS_COMPLETED, "kind" => kind.to_string()).increment(1);
        metrics::gauge!(*LIFECYCLE_TASKS_ACTIVE, "kind" => kind.to_string()).decrement(1.0);
        metrics::histogram!(*LIFECYCLE_TASK_DURATION, "kind" => kind.to_string())
            .record(elapsed.as_secs_f64());
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new(LifecycleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn settled_waits_for_every_task() {
        let manager = LifecycleManager::default();
        let done = Arc::new(AtomicUsize::new(0));

        for delay in [5u64, 15, 1] {
            let done = done.clone();
            manager.extend("test", async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        manager.settled().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(manager.active_task_count(), 0);
    }

    #[tokio::test]
    async fn settled_returns_immediately_without_tasks() {
        let manager = LifecycleManager::default();
        assert!(manager.settled_timeout(Duration::from_millis(50)).await);
    }

    #[tokio::test]
    async fn settled_timeout_reports_stuck_task() {
        let manager = LifecycleManager::default();
        let (_tx, rx) = tokio::sync::oneshot::channel::<()>();
        let key = manager.extend("stuck", async move {
            let _ = rx.await;
        });

        assert!(!manager.settled_timeout(Duration::from_millis(20)).await);
        assert!(manager.is_in_flight(&key));
    }

    #[tokio::test]
    async fn task_ids_are_unique_per_kind() {
        let manager = LifecycleManager::default();
        let first = manager.extend("cache_write", async {});
        let second = manager.extend("cache_write", async {});
        assert_ne!(first, second);
        assert_eq!(first.kind, "cache_write");
        manager.settled().await;
    }
}

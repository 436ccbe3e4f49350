//! The worker instance: connectivity, page messaging and activation.

use std::fmt;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use http::{Method, Uri};
use tether_backend::CacheStorage;
use tether_core::{
    ClientId, ClientMessage, DeliveryError, FetchMeta, MessagePort, Registrar, Registration,
    RegistrationError, RegistrationOptions, WorkerState,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::bus::ClientRegistry;
use crate::cache::CacheStore;
use crate::config::WorkerConfig;
use crate::connectivity::ConnectivityTracker;
use crate::lifecycle::{LifecycleManager, TaskId};

struct WorkerInner {
    config: WorkerConfig,
    cache: CacheStore,
    connectivity: ConnectivityTracker,
    clients: ClientRegistry,
    lifecycle: LifecycleManager,
    state: watch::Sender<WorkerState>,
}

/// One worker instance.
///
/// Owns the connectivity flag, the registry of connected pages and the
/// [`CacheStore`] for its generation. Clones share the same instance.
///
/// # Example
///
/// ```no_run
/// use tether::{Worker, WorkerConfig};
/// use tether_moka::MokaStorage;
///
/// # async fn run() {
/// let worker = Worker::new(WorkerConfig::default(), MokaStorage::default());
/// worker.activate();
/// worker.settled().await;
/// # }
/// ```
#[derive(Clone)]
pub struct Worker {
    inner: Arc<WorkerInner>,
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("generation", self.inner.cache.generation())
            .field("state", &self.state())
            .field("connectivity", &self.inner.connectivity.state())
            .field("clients", &self.inner.clients.len())
            .finish()
    }
}

impl Worker {
    /// Creates a worker in the [`WorkerState::Installing`] state.
    pub fn new<S>(config: WorkerConfig, storage: S) -> Self
    where
        S: CacheStorage + 'static,
    {
        let lifecycle = LifecycleManager::new(config.lifecycle.clone());
        let cache = CacheStore::new(
            Arc::new(storage),
            config.generation.clone(),
            lifecycle.clone(),
        );
        let (state, _) = watch::channel(WorkerState::Installing);
        Self {
            inner: Arc::new(WorkerInner {
                config,
                cache,
                connectivity: ConnectivityTracker::new(),
                clients: ClientRegistry::new(),
                lifecycle,
                state,
            }),
        }
    }

    /// Worker configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.inner.config
    }

    /// Cache store bound to the current generation.
    pub fn cache(&self) -> &CacheStore {
        &self.inner.cache
    }

    /// Connectivity flag.
    pub fn connectivity(&self) -> &ConnectivityTracker {
        &self.inner.connectivity
    }

    /// Connected pages.
    pub fn clients(&self) -> &ClientRegistry {
        &self.inner.clients
    }

    /// Lifecycle-extending tasks.
    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.inner.lifecycle
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.inner.state.borrow()
    }

    /// Subscribes to lifecycle state changes.
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.inner.state.subscribe()
    }

    /// Starts activation: purges every other cache generation, then moves
    /// to [`WorkerState::Activated`].
    ///
    /// The purge runs as a lifecycle task. Returns `None` when activation
    /// has already started.
    pub fn activate(&self) -> Option<TaskId> {
        let started = self.inner.state.send_if_modified(|state| {
            if *state == WorkerState::Installing {
                *state = WorkerState::Activating;
                true
            } else {
                false
            }
        });
        if !started {
            return None;
        }

        info!(generation = %self.inner.cache.generation(), "worker activating");
        let inner = self.inner.clone();
        Some(self.inner.lifecycle.extend("activate", async move {
            inner.cache.purge_others().await;
            inner.state.send_replace(WorkerState::Activated);
            info!(generation = %inner.cache.generation(), "worker activated");
        }))
    }

    /// Waits until every lifecycle task has completed.
    pub async fn settled(&self) {
        self.inner.lifecycle.settled().await
    }

    /// Whether a request is handled by the interceptor at all.
    ///
    /// Only `GET` requests participate, and never the request for the
    /// worker script itself.
    pub fn participates(&self, method: &Method, uri: &Uri) -> bool {
        method == Method::GET && uri.path() != self.inner.config.script_path
    }

    /// Feeds a request outcome into the connectivity flag.
    ///
    /// Only navigations count. A failed navigation also pushes
    /// `offlineMode: true` to the page it addressed.
    pub fn record_navigation(&self, meta: &FetchMeta, offline: bool) {
        if !meta.is_navigation() {
            return;
        }

        let previous = self.inner.connectivity.record(offline);
        let current = self.inner.connectivity.state();
        if previous != current {
            info!(%previous, %current, "connectivity changed");
        }

        // Recovery is not pushed; pages see it on their next pull.
        if offline {
            match meta.addressee() {
                Some(client) => self.push_offline(client),
                None => debug!("failed navigation has no addressee"),
            }
        }
    }

    /// Pushes `offlineMode: true` to one page.
    pub fn push_offline(&self, client: ClientId) {
        if let Err(err) = self
            .inner
            .clients
            .post(client, ClientMessage::offline_mode(true))
        {
            debug!(client = %client, error = %err, "offline push not delivered");
        }
    }

    /// Handles a message a page posted to the worker.
    pub fn on_message(&self, from: ClientId, message: ClientMessage) {
        match message {
            ClientMessage::RequestOfflineMode => {
                let offline = self.inner.connectivity.is_offline();
                if let Err(err) = self
                    .inner
                    .clients
                    .post(from, ClientMessage::offline_mode(offline))
                {
                    debug!(client = %from, error = %err, "offline mode reply not delivered");
                }
            }
            ClientMessage::OfflineMode { .. } => {
                debug!(client = %from, ?message, "ignoring worker-bound offlineMode message");
            }
        }
    }

    /// Reserves an identifier for the page a navigation is about to produce.
    ///
    /// Hosts put it in [`FetchMeta::navigate`] and pass it back through
    /// [`RegistrationOptions::client_id()`] when that page registers.
    pub fn reserve_client(&self) -> ClientId {
        self.inner.clients.reserve()
    }

    /// Connects a page directly, bypassing registration.
    pub fn connect(&self) -> (ClientId, mpsc::UnboundedReceiver<ClientMessage>) {
        self.inner.clients.connect()
    }

    /// Forgets a page.
    pub fn disconnect(&self, client: ClientId) -> bool {
        self.inner.clients.disconnect(client)
    }

    /// Port through which `client` posts messages to this worker.
    pub fn port(&self, client: ClientId) -> Arc<dyn MessagePort> {
        Arc::new(WorkerPort {
            worker: Arc::downgrade(&self.inner),
            client,
        })
    }

    fn check_registration(
        &self,
        script_url: &str,
        scope: &str,
    ) -> Result<String, RegistrationError> {
        let config = &self.inner.config;
        let script_path = path_of(script_url)
            .ok_or_else(|| RegistrationError::ScriptMismatch(script_url.to_owned()))?;
        if script_path != config.script_path {
            return Err(RegistrationError::ScriptMismatch(script_url.to_owned()));
        }

        let scope_path = path_of(scope).ok_or_else(|| RegistrationError::ScopeNotAllowed {
            scope: scope.to_owned(),
            script: script_url.to_owned(),
        })?;
        if scope_path.starts_with(config.script_dir()) || scope_path.starts_with(&config.scope) {
            Ok(scope_path)
        } else {
            Err(RegistrationError::ScopeNotAllowed {
                scope: scope.to_owned(),
                script: script_url.to_owned(),
            })
        }
    }
}

fn path_of(url: &str) -> Option<String> {
    let uri: Uri = url.parse().ok()?;
    let path = uri.path();
    path.starts_with('/').then(|| path.to_owned())
}

#[async_trait]
impl Registrar for Worker {
    async fn register(
        &self,
        script_url: &str,
        options: RegistrationOptions,
    ) -> Result<Registration, RegistrationError> {
        let scope = self
            .check_registration(script_url, &options.scope)
            .inspect_err(|err| warn!(script = script_url, error = %err, "registration rejected"))?;

        let (client, inbox) = match options.client_id {
            Some(reserved) => (reserved, self.inner.clients.connect_as(reserved)),
            None => self.inner.clients.connect(),
        };
        debug!(client = %client, %scope, "page registered");
        self.activate();

        Ok(Registration::new(
            client,
            scope,
            self.port(client),
            inbox,
            self.inner.state.subscribe(),
        ))
    }
}

/// A page's handle for posting messages to its worker.
struct WorkerPort {
    worker: Weak<WorkerInner>,
    client: ClientId,
}

impl MessagePort for WorkerPort {
    fn post_message(&self, message: ClientMessage) -> Result<(), DeliveryError> {
        let inner = self.worker.upgrade().ok_or(DeliveryError::Closed)?;
        Worker { inner }.on_message(self.client, message);
        Ok(())
    }

    fn close(&self) {
        if let Some(inner) = self.worker.upgrade() {
            inner.clients.disconnect(self.client);
        }
    }
}

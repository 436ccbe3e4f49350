//! Worker registration surface seen by a page.
//!
//! A page calls [`Registrar::register`] with the worker script URL and the
//! scope it wants controlled, then awaits [`Registration::ready`] before it
//! starts talking to the worker.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::{ClientId, ClientMessage, MessagePort};

/// Lifecycle state of a worker instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Worker exists but has not been activated.
    Installing,
    /// Activation started; lifecycle tasks (generation purge) are running.
    Activating,
    /// Activation settled; the worker controls its pages.
    Activated,
}

/// Options passed along with a registration request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationOptions {
    /// URL path prefix of the pages the worker should control.
    pub scope: String,
    /// Identifier reserved for this page by the navigation that produced it.
    ///
    /// When set, the page is connected under this identifier, so pushes
    /// addressed to the navigation's resulting page reach it.
    pub client_id: Option<ClientId>,
}

impl RegistrationOptions {
    /// Options for the given scope.
    pub fn scope(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            client_id: None,
        }
    }

    /// Connect under a previously reserved identifier.
    pub fn client_id(mut self, id: ClientId) -> Self {
        self.client_id = Some(id);
        self
    }
}

/// Registration could not be completed.
///
/// Every variant is an expected, non-fatal condition for a page: it simply
/// runs without offline support.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The environment cannot run background workers.
    #[error("background workers are not supported in this environment")]
    Unsupported,
    /// The script URL does not name a worker script the host can serve.
    #[error("worker script `{0}` could not be fetched")]
    ScriptMismatch(String),
    /// The requested scope is outside what the script may control.
    #[error("scope `{scope}` is not allowed for script `{script}`")]
    ScopeNotAllowed {
        /// Requested scope.
        scope: String,
        /// Script URL.
        script: String,
    },
    /// The worker instance went away before becoming ready.
    #[error("worker terminated before it became active")]
    WorkerGone,
}

/// Registers worker scripts on behalf of pages.
#[async_trait]
pub trait Registrar: Send + Sync {
    /// Registers `script_url` for `options.scope`.
    async fn register(
        &self,
        script_url: &str,
        options: RegistrationOptions,
    ) -> Result<Registration, RegistrationError>;
}

/// A successful registration: the page's connection to its worker.
pub struct Registration {
    client_id: ClientId,
    scope: String,
    port: Arc<dyn MessagePort>,
    inbox: mpsc::UnboundedReceiver<ClientMessage>,
    state: watch::Receiver<WorkerState>,
}

impl Registration {
    /// Assembles a registration. Called by [`Registrar`] implementations.
    pub fn new(
        client_id: ClientId,
        scope: impl Into<String>,
        port: Arc<dyn MessagePort>,
        inbox: mpsc::UnboundedReceiver<ClientMessage>,
        state: watch::Receiver<WorkerState>,
    ) -> Self {
        Self {
            client_id,
            scope: scope.into(),
            port,
            inbox,
            state,
        }
    }

    /// Identifier the worker knows this page by.
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Scope the registration was made for.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Current worker state.
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Waits until the worker is activated.
    pub async fn ready(&mut self) -> Result<(), RegistrationError> {
        self.state
            .wait_for(|state| *state == WorkerState::Activated)
            .await
            .map(|_| ())
            .map_err(|_| RegistrationError::WorkerGone)
    }

    /// Splits the registration into the port towards the worker and the
    /// inbox of messages from it.
    pub fn into_channel(
        self,
    ) -> (
        ClientId,
        Arc<dyn MessagePort>,
        mpsc::UnboundedReceiver<ClientMessage>,
    ) {
        (self.client_id, self.port, self.inbox)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .field("state", &*self.state.borrow())
            .finish()
    }
}
